use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use margolus_core::{CellCoord, GridError, HexError, Rule, TransitionTable, BUILTIN_RULES};
use margolus_world::{query, Automaton};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PATTERN_DOMAIN: &str = "margolus";
const PATTERN_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded pattern payload.
pub(crate) const PATTERN_HEADER: &str = "margolus:v1";
const FIELD_DELIMITER: char = ':';

/// Grid dimensions, rule and live cells captured for clipboard sharing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PatternSnapshot {
    /// Number of rows in the grid.
    pub(crate) rows: u32,
    /// Number of columns in the grid.
    pub(crate) columns: u32,
    /// Transition table in hex form.
    pub(crate) rule: String,
    /// Live cells in row-major order.
    pub(crate) cells: Vec<CellCoord>,
}

#[derive(Serialize, Deserialize)]
struct SerializablePattern {
    rule: String,
    cells: Vec<CellCoord>,
}

impl PatternSnapshot {
    /// Captures the automaton's dimensions, rule and live cells.
    pub(crate) fn capture(automaton: &Automaton) -> Self {
        Self {
            rows: automaton.rows(),
            columns: automaton.columns(),
            rule: automaton.rule().table().to_hex(),
            cells: query::active_cells(automaton).into_vec(),
        }
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> String {
        let payload = SerializablePattern {
            rule: self.rule.clone(),
            cells: self.cells.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("pattern serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{PATTERN_HEADER}:{}x{}:{encoded}", self.rows, self.columns)
    }

    /// Decodes a snapshot from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, PatternTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PatternTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(PatternTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(PatternTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(PatternTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(PatternTransferError::MissingPayload)?;

        if domain != PATTERN_DOMAIN {
            return Err(PatternTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != PATTERN_VERSION {
            return Err(PatternTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (rows, columns) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: SerializablePattern = serde_json::from_slice(&bytes)?;

        Ok(Self {
            rows,
            columns,
            rule: decoded.rule,
            cells: decoded.cells,
        })
    }

    /// Builds an automaton at frame zero holding the pattern.
    ///
    /// Tables matching a built-in rule take that rule's name.
    pub(crate) fn to_automaton(&self) -> Result<Automaton, PatternTransferError> {
        let table = TransitionTable::from_hex(&self.rule)?;
        let rule = BUILTIN_RULES
            .into_iter()
            .map(Rule::builtin)
            .find(|builtin| builtin.table() == &table)
            .unwrap_or_else(|| Rule::new(table.to_hex(), table));

        let mut automaton = Automaton::new(self.rows, self.columns)?;
        automaton.set_rule(rule);
        automaton.set_cells(&self.cells, true)?;
        Ok(automaton)
    }
}

/// Errors that can occur while decoding pattern transfer strings.
#[derive(Debug, Error)]
pub(crate) enum PatternTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("pattern string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("pattern string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("pattern string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("pattern string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("pattern string is missing the payload")]
    MissingPayload,
    /// The prefix segment named another format.
    #[error("pattern prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version identifier is unknown.
    #[error("pattern version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode pattern payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse pattern payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// The rule is not a valid transition table.
    #[error("pattern rule is invalid: {0}")]
    InvalidRule(#[from] HexError),
    /// The grid or its cells are out of range.
    #[error("pattern does not fit its grid: {0}")]
    InvalidGrid(#[from] GridError),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), PatternTransferError> {
    let invalid = || PatternTransferError::InvalidDimensions(dimensions.to_owned());
    let (rows, columns) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;

    if rows == 0 || columns == 0 {
        return Err(invalid());
    }

    Ok((rows, columns))
}

#[cfg(test)]
mod tests {
    use margolus_core::BuiltinRule;

    use super::*;

    #[test]
    fn round_trip_empty_pattern() {
        let snapshot = PatternSnapshot {
            rows: 8,
            columns: 12,
            rule: BuiltinRule::Critters.table().to_hex(),
            cells: Vec::new(),
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{PATTERN_HEADER}:8x12:")));

        let decoded = PatternSnapshot::decode(&encoded).expect("pattern decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn captured_pattern_rebuilds_the_automaton() {
        let mut automaton = Automaton::new(6, 4).expect("valid dimensions");
        automaton.set_rule(Rule::builtin(BuiltinRule::Tron));
        automaton
            .set_cells(&[CellCoord::new(5, 3), CellCoord::new(0, 1)], true)
            .expect("cells in bounds");

        let encoded = PatternSnapshot::capture(&automaton).encode();
        assert!(encoded.starts_with(&format!("{PATTERN_HEADER}:6x4:")));

        let rebuilt = PatternSnapshot::decode(&encoded)
            .expect("pattern decodes")
            .to_automaton()
            .expect("pattern fits");
        assert_eq!(rebuilt.rule().name(), "Tron");
        assert_eq!(rebuilt.cells(), automaton.cells());
        assert_eq!(rebuilt.frame_number(), 0);
    }

    #[test]
    fn custom_tables_are_named_by_their_hex() {
        let snapshot = PatternSnapshot {
            rows: 2,
            columns: 2,
            rule: "0123456789abcdef".to_owned(),
            cells: vec![CellCoord::new(1, 1)],
        };
        let automaton = snapshot.to_automaton().expect("pattern fits");
        assert_eq!(automaton.rule().name(), "0123456789ABCDEF");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(matches!(
            PatternSnapshot::decode("   "),
            Err(PatternTransferError::EmptyPayload)
        ));
        assert!(matches!(
            PatternSnapshot::decode("maze:v1:4x4:e30"),
            Err(PatternTransferError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            PatternSnapshot::decode("margolus:v2:4x4:e30"),
            Err(PatternTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            PatternSnapshot::decode("margolus:v1:0x4:e30"),
            Err(PatternTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            PatternSnapshot::decode("margolus:v1:4x4"),
            Err(PatternTransferError::MissingPayload)
        ));
        assert!(matches!(
            PatternSnapshot::decode("margolus:v1:4x4:!!"),
            Err(PatternTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn out_of_range_cells_are_rejected_on_rebuild() {
        let snapshot = PatternSnapshot {
            rows: 4,
            columns: 4,
            rule: BuiltinRule::Critters.table().to_hex(),
            cells: vec![CellCoord::new(4, 0)],
        };
        assert!(matches!(
            snapshot.to_automaton(),
            Err(PatternTransferError::InvalidGrid(GridError::CellOutOfBounds { .. }))
        ));
    }
}
