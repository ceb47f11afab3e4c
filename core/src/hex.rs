//! Hex encoding of transition tables.
//!
//! A table encodes to one upper-case nibble per forward entry: sixteen digits
//! when it was declared with a single array, otherwise thirty-two digits with
//! the even array first.

use thiserror::Error;

use crate::table::{TableError, TransitionTable, BLOCK_STATES};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Errors produced while decoding a hex table string.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HexError {
    /// The string was neither 16 nor 32 characters long.
    #[error("rule hex must have 16 or 32 digits, got {len}")]
    Length {
        /// Number of characters supplied.
        len: usize,
    },
    /// A character outside `[0-9a-fA-F]` was found.
    #[error("bad hex digit at index {index}: {digit:?}")]
    InvalidDigit {
        /// Character position of the offending digit.
        index: usize,
        /// The rejected character.
        digit: char,
    },
    /// The digits decoded but do not describe a bijective table.
    #[error("rule hex does not describe a reversible table: {0}")]
    Table(#[from] TableError),
}

impl TransitionTable {
    /// Encodes the table as upper-case hex digits.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(BLOCK_STATES * 2);
        push_digits(&mut hex, self.even_forward());
        if !self.is_parity_independent() {
            push_digits(&mut hex, self.odd_forward());
        }
        hex
    }

    /// Decodes a table from 16 or 32 hex digits, ignoring case.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        let len = hex.chars().count();
        if len != BLOCK_STATES && len != BLOCK_STATES * 2 {
            return Err(HexError::Length { len });
        }

        let nibbles = hex
            .chars()
            .enumerate()
            .map(|(index, digit)| {
                digit
                    .to_digit(16)
                    .map(|value| value as u8)
                    .ok_or(HexError::InvalidDigit { index, digit })
            })
            .collect::<Result<Vec<u8>, HexError>>()?;

        let (even, odd) = nibbles.split_at(BLOCK_STATES);
        let odd = if odd.is_empty() { None } else { Some(odd) };
        Ok(Self::new(even, odd)?)
    }
}

fn push_digits(out: &mut String, states: &[u8; BLOCK_STATES]) {
    for &state in states {
        out.push(char::from(HEX_DIGITS[usize::from(state & 0x0f)]));
    }
}
