use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use margolus_core::{
    Animation, AnimationStep, BatchSize, Pacing, Rule, StepColor, DEFAULT_MAX_UPDATE_TIME,
    DEFAULT_TARGET_FRAME_TIME,
};
use margolus_system_scheduler::Session;
use serde::Deserialize;

const DEFAULT_ROWS: u32 = 100;
const DEFAULT_COLUMNS: u32 = 100;

/// Settings loaded from an optional TOML file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) grid: GridSection,
    pub(crate) pacing: PacingSection,
    pub(crate) rules: Vec<RuleEntry>,
    pub(crate) animation: Vec<AnimationEntry>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) rows: u32,
    pub(crate) columns: u32,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PacingSection {
    pub(crate) target_frame_millis: u64,
    pub(crate) max_update_millis: u64,
    pub(crate) batch_frame_count: BatchSetting,
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            target_frame_millis: millis(DEFAULT_TARGET_FRAME_TIME),
            max_update_millis: millis(DEFAULT_MAX_UPDATE_TIME),
            batch_frame_count: BatchSetting::Frames(1),
        }
    }
}

impl PacingSection {
    pub(crate) fn pacing(&self) -> Pacing {
        Pacing {
            target_frame_time: Duration::from_millis(self.target_frame_millis),
            max_update_time: Duration::from_millis(self.max_update_millis),
            batch_frame_count: self.batch_frame_count.into(),
        }
    }
}

/// Batch size written either as a frame count or as `"unbounded"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum BatchSetting {
    Frames(u32),
    Keyword(BatchKeyword),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum BatchKeyword {
    Unbounded,
}

impl From<BatchSetting> for BatchSize {
    fn from(setting: BatchSetting) -> Self {
        match setting {
            BatchSetting::Frames(count) => BatchSize::Frames(count),
            BatchSetting::Keyword(BatchKeyword::Unbounded) => BatchSize::Unbounded,
        }
    }
}

impl std::str::FromStr for BatchSetting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Keyword(BatchKeyword::Unbounded));
        }
        value
            .parse()
            .map(Self::Frames)
            .map_err(|_| format!("expected a frame count or `unbounded`, got `{value}`"))
    }
}

/// Custom table rule registered with the session.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleEntry {
    pub(crate) name: String,
    pub(crate) hex: String,
}

/// One scripted animation step.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AnimationEntry {
    pub(crate) rule: String,
    pub(crate) ticks: i64,
    pub(crate) duration_millis: u64,
    #[serde(default)]
    pub(crate) color: Option<String>,
}

impl Config {
    /// Loads the file at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }

    /// Adds every configured rule to the session's library.
    pub(crate) fn register_rules(&self, session: &mut Session) -> Result<()> {
        for entry in &self.rules {
            let _ = session
                .add_rule_from_hex(&entry.hex, Some(&entry.name))
                .with_context(|| format!("invalid hex for rule `{}`", entry.name))?;
        }
        Ok(())
    }

    /// Resolves the scripted animation against the session's rules.
    pub(crate) fn animation(&self, session: &mut Session) -> Result<Animation> {
        let mut steps = Vec::with_capacity(self.animation.len());
        for (index, entry) in self.animation.iter().enumerate() {
            let rule = resolve_rule(session, &entry.rule)
                .with_context(|| format!("animation step {index}"))?;
            let color = match &entry.color {
                Some(color) => parse_color(color)
                    .with_context(|| format!("animation step {index}"))?,
                None => StepColor::default(),
            };
            steps.push(AnimationStep::new(
                rule,
                entry.ticks,
                Duration::from_millis(entry.duration_millis),
                color,
            ));
        }
        Ok(Animation::new(steps))
    }
}

/// Looks a rule up by name, falling back to parsing it as a hex table.
pub(crate) fn resolve_rule(session: &mut Session, name_or_hex: &str) -> Result<Rule> {
    if let Some(rule) = session.find_rule(name_or_hex) {
        return Ok(rule.clone());
    }
    session
        .add_rule_from_hex(name_or_hex, None)
        .with_context(|| format!("`{name_or_hex}` is neither a known rule nor a hex table"))
}

fn parse_color(value: &str) -> Result<StepColor> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.len() != 6 || !digits.is_ascii() {
        bail!("color `{value}` is not of the form #rrggbb");
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .with_context(|| format!("color `{value}` is not of the form #rrggbb"))
    };
    Ok(StepColor::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
