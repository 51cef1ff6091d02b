use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_FLIP_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_TEXT_SIZE_SP: f32 = 14.0;
pub const DEFAULT_PADDING_DP: f32 = 10.0;

/// How the queue is consumed as the flipper advances
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Each item is shown once, front to back. When the queue runs dry the
    /// flipper stops and reports it finished.
    #[default]
    LinearDrain,

    /// Like `LinearDrain` but priority adds jump to the front and show at once,
    /// and the timer keeps polling after the queue runs dry.
    PriorityInsert,

    /// Items are never consumed. Each advance shows the front item and moves
    /// it to the back.
    CircularRotate,
}

impl Mode {
    pub fn supports_priority(&self) -> bool {
        matches!(self, Mode::PriorityInsert)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::LinearDrain => write!(f, "linear-drain"),
            Mode::PriorityInsert => write!(f, "priority-insert"),
            Mode::CircularRotate => write!(f, "circular-rotate"),
        }
    }
}

/// Construction-time configuration.
///
/// Only `flip_interval_ms` and `mode` are used by the core. The cosmetic
/// fields are carried for whatever renders the slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipperConfig {
    pub flip_interval_ms: u64,
    pub mode: Mode,
    pub text_color: String,
    pub text_size_sp: f32,
    pub padding_dp: f32,
}

impl Default for FlipperConfig {
    fn default() -> FlipperConfig {
        FlipperConfig {
            flip_interval_ms: DEFAULT_FLIP_INTERVAL_MS,
            mode: Mode::default(),
            text_color: DEFAULT_TEXT_COLOR.to_owned(),
            text_size_sp: DEFAULT_TEXT_SIZE_SP,
            padding_dp: DEFAULT_PADDING_DP,
        }
    }
}

impl FlipperConfig {
    pub fn with_mode(mode: Mode) -> FlipperConfig {
        FlipperConfig {
            mode,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<FlipperConfig, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<FlipperConfig, Error> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The configured interval, or an error if it cannot be used
    pub fn checked_flip_interval(&self) -> Result<Duration, Error> {
        checked_interval(self.flip_interval_ms)
    }

    /// The configured interval, falling back to the default if it is not positive
    pub fn flip_interval(&self) -> Duration {
        interval_or_default(self.flip_interval_ms)
    }
}

pub(crate) fn checked_interval(ms: u64) -> Result<Duration, Error> {
    if ms == 0 {
        return Err(ErrorKind::MisconfiguredInterval(ms).into());
    }
    Ok(Duration::from_millis(ms))
}

pub(crate) fn interval_or_default(ms: u64) -> Duration {
    match checked_interval(ms) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("{}; using {}ms", e, DEFAULT_FLIP_INTERVAL_MS);
            Duration::from_millis(DEFAULT_FLIP_INTERVAL_MS)
        }
    }
}
