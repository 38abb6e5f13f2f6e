use std::fmt;

use crate::tuning::Tier;

/// Failure loading or validating tuning data.
///
/// Gameplay itself never fails: running out of time or length ends the
/// session through [`crate::sim::GameEvent::GameOver`] instead.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue {
        tier: Tier,
        field: &'static str,
        reason: &'static str,
    },
    InvalidProgression { easy_until: u32, normal_until: u32 },
    InvalidSteering { field: &'static str },
    UnknownTier(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "tuning parse error: {err}"),
            Self::InvalidValue {
                tier,
                field,
                reason,
            } => write!(f, "invalid {field} for tier {}: {reason}", tier.as_str()),
            Self::InvalidProgression {
                easy_until,
                normal_until,
            } => write!(
                f,
                "promotion thresholds out of order: easy until {easy_until}, normal until {normal_until}"
            ),
            Self::InvalidSteering { field } => {
                write!(f, "invalid steering parameter {field}: must be finite and non-negative")
            }
            Self::UnknownTier(name) => {
                write!(f, "unknown difficulty tier {name:?} (expected easy, normal or hard)")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
