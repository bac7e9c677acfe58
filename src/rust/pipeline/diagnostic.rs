use std::fmt;

use serde::Serialize;

/// The three categorical feature groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    Town,
    FlatType,
    FlatModel,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Town => "town",
            Self::FlatType => "flat_type",
            Self::FlatModel => "flat_model",
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal event recorded while turning raw fields into features.
///
/// Each one means the model saw a substituted value instead of what the
/// user typed, so predictions carrying diagnostics deserve less trust.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    StoreyRangeDefaulted { raw: String, substituted: f32 },
    RemainingLeaseDefaulted { raw: String, substituted: f32 },
    ReferenceYearDefaulted { raw: String, substituted: i32 },
    UnknownCategory { group: CategoryGroup, value: String },
}

impl Diagnostic {
    pub fn is_default_substitution(&self) -> bool {
        !matches!(self, Self::UnknownCategory { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreyRangeDefaulted { raw, substituted } => {
                write!(f, "storey range '{}' unparseable, used {}", raw, substituted)
            }
            Self::RemainingLeaseDefaulted { raw, substituted } => {
                write!(f, "remaining lease '{}' unparseable, used {}", raw, substituted)
            }
            Self::ReferenceYearDefaulted { raw, substituted } => {
                write!(f, "month '{}' unparseable, used year {}", raw, substituted)
            }
            Self::UnknownCategory { group, value } => {
                write!(f, "unknown {} '{}', encoded as all zeros", group, value)
            }
        }
    }
}
