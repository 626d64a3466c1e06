use serde::{Deserialize, Serialize};

/// Classification of a validation outcome. `Error` blocks persistence of the
/// failing record in every mode; `Warning` and `Info` are log-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

/// How rule failures affect the decision to persist a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Any Error-severity failure aborts the whole migration.
    #[default]
    Strict,
    /// Error-failing records are dropped and counted as errors; the run continues.
    Lenient,
    /// Failures are reported as warnings only; nothing escalates to an abort.
    WarningOnly,
}

impl ValidationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            "warning_only" => Some(Self::WarningOnly),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        assert_eq!(Severity::parse("Error"), Some(Severity::Error));
        assert_eq!(Severity::parse(" warning "), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), None);
        assert_eq!(
            ValidationMode::parse("warning_only"),
            Some(ValidationMode::WarningOnly)
        );
    }
}
