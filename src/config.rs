use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matching::MatchThresholds;

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct InputConfig {
    pub total_path: String,
    pub present_path: String,
    /// Name column override for the roster; auto-detected when None.
    pub total_name_column: Option<String>,
    /// Name column override for the sign-in list; auto-detected when None.
    pub present_name_column: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    pub fuzzy_cutoff: f64,
    pub token_cutoff: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let t = MatchThresholds::default();
        Self {
            fuzzy_cutoff: t.fuzzy_cutoff,
            token_cutoff: t.token_cutoff,
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> MatchThresholds {
        MatchThresholds {
            fuzzy_cutoff: self.fuzzy_cutoff,
            token_cutoff: self.token_cutoff,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: String,
    pub format: Option<String>, // csv|json|both
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: "absentees.csv".into(),
            format: Some("csv".into()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.total_path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.total_path",
            });
        }
        if self.input.present_path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.present_path",
            });
        }
        if !(0.0..=1.0).contains(&self.matching.fuzzy_cutoff) {
            return Err(ConfigError::InvalidValue {
                field: "matching.fuzzy_cutoff",
                reason: format!("{} not in 0..=1", self.matching.fuzzy_cutoff),
            });
        }
        if !(0.0..=1.0).contains(&self.matching.token_cutoff) {
            return Err(ConfigError::InvalidValue {
                field: "matching.token_cutoff",
                reason: format!("{} not in 0..=1", self.matching.token_cutoff),
            });
        }
        if self.export.out_path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "export.out_path",
            });
        }
        if let Some(ref fmt) = self.export.format {
            match fmt.as_str() {
                "csv" | "json" | "both" => {}
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "export.format",
                        reason: format!("unsupported: {}", other),
                    });
                }
            }
        }
        Ok(())
    }
}
