use clap::{Parser, ValueEnum};

use crate::config::{AppConfig, ExportConfig, InputConfig, MatchingConfig};
use crate::error::ConfigError;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Csv,
    Json,
    Both,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Both => "both",
        }
    }

    pub fn wants_csv(&self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }

    pub fn wants_json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "attendance_matcher",
    version,
    about = "Reconcile a roster against a sign-in list and report absentees",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Roster CSV listing everyone expected
    #[arg(value_name = "TOTAL_CSV")]
    pub total_path: String,
    /// Sign-in CSV listing everyone who showed up
    #[arg(value_name = "PRESENT_CSV")]
    pub present_path: String,
    /// Absentee CSV output path (env: ATTENDANCE_MATCHER_OUT)
    #[arg(
        value_name = "OUT_PATH",
        env = "ATTENDANCE_MATCHER_OUT",
        default_value = "absentees.csv"
    )]
    pub out_path: String,
    /// Report format written alongside the absentee CSV
    #[arg(
        value_name = "FORMAT",
        env = "ATTENDANCE_MATCHER_FORMAT",
        default_value_t = FormatOpt::Csv
    )]
    pub format: FormatOpt,
    /// Roster name column; conventional headers are auto-detected when unset
    /// (env: ATTENDANCE_MATCHER_NAME_COLUMN)
    #[arg(
        long = "name-column",
        value_name = "COLUMN",
        env = "ATTENDANCE_MATCHER_NAME_COLUMN"
    )]
    pub name_column: Option<String>,
    /// Sign-in name column; defaults to --name-column
    /// (env: ATTENDANCE_MATCHER_PRESENT_NAME_COLUMN)
    #[arg(
        long = "present-name-column",
        value_name = "COLUMN",
        env = "ATTENDANCE_MATCHER_PRESENT_NAME_COLUMN"
    )]
    pub present_name_column: Option<String>,
    /// Character-similarity cutoff in 0..=1 (env: ATTENDANCE_MATCHER_FUZZY_CUTOFF)
    #[arg(
        long = "fuzzy-cutoff",
        value_name = "CUTOFF",
        env = "ATTENDANCE_MATCHER_FUZZY_CUTOFF",
        default_value_t = 0.72
    )]
    pub fuzzy_cutoff: f64,
    /// Token-overlap cutoff in 0..=1 (env: ATTENDANCE_MATCHER_TOKEN_CUTOFF)
    #[arg(
        long = "token-cutoff",
        value_name = "CUTOFF",
        env = "ATTENDANCE_MATCHER_TOKEN_CUTOFF",
        default_value_t = 0.50
    )]
    pub token_cutoff: f64,
    /// Log the nearest unallocated roster entries for each unmatched sign-in
    #[arg(long = "explain")]
    pub explain: bool,
    /// Emit a progress log line every N sign-in records
    #[arg(long = "progress-every", value_name = "N", default_value_t = 1000)]
    pub progress_every: usize,
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig {
            input: InputConfig {
                total_path: self.total_path.clone(),
                present_path: self.present_path.clone(),
                total_name_column: self.name_column.clone(),
                present_name_column: self
                    .present_name_column
                    .clone()
                    .or_else(|| self.name_column.clone()),
            },
            matching: MatchingConfig {
                fuzzy_cutoff: self.fuzzy_cutoff,
                token_cutoff: self.token_cutoff,
            },
            export: ExportConfig {
                out_path: self.out_path.clone(),
                format: Some(self.format.as_str().into()),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_uses_defaults() {
        let cli = Cli::try_parse_from(["attendance_matcher", "total.csv", "present.csv"]).unwrap();
        assert_eq!(cli.out_path, "absentees.csv");
        assert_eq!(cli.format, FormatOpt::Csv);
        assert!(!cli.explain);

        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.input.total_path, "total.csv");
        assert!((cfg.matching.fuzzy_cutoff - 0.72).abs() < 1e-9);
        assert!((cfg.matching.token_cutoff - 0.50).abs() < 1e-9);
        assert_eq!(cfg.export.format.as_deref(), Some("csv"));
    }

    #[test]
    fn name_column_carries_over_to_present_side() {
        let cli = Cli::try_parse_from([
            "attendance_matcher",
            "t.csv",
            "p.csv",
            "--name-column",
            "StudentName",
        ])
        .unwrap();
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.input.total_name_column.as_deref(), Some("StudentName"));
        assert_eq!(
            cfg.input.present_name_column.as_deref(),
            Some("StudentName")
        );
    }

    #[test]
    fn separate_present_column_wins() {
        let cli = Cli::try_parse_from([
            "attendance_matcher",
            "t.csv",
            "p.csv",
            "--name-column",
            "StudentName",
            "--present-name-column",
            "SignedName",
        ])
        .unwrap();
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.input.present_name_column.as_deref(), Some("SignedName"));
    }

    #[test]
    fn out_of_range_cutoff_is_a_config_error() {
        let cli = Cli::try_parse_from([
            "attendance_matcher",
            "t.csv",
            "p.csv",
            "--fuzzy-cutoff",
            "1.2",
        ])
        .unwrap();
        assert!(matches!(
            cli.to_app_config(),
            Err(ConfigError::InvalidValue {
                field: "matching.fuzzy_cutoff",
                ..
            })
        ));
    }

    #[test]
    fn format_both_enables_both_writers() {
        let cli = Cli::try_parse_from([
            "attendance_matcher",
            "t.csv",
            "p.csv",
            "out.csv",
            "both",
        ])
        .unwrap();
        assert!(cli.format.wants_csv());
        assert!(cli.format.wants_json());
        assert_eq!(cli.format.to_string(), "both");
    }

    #[test]
    fn missing_positionals_fail_parse() {
        assert!(Cli::try_parse_from(["attendance_matcher", "only_total.csv"]).is_err());
    }
}
