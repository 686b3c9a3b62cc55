use anyhow::bail;
use clap::Args;

/// Cut-offs used by the classifier and the rollups. All scores are on the
/// 100-point total scale, attendance is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct Thresholds {
    /// Minimum total score counted as a pass
    #[arg(long, env = "ACADEMICS_PASS_THRESHOLD", default_value_t = 35.0, global = true)]
    pub pass_threshold: f64,
    /// Totals strictly below this raise a focus-area signal
    #[arg(long, env = "ACADEMICS_FOCUS_THRESHOLD", default_value_t = 35.0, global = true)]
    pub focus_threshold: f64,
    /// Attendance strictly below this raises an attendance alert
    #[arg(
        long,
        env = "ACADEMICS_ATTENDANCE_THRESHOLD",
        default_value_t = 75.0,
        global = true
    )]
    pub attendance_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pass_threshold: 35.0,
            focus_threshold: 35.0,
            attendance_threshold: 75.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("pass threshold", self.pass_threshold),
            ("focus threshold", self.focus_threshold),
            ("attendance threshold", self.attendance_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{name} must be between 0 and 100, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,
    #[arg(long, env = "ACADEMICS_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    pub max_connections: u32,
}
