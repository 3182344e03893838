//! Runtime configuration shared by every subcommand.

use std::path::PathBuf;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Timelike, Utc};
use clap::Args;

/// Settings read from flags or their environment variables.
#[derive(Args, Clone, Debug)]
pub struct Config {
    /// SQLite database file.
    #[arg(long, env = "FSIC_DATABASE", default_value = "fsic.sqlite3", global = true)]
    pub database: PathBuf,

    /// Offset from UTC that defines "today" for validity checks.
    #[arg(
        long,
        env = "FSIC_UTC_OFFSET_HOURS",
        default_value_t = 8,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-12..=14),
        global = true
    )]
    pub utc_offset_hours: i32,

    /// Directory searched first for the Roboto font files.
    #[arg(long, env = "FSIC_FONTS_DIR", global = true)]
    pub fonts_dir: Option<PathBuf>,
}

impl Config {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Current local date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }

    /// Current local wall-clock time in the configured offset, to the second.
    pub fn now(&self) -> NaiveDateTime {
        let now = Utc::now().with_timezone(&self.offset()).naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_configured_hours() {
        let config = Config {
            database: PathBuf::from(":memory:"),
            utc_offset_hours: 8,
            fonts_dir: None,
        };
        assert_eq!(config.offset().local_minus_utc(), 8 * 3600);
    }
}
