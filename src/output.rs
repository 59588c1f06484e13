//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Plans written by `resolve` are never colored; only the human-oriented
//! reports of `validate`, `tree` and `ls` go through this module.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use buildplan::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//!
//! // Use emoji helper that respects config
//! println!("{} Validating...", emoji(&config, "🔍", "[SCAN]"));
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Bold text, for names the report is about.
pub fn emphasis(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}

/// Dimmed text, for inactive descriptors and secondary details.
pub fn muted(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "✅", "[OK]"), "✅");
        assert_eq!(emoji(&OutputConfig::without_color(), "✅", "[OK]"), "[OK]");
    }

    #[test]
    fn test_plain_styles_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(emphasis(&config, "Game"), "Game");
        assert_eq!(muted(&config, "(inactive)"), "(inactive)");
    }

    #[test]
    fn test_styles_keep_text_with_color() {
        console::set_colors_enabled(true);
        let config = OutputConfig::with_color();
        assert!(emphasis(&config, "Game").contains("Game"));
        assert!(muted(&config, "Core").contains("Core"));
    }

    #[test]
    #[serial]
    fn test_auto_respects_no_color() {
        env::set_var("NO_COLOR", "");
        let config = OutputConfig::from_env_and_flag("auto");
        env::remove_var("NO_COLOR");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_auto_respects_clicolor_zero() {
        env::remove_var("NO_COLOR");
        env::set_var("CLICOLOR", "0");
        let config = OutputConfig::from_env_and_flag("auto");
        env::remove_var("CLICOLOR");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_always_overrides_no_color() {
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("always");
        env::remove_var("NO_COLOR");
        assert!(config.use_color);
    }
}
