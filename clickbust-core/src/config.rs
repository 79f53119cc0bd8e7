//! Buster configuration.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{assert_that, Level};
use crate::error::ConfigError;

/// Per-axis distance within which two points count as the same location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Horizontal tolerance in pixels.
    pub x: f32,
    /// Vertical tolerance in pixels.
    pub y: f32,
}

impl Tolerance {
    /// Create a tolerance box.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(25.0, 25.0)
    }
}

/// How the click-classification window is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// One window starting at installation; the buster is inert afterwards.
    #[default]
    SinceInit,
    /// Every gesture start reopens the window.
    PerGesture,
}

/// Configuration for the buster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusterConfig {
    /// How long a gesture start stays matchable (ms).
    pub eviction_window_ms: u64,
    /// How long after the window opens clicks are classified (ms).
    pub cooldown_window_ms: u64,
    /// Match tolerance between a click and a gesture start.
    pub tolerance: Tolerance,
    /// When the classification window opens.
    pub cooldown_policy: CooldownPolicy,
    /// Root logger level the host should configure.
    pub root_level: String,
    /// Drop early touches near the origin at installation. Gesture starts
    /// seen by the installed listeners are never purged.
    pub purge_origin_on_install: bool,
}

impl Default for BusterConfig {
    fn default() -> Self {
        Self {
            eviction_window_ms: 2500,
            cooldown_window_ms: 2500,
            tolerance: Tolerance::default(),
            cooldown_policy: CooldownPolicy::SinceInit,
            root_level: Level::CONFIG.name().to_string(),
            purge_origin_on_install: true,
        }
    }
}

impl BusterConfig {
    /// Parse and validate a JSON configuration. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero window, a non-positive tolerance or
    /// an unknown root level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        assert_that(
            self.eviction_window_ms > 0,
            Some("eviction window must be positive, got %s ms"),
            &[&self.eviction_window_ms],
        )?;
        assert_that(
            self.cooldown_window_ms > 0,
            Some("cooldown window must be positive, got %s ms"),
            &[&self.cooldown_window_ms],
        )?;
        assert_that(
            self.tolerance.x > 0.0 && self.tolerance.y > 0.0,
            Some("tolerance must be positive, got %s x %s"),
            &[&self.tolerance.x, &self.tolerance.y],
        )?;
        self.root_level()?;
        Ok(())
    }

    /// The configured root level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLevel`] if the name is not a known level.
    pub fn root_level(&self) -> Result<Level, ConfigError> {
        Level::parse(&self.root_level).ok_or_else(|| ConfigError::UnknownLevel(self.root_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let config = BusterConfig::default();
        assert_eq!(config.eviction_window_ms, 2500);
        assert_eq!(config.cooldown_window_ms, 2500);
        assert_eq!(config.tolerance, Tolerance::new(25.0, 25.0));
        assert_eq!(config.cooldown_policy, CooldownPolicy::SinceInit);
        assert_eq!(config.root_level().unwrap(), Level::CONFIG);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config =
            BusterConfig::from_json(r#"{"cooldown_policy":"per_gesture","root_level":"fine"}"#)
                .unwrap();
        assert_eq!(config.cooldown_policy, CooldownPolicy::PerGesture);
        assert_eq!(config.root_level().unwrap(), Level::FINE);
        assert_eq!(config.eviction_window_ms, 2500);
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        assert!(matches!(
            BusterConfig::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn zero_window_is_invalid() {
        let err = BusterConfig::from_json(r#"{"eviction_window_ms":0}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: eviction window must be positive, got 0 ms"
        );
    }

    #[test]
    fn non_positive_tolerance_is_invalid() {
        let config = BusterConfig {
            tolerance: Tolerance::new(0.0, 25.0),
            ..BusterConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_level_is_invalid() {
        let config = BusterConfig {
            root_level: "loud".to_string(),
            ..BusterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownLevel(name)) if name == "loud"
        ));
    }
}
