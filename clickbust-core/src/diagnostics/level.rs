//! Log severity levels.

use serde::{Serialize, Serializer};

/// A named severity with a numeric value. Higher values are more severe.
#[derive(Debug, Clone, Copy)]
pub struct Level {
    name: &'static str,
    value: u32,
}

impl Level {
    /// Disables logging entirely when used as a threshold.
    pub const OFF: Self = Self::new("OFF", u32::MAX);
    /// Critical messages that should always be shown.
    pub const SHOUT: Self = Self::new("SHOUT", 1200);
    /// Serious failures.
    pub const SEVERE: Self = Self::new("SEVERE", 1000);
    /// Potential problems.
    pub const WARNING: Self = Self::new("WARNING", 900);
    /// Informational messages.
    pub const INFO: Self = Self::new("INFO", 800);
    /// Static configuration messages.
    pub const CONFIG: Self = Self::new("CONFIG", 700);
    /// Tracing information.
    pub const FINE: Self = Self::new("FINE", 500);
    /// Fairly detailed tracing.
    pub const FINER: Self = Self::new("FINER", 400);
    /// Highly detailed tracing.
    pub const FINEST: Self = Self::new("FINEST", 300);
    /// Enables every message when used as a threshold.
    pub const ALL: Self = Self::new("ALL", 0);

    /// Every predefined level, most severe first.
    pub const PREDEFINED: [Self; 10] = [
        Self::OFF,
        Self::SHOUT,
        Self::SEVERE,
        Self::WARNING,
        Self::INFO,
        Self::CONFIG,
        Self::FINE,
        Self::FINER,
        Self::FINEST,
        Self::ALL,
    ];

    /// Create a custom level.
    #[must_use]
    pub const fn new(name: &'static str, value: u32) -> Self {
        Self { name, value }
    }

    /// Level name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric severity.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Look up a predefined level by name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::PREDEFINED
            .into_iter()
            .find(|level| level.name.eq_ignore_ascii_case(name.trim()))
    }

    /// The most severe predefined level at or below `value`.
    #[must_use]
    pub fn predefined_for(value: u32) -> Self {
        Self::PREDEFINED
            .into_iter()
            .find(|level| level.value <= value)
            .unwrap_or(Self::ALL)
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_by_value() {
        assert!(Level::SHOUT > Level::SEVERE);
        assert!(Level::FINE < Level::INFO);
        assert!(Level::ALL < Level::FINEST);
        assert!(Level::OFF > Level::SHOUT);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Level::parse("warning"), Some(Level::WARNING));
        assert_eq!(Level::parse(" Fine "), Some(Level::FINE));
        assert_eq!(Level::parse("verbose"), None);
    }

    #[test]
    fn predefined_for_rounds_down() {
        assert_eq!(Level::predefined_for(950), Level::WARNING);
        assert_eq!(Level::predefined_for(300), Level::FINEST);
        assert_eq!(Level::predefined_for(10), Level::ALL);
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&Level::CONFIG).expect("serialize"),
            "\"CONFIG\""
        );
    }
}
