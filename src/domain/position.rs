//! Net position state.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    #[default]
    Neutral,
    Long,
    Short,
}

impl Position {
    /// Position implied by a signed unit holding.
    pub fn from_units(units: f64) -> Self {
        if units > 0.0 {
            Position::Long
        } else if units < 0.0 {
            Position::Short
        } else {
            Position::Neutral
        }
    }

    pub fn is_short(self) -> bool {
        self == Position::Short
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Neutral => write!(f, "neutral"),
            Position::Long => write!(f, "long"),
            Position::Short => write!(f, "short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_sign() {
        assert_eq!(Position::from_units(3.5), Position::Long);
        assert_eq!(Position::from_units(-0.1), Position::Short);
        assert_eq!(Position::from_units(0.0), Position::Neutral);
        assert_eq!(Position::from_units(-0.0), Position::Neutral);
    }

    #[test]
    fn default_is_neutral() {
        assert_eq!(Position::default(), Position::Neutral);
    }

    #[test]
    fn only_short_is_short() {
        assert!(Position::Short.is_short());
        assert!(!Position::Long.is_short());
        assert!(!Position::Neutral.is_short());
    }
}
