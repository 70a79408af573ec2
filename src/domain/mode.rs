// Battery and charger operating modes
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid mode {0}, expected 1-6")]
pub struct InvalidMode(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    Passive = 1,
    GridCharge = 2,
    Discharge = 3,
    PowerLimit = 4,
    GarageCharger = 5,
    OutdoorCharger = 6,
}

impl Mode {
    /// Mode in effect when no breakpoint applies.
    pub const DEFAULT: Mode = Mode::Passive;

    /// Modes 5 and 6 share the charging budget and may never run at the same time.
    pub fn is_charger(self) -> bool {
        matches!(self, Mode::GarageCharger | Mode::OutdoorCharger)
    }

    pub fn description(self) -> &'static str {
        match self {
            Mode::Passive => "Passive (solar only)",
            Mode::GridCharge => "Charge from grid",
            Mode::Discharge => "Discharge to property",
            Mode::PowerLimit => "Power limit active",
            Mode::GarageCharger => "Garage charger active",
            Mode::OutdoorCharger => "Outdoor charger active",
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::Passive),
            2 => Ok(Mode::GridCharge),
            3 => Ok(Mode::Discharge),
            4 => Ok(Mode::PowerLimit),
            5 => Ok(Mode::GarageCharger),
            6 => Ok(Mode::OutdoorCharger),
            other => Err(InvalidMode(other)),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_integer() {
        assert_eq!(Mode::try_from(1), Ok(Mode::Passive));
        assert_eq!(Mode::try_from(6), Ok(Mode::OutdoorCharger));
        assert_eq!(Mode::try_from(0), Err(InvalidMode(0)));
        assert_eq!(Mode::try_from(7), Err(InvalidMode(7)));
    }

    #[test]
    fn test_mode_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Mode::GridCharge).unwrap(), "2");
        let mode: Mode = serde_json::from_str("5").unwrap();
        assert_eq!(mode, Mode::GarageCharger);
        assert!(serde_json::from_str::<Mode>("9").is_err());
    }

    #[test]
    fn test_only_chargers_are_exclusive() {
        let chargers: Vec<Mode> = (1..=6)
            .filter_map(|n| Mode::try_from(n).ok())
            .filter(|m| m.is_charger())
            .collect();
        assert_eq!(chargers, vec![Mode::GarageCharger, Mode::OutdoorCharger]);
    }
}
