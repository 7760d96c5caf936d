use crate::domain::errors::ValidationError;
use crate::domain::value_objects::price::Price;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a trade idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            other => Err(ValidationError::UnknownVariant {
                field: "side".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Entry, stop and target levels that are consistent with a side.
///
/// For a long idea `stop < entry < target` for every target; for a short idea
/// the ordering is reversed. At least one target is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLevels {
    side: Side,
    entry: Price,
    stop: Price,
    targets: Vec<Price>,
}

impl TradeLevels {
    pub fn new(
        side: Side,
        entry: Price,
        stop: Price,
        targets: Vec<Price>,
    ) -> Result<Self, ValidationError> {
        if targets.is_empty() {
            return Err(ValidationError::NoTargets);
        }

        match side {
            Side::Long => {
                if stop >= entry || targets.iter().any(|t| *t <= entry) {
                    return Err(ValidationError::LongLevelsOutOfOrder);
                }
            }
            Side::Short => {
                if stop <= entry || targets.iter().any(|t| *t >= entry) {
                    return Err(ValidationError::ShortLevelsOutOfOrder);
                }
            }
        }

        Ok(Self {
            side,
            entry,
            stop,
            targets,
        })
    }

    /// Validate raw numeric levels as stored on an idea document.
    pub fn from_raw(side: Side, entry: f64, stop: f64, targets: &[f64]) -> Result<Self, ValidationError> {
        let targets = targets
            .iter()
            .map(|t| Price::new(*t))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(side, Price::new(entry)?, Price::new(stop)?, targets)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn entry(&self) -> Price {
        self.entry
    }

    pub fn stop(&self) -> Price {
        self.stop
    }

    pub fn targets(&self) -> &[Price] {
        &self.targets
    }

    /// Distance from entry to stop as a percentage of entry.
    pub fn risk_percent(&self) -> f64 {
        (self.entry.value() - self.stop.value()).abs() / self.entry.value() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> Price {
        Price::new(v).unwrap()
    }

    #[test]
    fn test_long_levels_valid() {
        let levels = TradeLevels::new(Side::Long, p(100.0), p(95.0), vec![p(110.0), p(120.0)]);
        assert!(levels.is_ok());
        assert!((levels.unwrap().risk_percent() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_stop_above_entry_rejected() {
        let levels = TradeLevels::new(Side::Long, p(100.0), p(101.0), vec![p(110.0)]);
        assert_eq!(levels, Err(ValidationError::LongLevelsOutOfOrder));
    }

    #[test]
    fn test_long_any_target_below_entry_rejected() {
        let levels = TradeLevels::new(Side::Long, p(100.0), p(90.0), vec![p(110.0), p(99.0)]);
        assert_eq!(levels, Err(ValidationError::LongLevelsOutOfOrder));
    }

    #[test]
    fn test_short_levels_valid() {
        let levels = TradeLevels::new(Side::Short, p(100.0), p(105.0), vec![p(90.0), p(80.0)]);
        assert!(levels.is_ok());
    }

    #[test]
    fn test_short_target_equal_to_entry_rejected() {
        let levels = TradeLevels::new(Side::Short, p(100.0), p(105.0), vec![p(100.0)]);
        assert_eq!(levels, Err(ValidationError::ShortLevelsOutOfOrder));
    }

    #[test]
    fn test_no_targets_rejected() {
        let levels = TradeLevels::new(Side::Long, p(100.0), p(95.0), vec![]);
        assert_eq!(levels, Err(ValidationError::NoTargets));
    }

    #[test]
    fn test_from_raw_rejects_nan() {
        let levels = TradeLevels::from_raw(Side::Long, f64::NAN, 1.0, &[2.0]);
        assert_eq!(levels, Err(ValidationError::MustBeFinite));
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("LONG".parse::<Side>().unwrap(), Side::Long);
        assert_eq!("sell".parse::<Side>().unwrap(), Side::Short);
        assert!("sideways".parse::<Side>().is_err());
    }
}
