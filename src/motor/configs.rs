// Motor controller configuration bundle
//
// Mirrors the groups a smart motor controller accepts in one apply call:
// current limits, output polarity/neutral behaviour, and feedback scaling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Motor families with a known current-limit profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorFamily {
    Falcon500,
    KrakenX60,
    Neo,
}

impl MotorFamily {
    /// Label used in wiring constants
    pub fn label(self) -> &'static str {
        match self {
            MotorFamily::Falcon500 => "Falcon500",
            MotorFamily::KrakenX60 => "KrakenX60",
            MotorFamily::Neo => "Neo",
        }
    }
}

impl fmt::Display for MotorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown motor family: {0}")]
pub struct UnknownMotorFamily(pub String);

impl FromStr for MotorFamily {
    type Err = UnknownMotorFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Falcon500" => Ok(MotorFamily::Falcon500),
            "KrakenX60" => Ok(MotorFamily::KrakenX60),
            "Neo" => Ok(MotorFamily::Neo),
            other => Err(UnknownMotorFamily(other.to_string())),
        }
    }
}

/// Supply and stator current limits, in amps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentLimitConfig {
    pub supply_current_limit: f64,
    pub supply_current_limit_enable: bool,
    pub stator_current_limit: f64,
    pub stator_current_limit_enable: bool,
}

impl CurrentLimitConfig {
    /// Current-limit profile for a motor family
    pub fn for_family(family: MotorFamily) -> Self {
        let (supply, stator) = match family {
            MotorFamily::Falcon500 => (40.0, 80.0),
            MotorFamily::KrakenX60 => (60.0, 120.0),
            MotorFamily::Neo => (40.0, 60.0),
        };
        Self {
            supply_current_limit: supply,
            supply_current_limit_enable: true,
            stator_current_limit: stator,
            stator_current_limit_enable: true,
        }
    }
}

/// What the motor does when commanded to zero output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralMode {
    Coast,
    Brake,
}

/// Which rotor direction counts as positive output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvertedValue {
    CounterClockwisePositive,
    ClockwisePositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorOutputConfig {
    pub neutral_mode: NeutralMode,
    pub inverted: InvertedValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    pub sensor_to_mechanism_ratio: f64,
}

/// Values a motor controller refuses to accept
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Sensor-to-mechanism ratio must be positive, got {0}")]
    InvalidRatio(f64),

    #[error("Current limits must not be negative (supply {supply}, stator {stator})")]
    NegativeCurrentLimit { supply: f64, stator: f64 },
}

/// Full configuration applied to a channel in one call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorConfiguration {
    pub current_limits: CurrentLimitConfig,
    pub motor_output: MotorOutputConfig,
    pub feedback: FeedbackConfig,
}

impl Default for MotorConfiguration {
    fn default() -> Self {
        Self {
            current_limits: CurrentLimitConfig::for_family(MotorFamily::Falcon500),
            motor_output: MotorOutputConfig {
                neutral_mode: NeutralMode::Brake,
                inverted: InvertedValue::CounterClockwisePositive,
            },
            feedback: FeedbackConfig {
                sensor_to_mechanism_ratio: 1.0,
            },
        }
    }
}

impl MotorConfiguration {
    pub fn with_current_limits(mut self, current_limits: CurrentLimitConfig) -> Self {
        self.current_limits = current_limits;
        self
    }

    pub fn with_motor_output(mut self, neutral_mode: NeutralMode, inverted: InvertedValue) -> Self {
        self.motor_output = MotorOutputConfig {
            neutral_mode,
            inverted,
        };
        self
    }

    pub fn with_feedback(mut self, sensor_to_mechanism_ratio: f64) -> Self {
        self.feedback = FeedbackConfig {
            sensor_to_mechanism_ratio,
        };
        self
    }

    /// Check values a controller would refuse
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.feedback.sensor_to_mechanism_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidRatio(ratio));
        }

        let limits = &self.current_limits;
        if limits.supply_current_limit < 0.0 || limits.stator_current_limit < 0.0 {
            return Err(ConfigError::NegativeCurrentLimit {
                supply: limits.supply_current_limit,
                stator: limits.stator_current_limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_from_label() {
        assert_eq!("Falcon500".parse::<MotorFamily>(), Ok(MotorFamily::Falcon500));
        assert_eq!("KrakenX60".parse::<MotorFamily>(), Ok(MotorFamily::KrakenX60));
        assert!("CIM".parse::<MotorFamily>().is_err());
        assert_eq!(MotorFamily::Neo.to_string(), "Neo");
    }

    #[test]
    fn test_falcon_limits_enabled() {
        let limits = CurrentLimitConfig::for_family(MotorFamily::Falcon500);
        assert!(limits.supply_current_limit_enable);
        assert!(limits.stator_current_limit_enable);
        assert!(limits.stator_current_limit > limits.supply_current_limit);
    }

    #[test]
    fn test_builder_overrides_groups() {
        let config = MotorConfiguration::default()
            .with_motor_output(NeutralMode::Coast, InvertedValue::ClockwisePositive)
            .with_feedback(3.0);

        assert_eq!(config.motor_output.neutral_mode, NeutralMode::Coast);
        assert_eq!(config.motor_output.inverted, InvertedValue::ClockwisePositive);
        assert_eq!(config.feedback.sensor_to_mechanism_ratio, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        assert_eq!(
            MotorConfiguration::default().with_feedback(0.0).validate(),
            Err(ConfigError::InvalidRatio(0.0))
        );
        assert_eq!(
            MotorConfiguration::default().with_feedback(-1.0).validate(),
            Err(ConfigError::InvalidRatio(-1.0))
        );
        assert!(matches!(
            MotorConfiguration::default().with_feedback(f64::NAN).validate(),
            Err(ConfigError::InvalidRatio(r)) if r.is_nan()
        ));
    }

    #[test]
    fn test_validate_rejects_negative_limits() {
        let mut limits = CurrentLimitConfig::for_family(MotorFamily::Neo);
        limits.stator_current_limit = -5.0;

        let err = MotorConfiguration::default()
            .with_current_limits(limits)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeCurrentLimit {
                supply: 40.0,
                stator: -5.0
            }
        );
        assert_eq!(
            err.to_string(),
            "Current limits must not be negative (supply 40, stator -5)"
        );
    }
}
