// Intake roller subsystem
//
// Owns one motor channel, configures it once, and drives it open loop with
// signed voltages. Direction is read back from the velocity sign.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{
    CAN_BUS, DEFAULT_VOLTAGE_INPUT, DEVICE_ID, MAX_VOLTS, MOTOR_TYPE, SENSOR_TO_MECHANISM_RATIO,
    VELOCITY_DEADBAND,
};
use crate::motor::configs::{CurrentLimitConfig, UnknownMotorFamily};
use crate::motor::{
    ChannelError, InvertedValue, MotorChannel, MotorConfiguration, MotorFamily, NeutralMode,
    VoltageCommand,
};

/// Error types for intake commands and setup
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("Magnitude must be zero or positive, got {magnitude}")]
    NegativeMagnitude { magnitude: f64 },

    #[error("Motor configuration failed: {0}")]
    Configuration(#[from] ChannelError),

    #[error(transparent)]
    MotorFamily(#[from] UnknownMotorFamily),
}

/// What happened to a voltage command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Forwarded to the motor controller
    Sent,
    /// Device was not alive, nothing was sent
    Dropped,
}

/// Rotational direction of the roller
///
/// The numeric codes are fixed: positive velocity is reported as
/// `Clockwise` with code `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionState {
    Clockwise,
    CounterClockwise,
    AtRest,
}

impl DirectionState {
    /// Classify a velocity sample, ignoring anything within the deadband
    pub fn from_velocity(velocity: f64) -> Self {
        if velocity > VELOCITY_DEADBAND {
            DirectionState::Clockwise
        } else if velocity < -VELOCITY_DEADBAND {
            DirectionState::CounterClockwise
        } else {
            DirectionState::AtRest
        }
    }

    /// -1 = clockwise, 1 = counterclockwise, 0 = at rest
    pub fn code(self) -> i8 {
        match self {
            DirectionState::Clockwise => -1,
            DirectionState::CounterClockwise => 1,
            DirectionState::AtRest => 0,
        }
    }
}

/// Sign applied to a stick-scaled voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickDirection {
    Positive,
    Negative,
}

/// Configuration bundle applied to the roller motor at startup
pub fn intake_configuration() -> Result<MotorConfiguration, UnknownMotorFamily> {
    let family: MotorFamily = MOTOR_TYPE.parse()?;
    Ok(MotorConfiguration::default()
        .with_current_limits(CurrentLimitConfig::for_family(family))
        .with_motor_output(NeutralMode::Coast, InvertedValue::ClockwisePositive)
        .with_feedback(SENSOR_TO_MECHANISM_RATIO))
}

/// Intake roller driven by one motor channel
pub struct IntakeSubsystem<C: MotorChannel> {
    channel: C,
    voltage_out: VoltageCommand,
    last_outcome: Option<CommandOutcome>,
    voltage_input: f64,
}

impl<C: MotorChannel> IntakeSubsystem<C> {
    /// Open the roller's channel with the fixed wiring and configure it
    pub fn open<F>(open_channel: F) -> Result<Self, IntakeError>
    where
        F: FnOnce(u32, &str) -> C,
    {
        Self::with_channel(open_channel(DEVICE_ID, CAN_BUS))
    }

    /// Take an already opened channel and configure it
    ///
    /// Fails if the device refuses the configuration; a roller running
    /// without its current limits is not allowed to start.
    pub fn with_channel(mut channel: C) -> Result<Self, IntakeError> {
        let config = intake_configuration()?;
        channel.apply_configuration(&config)?;
        info!(
            "Intake motor {} on {} configured ({} limits, coast, clockwise positive)",
            channel.device_id(),
            channel.bus(),
            MOTOR_TYPE
        );

        Ok(Self {
            channel,
            voltage_out: VoltageCommand::new(0.0),
            last_outcome: None,
            voltage_input: DEFAULT_VOLTAGE_INPUT,
        })
    }

    /// Send a signed voltage if the device is alive
    pub fn issue_voltage(&mut self, volts: f64) -> CommandOutcome {
        self.voltage_out = self.voltage_out.with_output(volts);

        let outcome = if self.channel.is_alive() {
            self.channel.set_control(self.voltage_out);
            CommandOutcome::Sent
        } else {
            debug!(
                "Motor {} not alive, dropping {}V command",
                self.channel.device_id(),
                volts
            );
            CommandOutcome::Dropped
        };
        self.last_outcome = Some(outcome);
        outcome
    }

    /// Spin the roller positive at `magnitude` volts
    pub fn ramp_up(&mut self, magnitude: f64) -> Result<CommandOutcome, IntakeError> {
        check_magnitude(magnitude)?;
        Ok(self.issue_voltage(magnitude))
    }

    /// Spin the roller negative at `magnitude` volts
    pub fn ramp_down(&mut self, magnitude: f64) -> Result<CommandOutcome, IntakeError> {
        check_magnitude(magnitude)?;
        Ok(self.issue_voltage(-magnitude))
    }

    pub fn stop(&mut self) -> CommandOutcome {
        self.issue_voltage(0.0)
    }

    /// Scale a stick axis (nominally -1..1, not clamped) to volts
    pub fn drive_from_stick_axis(
        &mut self,
        axis: f64,
        direction: StickDirection,
    ) -> CommandOutcome {
        let volts = axis * MAX_VOLTS;
        match direction {
            StickDirection::Positive => self.issue_voltage(volts),
            StickDirection::Negative => self.issue_voltage(-volts),
        }
    }

    pub fn drive_clockwise(&mut self, axis: f64) -> CommandOutcome {
        self.drive_from_stick_axis(axis, StickDirection::Positive)
    }

    pub fn drive_counter_clockwise(&mut self, axis: f64) -> CommandOutcome {
        self.drive_from_stick_axis(axis, StickDirection::Negative)
    }

    pub fn direction_state(&self) -> DirectionState {
        DirectionState::from_velocity(self.channel.velocity())
    }

    /// Raw roller velocity in rotations per second
    pub fn velocity(&self) -> f64 {
        self.channel.velocity()
    }

    /// Voltage carried by the most recent command, sent or dropped
    pub fn last_commanded_voltage(&self) -> f64 {
        self.voltage_out.output
    }

    pub fn last_outcome(&self) -> Option<CommandOutcome> {
        self.last_outcome
    }

    /// Magnitude used when a ramp request doesn't specify one
    pub fn default_voltage_input(&self) -> f64 {
        self.voltage_input
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

// NaN is rejected along with negatives
fn check_magnitude(magnitude: f64) -> Result<(), IntakeError> {
    if magnitude.is_nan() || magnitude < 0.0 {
        return Err(IntakeError::NegativeMagnitude { magnitude });
    }
    Ok(())
}
