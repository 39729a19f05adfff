// Motor channel: the capability a subsystem uses to reach one motor controller
//
// Implementations own the bus traffic. The subsystem only sends voltage
// requests, applies a configuration bundle and reads velocity back.

use serde::{Deserialize, Serialize};

use super::configs::MotorConfiguration;

/// Open-loop request: apply this many volts to the motor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoltageCommand {
    pub output: f64,
}

impl VoltageCommand {
    pub fn new(output: f64) -> Self {
        Self { output }
    }

    /// Same request with a new output value
    pub fn with_output(mut self, output: f64) -> Self {
        self.output = output;
        self
    }
}

/// Error types reported by a motor channel
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("Device {device_id} on bus {bus} is not responding")]
    Unresponsive { device_id: u32, bus: String },

    #[error("Device {device_id} rejected configuration: {reason}")]
    Rejected { device_id: u32, reason: String },
}

/// Handle to one motor controller on a field bus
pub trait MotorChannel {
    /// Device identifier on the bus
    fn device_id(&self) -> u32;

    /// Bus the device lives on
    fn bus(&self) -> &str;

    /// Apply a full configuration bundle, blocking until the device acknowledges it
    fn apply_configuration(&mut self, config: &MotorConfiguration) -> Result<(), ChannelError>;

    /// Whether the device is currently answering on the bus
    fn is_alive(&self) -> bool;

    /// Send a control request
    fn set_control(&mut self, command: VoltageCommand);

    /// Instantaneous mechanism velocity in rotations per second
    fn velocity(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_output_replaces_value() {
        let cmd = VoltageCommand::new(0.0).with_output(-1.5);
        assert_eq!(cmd.output, -1.5);
    }

    #[test]
    fn test_error_messages() {
        let err = ChannelError::Unresponsive {
            device_id: 1,
            bus: "rio".to_string(),
        };
        assert_eq!(err.to_string(), "Device 1 on bus rio is not responding");
    }
}
