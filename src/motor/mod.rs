// Motor layer for the intake roller
//
// Provides:
// - The motor channel capability (voltage requests, liveness, velocity)
// - Configuration bundle types (current limits, output, feedback)
// - A simulated channel for running without hardware

mod channel;
pub mod configs;
pub mod sim;

pub use channel::{ChannelError, MotorChannel, VoltageCommand};
pub use configs::{ConfigError, InvertedValue, MotorConfiguration, MotorFamily, NeutralMode};
pub use sim::SimChannel;
