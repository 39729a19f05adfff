// Wiring, limits, timeouts and topics for the intake roller
use std::time::Duration;

// Motor wiring
pub const DEVICE_ID: u32 = 1;
pub const CAN_BUS: &str = "rio";
pub const MOTOR_TYPE: &str = "Falcon500";

// Volts per unit of stick deflection
pub const MAX_VOLTS: f64 = 2.0;

// Default magnitude for ramp commands that don't carry one
pub const DEFAULT_VOLTAGE_INPUT: f64 = 0.5;

// Velocity (rotations/s) below which the roller counts as at rest
pub const VELOCITY_DEADBAND: f64 = 0.01;

// Sensor rotations per roller rotation
pub const SENSOR_TO_MECHANISM_RATIO: f64 = 1.0;

// Runtime loop frequency, and the fastest rate the loop accepts
pub const LOOP_HZ: u64 = 50;
pub const MAX_LOOP_HZ: u64 = 1000;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_ROLLER: &str = "intake/cmd/roller"; // commands
pub const TOPIC_STATE_ROLLER: &str = "intake/state/roller"; // telemetry
pub const TOPIC_HEALTH: &str = "intake/state/health"; // health status
