// Message types for the runtime

use serde::{Deserialize, Serialize};

use crate::intake::{CommandOutcome, DirectionState, StickDirection};

// Command from teleop/scripts -> runtime
// Tagged by "action", e.g. {"action":"ramp_up","magnitude":3.0}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntakeCommand {
    RampUp {
        #[serde(default)]
        magnitude: Option<f64>,
    },
    RampDown {
        #[serde(default)]
        magnitude: Option<f64>,
    },
    Stop,
    Stick {
        axis: f64,
        direction: StickDirection,
    },
}

// Roller state from runtime -> dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeTelemetry {
    pub voltage: f64,
    pub velocity: f64,
    pub direction: DirectionState,
    pub direction_code: i8,
    pub outcome: Option<CommandOutcome>,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    MotorOffline,
}
