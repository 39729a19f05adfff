// In-memory motor channel
//
// Stands in for the motor controller when no hardware is attached. Every
// clone shares the same state, so one handle can be given to a subsystem
// while another is kept to inspect what the subsystem sent.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::channel::{ChannelError, MotorChannel, VoltageCommand};
use super::configs::MotorConfiguration;

/// Free speed per volt of a Falcon 500, in rotations per second
pub const KV_RPS_PER_VOLT: f64 = 100.0 / 12.0;

#[derive(Debug, Default)]
struct SimState {
    alive: bool,
    reject_configuration: Option<String>,
    applied: Vec<MotorConfiguration>,
    commands: Vec<VoltageCommand>,
    forced_velocity: Option<f64>,
}

/// Simulated motor channel
#[derive(Debug, Clone)]
pub struct SimChannel {
    device_id: u32,
    bus: String,
    state: Arc<Mutex<SimState>>,
}

impl SimChannel {
    /// Open a simulated device that is alive and accepts any valid configuration
    pub fn open(device_id: u32, bus: &str) -> Self {
        info!("Opening simulated motor {} on bus {}", device_id, bus);
        Self {
            device_id,
            bus: bus.to_string(),
            state: Arc::new(Mutex::new(SimState {
                alive: true,
                ..SimState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate the device dropping off (or coming back onto) the bus
    pub fn set_alive(&self, alive: bool) {
        self.state().alive = alive;
    }

    /// Make the next configuration apply fail with the given reason
    pub fn reject_configuration(&self, reason: &str) {
        self.state().reject_configuration = Some(reason.to_string());
    }

    /// Override the sensor reading; `None` goes back to the voltage model
    pub fn force_velocity(&self, velocity: Option<f64>) {
        self.state().forced_velocity = velocity;
    }

    /// Every configuration the device accepted, oldest first
    pub fn applied_configurations(&self) -> Vec<MotorConfiguration> {
        self.state().applied.clone()
    }

    /// Every control request the device received, oldest first
    pub fn commands(&self) -> Vec<VoltageCommand> {
        self.state().commands.clone()
    }

    /// Most recent control request, if any
    pub fn last_command(&self) -> Option<VoltageCommand> {
        self.state().commands.last().copied()
    }
}

impl MotorChannel for SimChannel {
    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn bus(&self) -> &str {
        &self.bus
    }

    fn apply_configuration(&mut self, config: &MotorConfiguration) -> Result<(), ChannelError> {
        let device_id = self.device_id;
        let mut state = self.state();

        if !state.alive {
            return Err(ChannelError::Unresponsive {
                device_id,
                bus: self.bus.clone(),
            });
        }
        if let Some(reason) = state.reject_configuration.take() {
            return Err(ChannelError::Rejected { device_id, reason });
        }
        config
            .validate()
            .map_err(|e| ChannelError::Rejected {
                device_id,
                reason: e.to_string(),
            })?;

        debug!("Motor {} accepted configuration: {:?}", device_id, config);
        state.applied.push(*config);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.state().alive
    }

    fn set_control(&mut self, command: VoltageCommand) {
        self.state().commands.push(command);
    }

    fn velocity(&self) -> f64 {
        let state = self.state();
        if let Some(velocity) = state.forced_velocity {
            return velocity;
        }

        // Output and feedback share the inverted frame, so only the ratio matters here
        let ratio = state
            .applied
            .last()
            .map(|c| c.feedback.sensor_to_mechanism_ratio)
            .unwrap_or(1.0);
        let volts = state.commands.last().map(|c| c.output).unwrap_or(0.0);
        volts * KV_RPS_PER_VOLT / ratio
    }
}
