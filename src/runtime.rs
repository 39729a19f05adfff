// Fixed-rate control loop with watchdog
// The loop owns the intake and is its only caller. If teleop stops sending
// commands for longer than the timeout, the roller is stopped.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    CMD_TIMEOUT, LOOP_HZ, MAX_LOOP_HZ, TOPIC_CMD_ROLLER, TOPIC_HEALTH, TOPIC_STATE_ROLLER,
};
use crate::intake::{CommandOutcome, IntakeError, IntakeSubsystem};
use crate::messages::{IntakeCommand, IntakeTelemetry, RuntimeHealth};
use crate::motor::{MotorChannel, SimChannel};

/// Loop settings, defaulting to the compiled-in constants
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub loop_hz: u64,
    pub cmd_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            cmd_timeout: CMD_TIMEOUT,
        }
    }
}

impl RunOptions {
    /// Tick period, with the rate held to 1..=MAX_LOOP_HZ so it is never zero
    pub fn period(&self) -> Duration {
        let hz = self.loop_hz.clamp(1, MAX_LOOP_HZ);
        Duration::from_secs_f64(1.0 / hz as f64)
    }
}

pub struct Runtime<C: MotorChannel> {
    intake: IntakeSubsystem<C>,
    latest_cmd: Option<IntakeCommand>,
    cmd_received_at: Instant,
    cmd_timeout: Duration,
    health: RuntimeHealth,
}

impl<C: MotorChannel> Runtime<C> {
    pub fn new(intake: IntakeSubsystem<C>, cmd_timeout: Duration) -> Self {
        Self {
            intake,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            cmd_timeout,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn intake(&self) -> &IntakeSubsystem<C> {
        &self.intake
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: IntakeCommand) {
        self.on_command_at(cmd, Instant::now());
    }

    fn on_command_at(&mut self, cmd: IntakeCommand, now: Instant) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Run one control cycle and report the roller state
    pub fn tick(&mut self) -> IntakeTelemetry {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> IntakeTelemetry {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        if cmd_age > self.cmd_timeout {
            // Watchdog triggered - stop the roller
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping roller", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            self.intake.stop();
        } else if let Some(cmd) = self.latest_cmd.clone() {
            match self.apply(&cmd) {
                Ok(CommandOutcome::Sent) => self.health = RuntimeHealth::Ok,
                Ok(CommandOutcome::Dropped) => {
                    if self.health != RuntimeHealth::MotorOffline {
                        warn!("Intake motor not responding, commands are being dropped");
                    }
                    self.health = RuntimeHealth::MotorOffline;
                }
                Err(e) => {
                    // Forget the bad command so it isn't retried every cycle
                    warn!("Rejected command {:?}: {}", cmd, e);
                    self.latest_cmd = None;
                    self.health = RuntimeHealth::CmdStale;
                    self.intake.stop();
                }
            }
        } else {
            // No usable command received
            self.health = RuntimeHealth::CmdStale;
            self.intake.stop();
        }

        self.telemetry()
    }

    fn apply(&mut self, cmd: &IntakeCommand) -> Result<CommandOutcome, IntakeError> {
        let default_magnitude = self.intake.default_voltage_input();
        match *cmd {
            IntakeCommand::RampUp { magnitude } => {
                self.intake.ramp_up(magnitude.unwrap_or(default_magnitude))
            }
            IntakeCommand::RampDown { magnitude } => {
                self.intake.ramp_down(magnitude.unwrap_or(default_magnitude))
            }
            IntakeCommand::Stop => Ok(self.intake.stop()),
            IntakeCommand::Stick { axis, direction } => {
                Ok(self.intake.drive_from_stick_axis(axis, direction))
            }
        }
    }

    fn telemetry(&self) -> IntakeTelemetry {
        let direction = self.intake.direction_state();
        IntakeTelemetry {
            voltage: self.intake.last_commanded_voltage(),
            velocity: self.intake.velocity(),
            direction,
            direction_code: direction.code(),
            outcome: self.intake.last_outcome(),
        }
    }
}

pub async fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // No hardware backend is linked in; drive the simulated controller
    let intake = IntakeSubsystem::open(SimChannel::open)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_ROLLER).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE_ROLLER).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut runtime = Runtime::new(intake, options.cmd_timeout);
    let mut tick = interval(options.period());

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        options.loop_hz,
        options.cmd_timeout.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_ROLLER);
    info!("Publishing to: {}, {}", TOPIC_STATE_ROLLER, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<IntakeCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }

        // 2. Drive the roller (includes watchdog logic)
        let telemetry = runtime.tick();

        // 3. Publish roller state
        let telemetry_json = serde_json::to_string(&telemetry)?;
        pub_state.put(telemetry_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{DirectionState, StickDirection};

    fn sim_runtime() -> (Runtime<SimChannel>, SimChannel, Instant) {
        let sim = SimChannel::open(1, "rio");
        let intake = IntakeSubsystem::with_channel(sim.clone()).unwrap();
        let runtime = Runtime::new(intake, CMD_TIMEOUT);
        let start = runtime.cmd_received_at;
        (runtime, sim, start)
    }

    #[test]
    fn test_loop_period() {
        let options = RunOptions::default();
        assert_eq!(options.period(), Duration::from_millis(20));

        let fastest = RunOptions {
            loop_hz: MAX_LOOP_HZ,
            ..options
        };
        assert_eq!(fastest.period(), Duration::from_millis(1));

        // Out-of-range rates are held to the limits instead of yielding a zero period
        for loop_hz in [MAX_LOOP_HZ + 1, 2000, u64::MAX] {
            let period = RunOptions { loop_hz, ..options }.period();
            assert_eq!(period, Duration::from_millis(1));
        }
        assert_eq!(RunOptions { loop_hz: 0, ..options }.period(), Duration::from_secs(1));
    }

    #[test]
    fn test_stale_until_first_command() {
        let (mut runtime, sim, start) = sim_runtime();

        let telemetry = runtime.tick_at(start);
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
        assert_eq!(telemetry.voltage, 0.0);
        assert_eq!(sim.last_command().unwrap().output, 0.0);
    }

    #[test]
    fn test_fresh_command_applied() {
        let (mut runtime, sim, start) = sim_runtime();

        runtime.on_command_at(IntakeCommand::RampUp { magnitude: Some(3.0) }, start);
        let telemetry = runtime.tick_at(start + Duration::from_millis(20));

        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(sim.last_command().unwrap().output, 3.0);
        assert_eq!(telemetry.direction, DirectionState::Clockwise);
        assert_eq!(telemetry.direction_code, -1);
        assert_eq!(telemetry.outcome, Some(CommandOutcome::Sent));
    }

    #[test]
    fn test_ramp_without_magnitude_uses_default() {
        let (mut runtime, sim, start) = sim_runtime();

        runtime.on_command_at(IntakeCommand::RampDown { magnitude: None }, start);
        runtime.tick_at(start);
        assert_eq!(sim.last_command().unwrap().output, -0.5);
    }

    #[test]
    fn test_stick_command() {
        let (mut runtime, sim, start) = sim_runtime();

        runtime.on_command_at(
            IntakeCommand::Stick {
                axis: 0.5,
                direction: StickDirection::Negative,
            },
            start,
        );
        runtime.tick_at(start);
        assert_eq!(sim.last_command().unwrap().output, -1.0);
    }

    #[test]
    fn test_watchdog_stops_roller() {
        let (mut runtime, sim, start) = sim_runtime();

        runtime.on_command_at(IntakeCommand::RampUp { magnitude: Some(2.0) }, start);
        runtime.tick_at(start + Duration::from_millis(100));
        assert_eq!(runtime.health(), RuntimeHealth::Ok);

        let telemetry = runtime.tick_at(start + CMD_TIMEOUT + Duration::from_millis(1));
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
        assert_eq!(sim.last_command().unwrap().output, 0.0);
        assert_eq!(telemetry.direction, DirectionState::AtRest);
    }

    #[test]
    fn test_rejected_command_keeps_loop_running() {
        let (mut runtime, sim, start) = sim_runtime();

        runtime.on_command_at(IntakeCommand::RampUp { magnitude: Some(-3.0) }, start);
        runtime.tick_at(start);
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
        assert_eq!(sim.last_command().unwrap().output, 0.0);

        runtime.on_command_at(IntakeCommand::RampUp { magnitude: Some(1.0) }, start);
        runtime.tick_at(start);
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(sim.last_command().unwrap().output, 1.0);
    }

    #[test]
    fn test_offline_motor_reported() {
        let (mut runtime, sim, start) = sim_runtime();
        sim.set_alive(false);

        runtime.on_command_at(IntakeCommand::Stop, start);
        let telemetry = runtime.tick_at(start);
        assert_eq!(runtime.health(), RuntimeHealth::MotorOffline);
        assert_eq!(telemetry.outcome, Some(CommandOutcome::Dropped));
        assert!(sim.commands().is_empty());
    }
}
