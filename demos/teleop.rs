// Keyboard teleop for the intake: W in, S out, space stop, R/F volts, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use intake_roller::config::TOPIC_CMD_ROLLER;
use intake_roller::messages::IntakeCommand;
use std::time::{Duration, Instant};
use tracing::info;

const VOLTS: [f64; 3] = [0.5, 1.5, 3.0];
const INPUT_TIMEOUT_MS: u64 = 100; // Stop the roller after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_ROLLER).await?;

    info!("Controls: W=intake, S=outtake, SPACE=stop, R/F=volts, Q=quit");
    print_volts(0);

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut volts_idx: usize = 0;
    let mut cmd = IntakeCommand::Stop;
    let mut last_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('w') if pressed => {
                        cmd = IntakeCommand::RampUp {
                            magnitude: Some(VOLTS[volts_idx]),
                        };
                        last_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        cmd = IntakeCommand::RampDown {
                            magnitude: Some(VOLTS[volts_idx]),
                        };
                        last_input = Instant::now();
                    }
                    KeyCode::Char(' ') if pressed => {
                        cmd = IntakeCommand::Stop;
                        last_input = Instant::now();
                    }

                    // Voltage level
                    KeyCode::Char('r') if pressed => {
                        volts_idx = (volts_idx + 1).min(VOLTS.len() - 1);
                        print_volts(volts_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        volts_idx = volts_idx.saturating_sub(1);
                        print_volts(volts_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        if last_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            cmd = IntakeCommand::Stop;
        }

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

fn print_volts(idx: usize) {
    info!("Volts: {}", VOLTS[idx]);
}
