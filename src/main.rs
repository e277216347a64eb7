use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing::error;
use tokio::signal::ctrl_c;
use garage_controller::config::Settings;
use garage_controller::init;
use garage_controller::utils::logging;

/// Garage door controller
///
/// Drives the door opener from MQTT commands and publishes the door position.
#[derive(Parser, Debug)]
#[command(name = "garage-controller")]
#[command(about = "Garage door controller bridging a GPIO door opener to MQTT", long_about = None)]
struct Args {
    /// Controller configuration file
    #[arg(short = 'c', long = "config", default_value = "controller.config")]
    config: PathBuf,
}

/// The main entry point of the garage controller
///
/// Any startup error is fatal: it is printed and the process exits with status 1
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}


/// The core logic of the garage controller
///
/// 1. Parses the command line and loads the configuration file
/// 2. Initializes the logging system
/// 3. Wires pins, broker connection and state machine via `init::initialize`
/// 4. Runs the control loop until the process is interrupted or a background task stops
///
/// Returning drops the pins, which releases them. No offline message is sent here; the broker
/// delivers the connection's last will instead.
async fn run() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::new(&args.config)?;
    let _guard = logging::init_logger(&settings.logging)?;

    let context = init::initialize(&settings).await?;

    context
        .run_until(async {
            if let Err(e) = ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
