use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use keyrot::Manager;
use keyrot_cli::configuration::KeyrotConfig;
use keyrot_cli::session;

/// Issue and validate rotating auth keys over stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "keyrot", version)]
struct Opt {
    /// Path to a YAML config file
    #[arg(short = 'c', long = "conf")]
    conf: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Enable basic logging; set RUST_LOG=info for visibility.
    env_logger::init();

    let opt = Opt::parse();

    let config = match &opt.conf {
        Some(path) => match KeyrotConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => KeyrotConfig::default(),
    };

    let manager = match Manager::new(config.manager_config()) {
        Ok(manager) => manager,
        Err(e) => {
            log::error!("Failed to create key manager: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = manager.config();
    log::info!(
        "Key manager ready: keys valid for {:?}, {} retained, rotating every {:?}",
        settings.duration,
        settings.limit,
        manager.rotation_interval()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = session::run(&manager, stdin.lock(), stdout.lock()) {
        log::error!("Session failed: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
