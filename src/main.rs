use std::process::ExitCode;

use orbshell::ShellConfig;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbshell=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ShellConfig::load(&path) {
            Ok(config) => {
                tracing::info!(%path, "loaded config");
                config
            }
            Err(err) => {
                tracing::error!(%path, %err, "could not load config");
                return ExitCode::FAILURE;
            }
        },
        None => ShellConfig::default(),
    };

    match orbshell::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "viewer exited with an error");
            ExitCode::FAILURE
        }
    }
}
