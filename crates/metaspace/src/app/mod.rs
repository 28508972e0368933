mod bootstrap;
mod loop_runner;
mod map;
mod net;
mod player;
mod space;
mod zones;

use std::process::ExitCode;

use tracing::error;

pub(crate) fn run() -> ExitCode {
    match bootstrap::build_app() {
        Ok(wiring) => loop_runner::run(wiring),
        Err(error) => {
            error!(error = %error, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
