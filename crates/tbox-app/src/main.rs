//! Binary entry point for the completion reconciler.

use std::process::ExitCode;

use tbox_app::run_app;

fn main() -> ExitCode {
    run_app()
}
