use std::process::ExitCode;

use clap::Parser;
use stage_onboard::cli;
use stage_onboard::error::OnboardError;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let onboard_err = err.downcast_ref::<OnboardError>();
            if let Some(OnboardError::Schema { errors }) = onboard_err {
                for line in errors {
                    eprintln!("  - {line}");
                }
            }
            ExitCode::from(onboard_err.map(OnboardError::exit_code).unwrap_or(1))
        }
    }
}
