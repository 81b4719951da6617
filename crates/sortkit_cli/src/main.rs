use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    sortkit_log::init_logging();
    cli::Cli::run_from_args()
}
