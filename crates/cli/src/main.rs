use std::process::ExitCode;

fn main() -> ExitCode {
    cartfill_cli::run()
}
