use std::process::ExitCode;

fn main() -> ExitCode {
    martley_cli::run()
}
