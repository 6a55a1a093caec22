use std::process::ExitCode;

fn main() -> ExitCode {
    techshop_cli::run()
}
