use std::process::ExitCode;

fn main() -> ExitCode {
    lapprice_cli::run()
}
