use std::process::ExitCode;

fn main() -> ExitCode {
    hipfrog_cli::run()
}
