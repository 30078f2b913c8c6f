mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    let command = cli::CommandLineInterface::load();
    if let Err(error) = cli::init_logging(command.verbosity()) {
        eprintln!("{error}");
    }
    match command.run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}
