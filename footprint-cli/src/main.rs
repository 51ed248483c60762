//! Entry point for the `footprint` command-line interface.
#![forbid(unsafe_code)]

use footprint_cli::CliError;

fn main() {
    match footprint_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("footprint: {err}");
            std::process::exit(1);
        }
    }
}
