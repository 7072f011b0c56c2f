use std::process::ExitCode;

use clap::Parser;

use crate::cli::App;

mod browse;
mod cli;
mod config;
mod render;

fn main() -> ExitCode {
    if std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
        // Error chains are enough for operators, keep anyhow from capturing.
        // SAFETY: called before the runtime starts any threads.
        unsafe { std::env::set_var("RUST_LIB_BACKTRACE", "0") };
    }

    let app = App::parse();
    match app.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
