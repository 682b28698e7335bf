use std::process::ExitCode;

use musicdbd::{Termination, run_daemon};

fn main() -> ExitCode {
    match run_daemon() {
        Ok(termination) => termination.into(),
        Err(error) => {
            eprintln!("musicdbd: {error}");
            Termination::Forced.into()
        }
    }
}
