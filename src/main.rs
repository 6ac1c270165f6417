use std::process::ExitCode;

use weavestore::ui::output;

fn main() -> ExitCode {
    match weavestore::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
