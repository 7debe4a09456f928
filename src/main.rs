use imagepromoter::ui::output;
use std::process::ExitCode;

fn main() -> ExitCode {
    match imagepromoter::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
