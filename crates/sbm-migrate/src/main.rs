use sbm_migrate::{cli, logging, MigrateError};
use std::io::Write;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // usage errors go to stdout with the rest of the run's output
    let matches = match cli::command().try_get_matches() {
        Ok(matches) => matches,
        Err(error) => {
            let _ = write!(out, "{}", error.render());
            return u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from);
        }
    };
    let (format, verbose) = cli::log_settings(&matches);
    logging::init(format, verbose);

    match cli::run(&matches, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(out, "error: {error:#}");
            let usage = error
                .downcast_ref::<MigrateError>()
                .is_some_and(MigrateError::is_usage);
            if usage {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
