use mxscript::{builtins, runner, Config, Evaluator};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let config = Config::from_args();
    init_tracing(&config);

    tracing::info!(threads = config.effective_threads(), "starting");
    if config.cpu_profile || config.mem_profile {
        tracing::warn!(
            cpu = config.cpu_profile,
            mem = config.mem_profile,
            "profiling is handled by the engine host, ignoring profile flags"
        );
    }

    match config.script.as_deref() {
        Some(path) => run_file(&config, path),
        None => {
            mxscript::start_repl(builtins::environment());
            ExitCode::SUCCESS
        }
    }
}

/// `RUST_LOG` takes precedence over the -s/-g flags.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run_file(config: &Config, path: &Path) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let filename = path.display().to_string();

    if config.check_only {
        return match runner::check(&source) {
            Ok(count) => {
                tracing::info!(statements = count, "{} is valid", filename);
                ExitCode::SUCCESS
            }
            Err(error) => {
                error.report(&source, Some(&filename));
                ExitCode::FAILURE
            }
        };
    }

    if let Err(error) = config.prepare_output_dir() {
        eprintln!("Error: {}", error);
        return ExitCode::FAILURE;
    }

    let mut evaluator = Evaluator::new(builtins::environment());
    if config.interactive {
        // Run the file first, then keep its bindings at the prompt.
        if let Err(error) = runner::run(&source, &mut evaluator) {
            error.report(&source, Some(&filename));
        }
        mxscript::start_repl(evaluator.into_environment());
        return ExitCode::SUCCESS;
    }

    match runner::run(&source, &mut evaluator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error.report(&source, Some(&filename));
            ExitCode::FAILURE
        }
    }
}
