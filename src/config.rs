use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process-level settings, read once from the command line and passed to
/// whatever hosts the interpreter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub script: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub force: bool,
    pub silent: bool,
    pub debug: bool,
    /// 0 means one per CPU.
    pub threads: usize,
    pub cpu_profile: bool,
    pub mem_profile: bool,
    pub check_only: bool,
    pub interactive: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("output directory '{}' is not empty (use -f to clean it)", .0.display())]
    OutputNotEmpty(PathBuf),
    #[error("output directory '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

pub fn command() -> Command {
    Command::new("mxscript")
        .about("Runs simulation scripts")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Set output directory"),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Force start, clean existing output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Don't generate any log info")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('g')
                .long("debug")
                .help("Generate debug info")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .help("Maximum number of CPU threads, 0=auto")
                .value_parser(clap::value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("cpuprof")
                .long("cpuprof")
                .help("Record CPU profile")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("memprof")
                .long("memprof")
                .help("Record memory profile")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .short('c')
                .long("check")
                .help("Parse the script and report errors without running it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive mode")
                .action(ArgAction::SetTrue),
        )
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let script = matches.get_one::<String>("file").map(PathBuf::from);
        let output_dir = matches
            .get_one::<String>("output")
            .map(PathBuf::from)
            .or_else(|| script.as_deref().map(default_output_dir));

        Self {
            interactive: matches.get_flag("interactive") || script.is_none(),
            script,
            output_dir,
            force: matches.get_flag("force"),
            silent: matches.get_flag("silent"),
            debug: matches.get_flag("debug"),
            threads: matches.get_one::<usize>("threads").copied().unwrap_or(0),
            cpu_profile: matches.get_flag("cpuprof"),
            mem_profile: matches.get_flag("memprof"),
            check_only: matches.get_flag("check"),
        }
    }

    pub fn from_args() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.silent {
            "off"
        } else if self.debug {
            "mxscript=debug"
        } else {
            "mxscript=info"
        }
    }

    pub fn effective_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Create the output directory. An existing non-empty directory is only
    /// reused when `force` is set, in which case it is emptied first.
    pub fn prepare_output_dir(&self) -> Result<Option<&Path>, ConfigError> {
        let Some(dir) = self.output_dir.as_deref() else {
            return Ok(None);
        };
        let io_error = |source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        };

        if dir.exists() {
            let non_empty = fs::read_dir(dir).map_err(io_error)?.next().is_some();
            if non_empty {
                if !self.force {
                    return Err(ConfigError::OutputNotEmpty(dir.to_path_buf()));
                }
                tracing::info!(dir = %dir.display(), "cleaning output directory");
                fs::remove_dir_all(dir).map_err(io_error)?;
            }
        }

        fs::create_dir_all(dir).map_err(io_error)?;
        tracing::info!(dir = %dir.display(), "output directory");
        Ok(Some(dir))
    }
}

/// `run/sample.mx` writes to `run/sample.out`.
fn default_output_dir(script: &Path) -> PathBuf {
    script.with_extension("out")
}
