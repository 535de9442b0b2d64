//////////////////////////////////////////////////////////////
/// config.rs
///
/// Command-line argument parsing: `-i` to load a file before the
/// prompt, `-x` to run one word non-interactively, `-q` to suppress
/// the banner and stack display, `-t` to start with tracing on.
use clap::Parser;

use crate::error::DebugLevel;

pub const VERSION: &str = "0.1.0";

#[derive(Parser, Debug)]
#[command(name = "f3core", version = VERSION, about = "A threaded-code Forth interpreter core")]
pub struct Cli {
    /// Load and run this source file before presenting the prompt.
    #[arg(short = 'i', long = "infile")]
    pub infile: Option<String>,

    /// Execute a single word non-interactively instead of entering the
    /// prompt loop.
    #[arg(short = 'x', long = "execute")]
    pub execute: Option<String>,

    /// Suppress the startup banner and the `.s` stack display.
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    pub quiet: bool,

    /// Start with the inner interpreter's trace flag already on.
    #[arg(short = 't', long = "trace", default_value_t = false)]
    pub trace: bool,

    /// Diagnostic verbosity.
    #[arg(long = "debug-level", value_parser = ["error", "warning", "info", "debug"])]
    pub debug_level: Option<String>,
}

pub struct Config {
    pub debug_level: DebugLevel,
    pub infile: Option<String>,
    pub execute: Option<String>,
    pub quiet: bool,
    pub trace: bool,
}

impl Config {
    pub fn new() -> Config {
        Config { debug_level: DebugLevel::Warning, infile: None, execute: None, quiet: false, trace: false }
    }

    /// Parse `std::env::args` with `clap` into a `Config`.
    pub fn from_args() -> Config {
        let cli = Cli::parse();
        let mut config = Config::new();
        if let Some(level) = cli.debug_level.as_deref().and_then(DebugLevel::from_str_loose) {
            config.debug_level = level;
        }
        config.infile = cli.infile;
        config.execute = cli.execute;
        config.quiet = cli.quiet;
        config.trace = cli.trace;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
