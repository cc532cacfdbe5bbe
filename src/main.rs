use anyhow::{Error, Result};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use termcolor::ColorChoice;

use geolook::config::{Config, ConfigFile, Prompt, DEFAULT_CONFIG_FILE};
use geolook::logging::{self, LogLevel};
use geolook::{Job, MatchMode, Pipeline, ViewKind};

/// Check if the error chain contains a broken pipe error.
#[inline(always)]
fn is_broken_pipe(err: &Error) -> bool {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::BrokenPipe {
                return true;
            }
        }
    }
    false
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Input file, .csv or .json
    #[clap(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    file: Utf8PathBuf,

    /// Column holding the IP addresses to look up
    #[clap(short, long, value_name = "NAME")]
    column: Option<String>,

    /// Views to export: "i" for IP addresses, "g" for GeoIP data, "c" for
    /// the input combined with GeoIP data
    #[clap(short, long, value_enum, num_args = 1.., value_name = "KIND")]
    export: Vec<ViewKind>,

    /// Directory for exported files (default: current directory)
    #[clap(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    output_path: Option<Utf8PathBuf>,

    /// Only keep rows where this column equals --filter-data
    #[clap(short, long, value_name = "NAME")]
    filter_column: Option<String>,

    /// Value the filter column must equal
    #[clap(short = 'd', long, value_name = "VALUE")]
    filter_data: Option<String>,

    /// How strictly candidate addresses are checked
    #[clap(short, long, value_enum, default_value_t = ArgsMatchMode::Loose)]
    match_mode: ArgsMatchMode,

    /// Directory containing GeoLite2-City.mmdb and GeoLite2-ASN.mmdb
    /// (overrides the configuration file)
    #[clap(
        short = 'I',
        long,
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
        env = "GEOIP_MMDB_DIR"
    )]
    db_dir: Option<Utf8PathBuf>,

    /// Configuration file remembering the database directory
    #[clap(long, value_name = "FILE", env = "GEOLOOK_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: Utf8PathBuf,

    /// Use color in printed tables
    #[clap(short = 'C', long, value_enum, default_value_t = ArgsColorChoice::Auto)]
    color: ArgsColorChoice,

    /// Log level
    #[clap(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsColorChoice {
    Always,
    Never,
    Auto,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsMatchMode {
    /// Any dotted quad of 1-3 digit groups
    Loose,
    /// Dotted quads that are legal IPv4 addresses
    Validated,
}

impl From<ArgsMatchMode> for MatchMode {
    fn from(mode: ArgsMatchMode) -> Self {
        match mode {
            ArgsMatchMode::Loose => MatchMode::Loose,
            ArgsMatchMode::Validated => MatchMode::Validated,
        }
    }
}

fn main() -> ExitCode {
    let err = match run_main() {
        Ok(code) => return code,
        Err(err) => err,
    };

    if is_broken_pipe(&err) {
        return ExitCode::SUCCESS;
    }

    // Print detailed error information based on environment variables
    let mut stderr = std::io::stderr();
    let _ = if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(stderr, "{:?}", err)
    } else {
        writeln!(stderr, "Error: {:#}", err)
    };

    ExitCode::FAILURE
}

fn run_main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init_logger(args.log_level.into())?;

    // auto colors only when stdout is a tty
    let colormode = match args.color {
        ArgsColorChoice::Auto => {
            if std::io::stdout().is_terminal() {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            }
        }
        ArgsColorChoice::Always => ColorChoice::Always,
        ArgsColorChoice::Never => ColorChoice::Never,
    };

    let config = match args.db_dir {
        Some(dir) => Config::new(dir),
        None => ConfigFile::new(args.config).resolve(&mut Prompt::stdin())?,
    };

    let job = Job {
        input: args.file,
        ip_column: args.column,
        exports: args.export,
        output_dir: args.output_path,
        filter_column: args.filter_column,
        filter_value: args.filter_data,
        match_mode: args.match_mode.into(),
    };

    let outcome = Pipeline::new(config).with_color(colormode).run(&job)?;
    log::debug!("run finished: {:?}", outcome);

    Ok(ExitCode::SUCCESS)
}
