use clap::Parser;
use log::{info, warn};
use std::error;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

mod render;

use render::{encode_segment, RenderOptions};

#[derive(Debug)]
enum JP2000Error {
    OpeningFile { path: String, error: String },
    DecodingCodestream { path: String, error: String },
    FilesFailed { failed: usize, total: usize },
}

impl error::Error for JP2000Error {}
impl fmt::Display for JP2000Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OpeningFile { path, error } => {
                write!(f, "error opening {} {}", path, error)
            }
            Self::DecodingCodestream { path, error } => {
                write!(f, "error decoding jpc codestream {} {}", path, error)
            }
            Self::FilesFailed { failed, total } => {
                write!(f, "{} of {} files could not be read", failed, total)
            }
        }
    }
}

/// Dump the marker segments of DCI JPEG 2000 codestreams (.j2c, .jpc)
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Paths to codestream files
    #[arg(required = true)]
    paths: Vec<String>,

    /// Do not print payload bytes and tile-part data
    #[arg(long)]
    no_data: bool,

    /// Maximum number of bytes shown per hex dump, 0 for no limit
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    max_hex: usize,

    /// Log more, repeat for more detail (ignored when RUST_LOG is set)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn dump<W: Write>(
    writer: &mut W,
    path: &str,
    options: &RenderOptions,
) -> Result<(), Box<dyn Error>> {
    let file = match File::open(Path::new(path)) {
        Ok(file) => file,
        Err(error) => {
            return Err(JP2000Error::OpeningFile {
                path: path.to_owned(),
                error: error.to_string(),
            }
            .into())
        }
    };
    let reader = BufReader::new(file);

    writeln!(writer, "read {}", path)?;
    writeln!(writer)?;

    for decoded in jpc::walk(reader) {
        match decoded {
            Ok(decoded) => encode_segment(writer, &decoded, options)?,
            Err(error) => {
                return Err(JP2000Error::DecodingCodestream {
                    path: path.to_owned(),
                    error: error.to_string(),
                }
                .into())
            }
        }
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let opts: Opts = Opts::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(opts.verbose)),
    )
    .init();

    let options = RenderOptions {
        no_data: opts.no_data,
        max_hex: opts.max_hex,
    };

    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let mut failed = 0;
    for path in &opts.paths {
        info!("dumping {}", path);
        if let Err(error) = dump(&mut writer, path, &options) {
            warn!("{}", error);
            writeln!(writer, "{}", error)?;
            failed += 1;
        }
        writer.flush()?;
    }

    if failed > 0 {
        return Err(JP2000Error::FilesFailed {
            failed,
            total: opts.paths.len(),
        }
        .into());
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    match run() {
        Err(e) => {
            return Err(e.to_string().into());
        }
        Ok(_) => Ok(()),
    }
}
