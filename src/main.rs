use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, Level};

use ihex_flash::{
    encode_binary, EncodeError, EncoderConfig, ImageError, LoadError, Loader, MemoryImage,
    DEFAULT_RECORD_SIZE,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_TRUNCATED: u8 = 2;

/// Decode an Intel HEX file into absolute addresses, or encode a binary as one.
#[derive(Debug, Parser)]
#[command(name = "ihex-flash", version)]
struct Args {
    /// Intel HEX file to decode, or the binary to encode with --encode
    input: PathBuf,

    /// More log output; repeat for debug and trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the result to a file instead of stdout (a flat binary when decoding)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Byte used for gaps in the flat binary
    #[arg(long, default_value = "0xFF", value_parser = parse_u8)]
    fill: u8,

    /// Treat the input as a raw binary and print it as Intel HEX
    #[arg(long)]
    encode: bool,

    /// Address of the first input byte when encoding
    #[arg(long, default_value = "0", value_parser = parse_u32)]
    base_address: u32,

    /// Data bytes per record when encoding
    #[arg(long, default_value_t = DEFAULT_RECORD_SIZE)]
    record_size: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("unable to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("unable to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Load(#[from] LoadError<ImageError>),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Image(#[from] ImageError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    let result = if args.encode {
        encode(&args)
    } else {
        decode(&args)
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn decode(args: &Args) -> Result<ExitCode, CliError> {
    let file = File::open(&args.input).map_err(|source| CliError::Open {
        path: args.input.clone(),
        source,
    })?;

    let mut loader = Loader::new(MemoryImage::new());
    let summary = loader.load(BufReader::new(file))?;

    info!(
        lines = summary.lines,
        records = summary.records,
        bytes = summary.bytes_written,
        warnings = summary.warnings,
        "decoded {}",
        args.input.display()
    );

    let image = loader.into_writer();

    match &args.output {
        Some(path) => write_file(path, &image.to_binary(args.fill)?)?,
        None => dump(&image).map_err(|source| CliError::Write {
            path: PathBuf::from("<stdout>"),
            source,
        })?,
    }

    if summary.end_of_file {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_TRUNCATED))
    }
}

fn encode(args: &Args) -> Result<ExitCode, CliError> {
    let data = fs::read(&args.input).map_err(|source| CliError::Open {
        path: args.input.clone(),
        source,
    })?;

    let config = EncoderConfig {
        base_address: args.base_address,
        record_size: args.record_size,
    };
    let text = encode_binary(&data, config)?;

    match &args.output {
        Some(path) => write_file(path, text.as_bytes())?,
        None => io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .map_err(|source| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })?,
    }

    Ok(ExitCode::SUCCESS)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Prints every block of the image as rows of `address: bytes`.
fn dump(image: &MemoryImage) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (start, data) in image.blocks() {
        for (row, chunk) in data.chunks(16).enumerate() {
            write!(out, "{:08X}:", start as usize + row * 16)?;
            for byte in chunk {
                write!(out, " {:02X}", byte)?;
            }
            writeln!(out)?;
        }
    }

    out.flush()
}

fn parse_number(s: &str) -> Result<u64, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let value = parse_number(s).map_err(|err| err.to_string())?;
    u32::try_from(value).map_err(|_| format!("{} does not fit in 32 bits", s))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_number(s).map_err(|err| err.to_string())?;
    u8::try_from(value).map_err(|_| format!("{} does not fit in a byte", s))
}
