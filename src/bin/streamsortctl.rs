//! Demo/harness CLI for the external-sort engine. Wires the engine against
//! file-backed stand-ins for the broker endpoints — `--input`/`--output` are
//! plain newline-delimited CSV files, not a network client. Real broker
//! wiring is out of scope for this crate (see the crate docs).

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use streamsort::{external_sort, parse_selector, Config, InputEndpoint, OutputEndpoint, ReadOutcome};

#[derive(Parser)]
#[command(name = "streamsortctl", about = "Run the external-sort engine against file-backed stand-ins for the broker")]
struct Cli {
    /// Newline-delimited CSV file to replay as the input topic
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// File to write the sorted output to
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Sort key: id, name, or continent
    #[arg(long, value_name = "SELECTOR")]
    by: String,

    /// Directory for spill files (default: a streamsort-* dir under the OS temp dir)
    #[arg(long = "temp-dir", value_name = "DIR")]
    temp_dir: Option<PathBuf>,

    /// Optional TOML config file overriding chunk bounds / batch size / etc.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override chunk_floor from the config
    #[arg(long = "chunk-floor", value_name = "N")]
    chunk_floor: Option<usize>,

    /// Override chunk_ceiling from the config
    #[arg(long = "chunk-ceiling", value_name = "N")]
    chunk_ceiling: Option<usize>,
}

/// Replays a plain file as the input endpoint: one CSV record per line.
/// There is no real "wait" to bound — EOF is reported as drained immediately.
struct FileInput {
    reader: BufReader<File>,
}

impl InputEndpoint for FileInput {
    fn read(&mut self, _deadline: Duration) -> ReadOutcome {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => ReadOutcome::Drained,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                ReadOutcome::Record(buf)
            }
            Err(e) => ReadOutcome::Fatal(e),
        }
    }
}

/// Writes published batches straight through to a file, one record per line.
struct FileOutput {
    writer: BufWriter<File>,
}

impl OutputEndpoint for FileOutput {
    fn publish(&mut self, batch: &[Vec<u8>]) -> io::Result<()> {
        for record in batch {
            self.writer.write_all(record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let selector = parse_selector(&cli.by)
        .with_context(|| format!("invalid --by value '{}'", cli.by))?;

    let mut config = if let Some(ref path) = cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Config::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))?
    } else {
        Config::default()
    };

    if let Some(temp_dir) = cli.temp_dir {
        config.temp_dir = temp_dir;
    }
    if let Some(floor) = cli.chunk_floor {
        config.chunk_floor = floor;
    }
    if let Some(ceiling) = cli.chunk_ceiling {
        config.chunk_ceiling = ceiling;
    }

    let input_file = File::open(&cli.input)
        .with_context(|| format!("opening input file {}", cli.input.display()))?;
    let mut input = FileInput {
        reader: BufReader::with_capacity(config.io_buffer_bytes, input_file),
    };

    let output_file = File::create(&cli.output)
        .with_context(|| format!("creating output file {}", cli.output.display()))?;
    let mut output = FileOutput {
        writer: BufWriter::with_capacity(config.io_buffer_bytes, output_file),
    };

    let stats = external_sort(&mut input, &mut output, selector, &config)
        .context("external sort failed")?;

    eprintln!(
        "streamsortctl: {} chunks, {} records ingested, {} records emitted",
        stats.chunks_written, stats.records_ingested, stats.records_emitted
    );

    Ok(())
}
