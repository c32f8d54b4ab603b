use clap::{ArgGroup, Parser};
use pvmx::archive::{list, pack, unpack, PackOptions, UnpackOptions};
use pvmx::io_stream::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pvmx", version, about = "Pack and unpack PVMX texture pack archives")]
#[command(arg_required_else_help = true)]
#[command(group(ArgGroup::new("mode").required(true).args(["create", "extract", "list"])))]
struct Cli {
    /// Create an archive using the given texture pack index (or the folder containing index.txt)
    #[arg(short, long, value_name = "PATH")]
    create: Option<PathBuf>,
    /// Extract an archive
    #[arg(short, long, value_name = "PATH")]
    extract: Option<PathBuf>,
    /// List the dictionary of an archive without extracting it
    #[arg(short, long, value_name = "PATH")]
    list: Option<PathBuf>,
    /// Output file for creation or output directory for extraction
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,
    /// Copy buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let output = cli.output.as_deref();

    // ── Create ───────────────────────────────────────────────────────────────
    if let Some(input) = &cli.create {
        let opts = PackOptions { chunk_size: cli.chunk_size };
        let summary = pack(input, output, &opts)?;
        println!("Created: {}", summary.archive.display());
        return Ok(());
    }

    // ── Extract ──────────────────────────────────────────────────────────────
    if let Some(input) = &cli.extract {
        let opts = UnpackOptions { chunk_size: cli.chunk_size };
        let summary = unpack(input, output, &opts)?;
        println!("Unpacked to: {}", summary.output_dir.display());
        return Ok(());
    }

    // ── List ─────────────────────────────────────────────────────────────────
    if let Some(input) = &cli.list {
        let records = list(input)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        println!("Archive: {}", input.display());
        println!("{:>5} {:>10} {:<32} {:>11} {:>12} {:>12}",
                 "#", "Index", "Name", "Size (px)", "Offset", "Bytes");
        for (i, r) in records.iter().enumerate() {
            let gbix = r.entry.global_index
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".into());
            let dims = if r.entry.has_dimensions() {
                format!("{}x{}", r.entry.width, r.entry.height)
            } else {
                "-".into()
            };
            println!("{:>5} {:>10} {:<32} {:>11} {:>12} {:>12}",
                     i, gbix, r.entry.name, dims, r.payload.offset, r.payload.size);
        }
    }

    Ok(())
}
