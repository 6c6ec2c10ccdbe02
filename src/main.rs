use anyhow::Context;
use clap::Parser;
use file_follower::{DEFAULT_READ_BUFFER_SIZE, FollowConfig, OverflowPolicy, follow_file};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const BUFSIZ: usize = 1024;

#[derive(Parser)]
#[command(name = "follow")]
#[command(about = "Print bytes appended to a file as they are written")]
struct Cli {
    /// Path to the file to follow
    file: PathBuf,

    /// How often the watcher re-checks for shutdown, in milliseconds
    #[arg(long, env = "FOLLOW_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum bytes handed over per chunk
    #[arg(long, env = "FOLLOW_BUFFER_SIZE", default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    buffer_size: usize,

    /// Drop overflow notifications instead of rescanning the file
    #[arg(long)]
    ignore_overflow: bool,

    /// Log watcher activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the followed bytes, so logs go to stderr
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overflow = if cli.ignore_overflow {
        OverflowPolicy::Ignore
    } else {
        OverflowPolicy::Rescan
    };
    let config = FollowConfig::default()
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .with_read_buffer_size(cli.buffer_size)
        .with_overflow(overflow);

    let mut reader = follow_file(&cli.file, Some(config))
        .with_context(|| format!("cannot follow {}", cli.file.display()))?;
    tracing::info!("following {}", reader.path().display());

    let mut stdout = std::io::stdout().lock();
    let mut buffer = [0u8; BUFSIZ];
    loop {
        let nread = reader.read(&mut buffer).context("reading followed file")?;
        if nread == 0 {
            break;
        }
        stdout.write_all(&buffer[..nread])?;
        stdout.flush()?;
    }

    Ok(())
}
