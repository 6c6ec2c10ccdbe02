//! Extraction of the byte range appended to a file since the last look.

use crate::error::Result;
use crate::queue::{Chunk, ChunkSender};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, trace};

/// Current size of the file, or 0 when it does not exist.
pub(crate) async fn current_size(file_path: &Path) -> Result<u64> {
    match fs::metadata(file_path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Push every byte appended past `baseline` onto the queue, in pieces of at
/// most `chunk_size` bytes, and move `baseline` to the current size.
///
/// Returns the number of bytes pushed.
pub(crate) async fn read_appended(
    file_path: &Path,
    baseline: &mut u64,
    chunk_size: usize,
    queue: &ChunkSender,
) -> Result<u64> {
    let current_size = current_size(file_path).await?;

    // Handle file truncation
    if detect_file_truncation(current_size, *baseline) {
        debug!(
            "[watcher] {} truncated from {} to {} bytes",
            file_path.display(),
            *baseline,
            current_size
        );
        *baseline = 0;
    }

    let Some(bytes_to_read) = calculate_bytes_to_read(current_size, *baseline) else {
        *baseline = current_size;
        return Ok(0);
    };

    let mut file = File::open(file_path).await?;
    file.seek(std::io::SeekFrom::Start(*baseline)).await?;

    // Bytes written after the size was sampled belong to the next event
    let mut region = file.take(bytes_to_read);
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut pushed = 0u64;

    loop {
        let nread = region.read(&mut buffer).await?;
        if nread == 0 {
            break;
        }
        queue.push(Chunk::Data(buffer[..nread].to_vec()));
        // Advance as we go so a failed read never replays pushed bytes
        *baseline += nread as u64;
        pushed += nread as u64;
    }

    trace!("[watcher] forwarded {} bytes from {}", pushed, file_path.display());
    *baseline = current_size;

    Ok(pushed)
}

/// Detect if the file was truncated by comparing current size with the baseline
fn detect_file_truncation(current_size: u64, baseline: u64) -> bool {
    current_size < baseline
}

/// Calculate bytes to read based on current size and baseline
fn calculate_bytes_to_read(current_size: u64, baseline: u64) -> Option<u64> {
    if current_size <= baseline {
        None // Nothing new to read
    } else {
        Some(current_size - baseline)
    }
}
