use file_follower::{Error, FollowConfig, follow_file, watch_file};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tokio_stream::StreamExt;

fn test_config() -> Option<FollowConfig> {
    Some(FollowConfig::default().with_poll_interval(Duration::from_millis(50)))
}

fn temp_target() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::File::create(&path).unwrap();
    (dir, path)
}

fn append(path: &Path, content: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
}

/// Read until `expected` bytes have arrived or the stream ends
fn read_exactly(reader: &mut impl Read, expected: usize) -> Vec<u8> {
    let mut collected = Vec::new();
    let mut buffer = [0u8; 64];
    while collected.len() < expected {
        let nread = reader.read(&mut buffer).unwrap();
        if nread == 0 {
            break;
        }
        collected.extend_from_slice(&buffer[..nread]);
    }
    collected
}

#[test]
fn test_follow_directory_is_invalid_target() {
    let dir = tempfile::tempdir().unwrap();
    let result = follow_file(dir.path(), None);

    assert!(matches!(result, Err(Error::InvalidTarget { .. })));
}

#[test]
fn test_follow_sequence_of_appends_in_order() {
    let (_dir, path) = temp_target();
    let mut reader = follow_file(&path, test_config()).unwrap();
    let closer = reader.closer();

    reader.start().unwrap();
    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        for i in 0..20 {
            append(&writer_path, format!("line {i}\n").as_bytes());
            thread::sleep(Duration::from_millis(5));
        }
    });

    let expected: String = (0..20).map(|i| format!("line {i}\n")).collect();
    let collected = read_exactly(&mut reader, expected.len());
    writer.join().unwrap();

    assert_eq!(String::from_utf8(collected).unwrap(), expected);

    closer.close();
    let mut buffer = [0u8; 8];
    assert_eq!(reader.read(&mut buffer).unwrap(), 0);
}

#[test]
fn test_close_from_other_thread_unblocks_reader() {
    let (_dir, path) = temp_target();
    let mut reader = follow_file(&path, test_config()).unwrap();
    let closer = reader.closer();

    let closing = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        closer.close();
    });

    let started = Instant::now();
    assert_eq!(reader.read_byte().unwrap(), None);
    assert!(started.elapsed() < Duration::from_secs(5));
    closing.join().unwrap();

    // Terminal, not transient
    assert_eq!(reader.read_byte().unwrap(), None);
}

#[test]
fn test_follow_with_std_io_copy() {
    let (_dir, path) = temp_target();
    let mut reader = follow_file(&path, test_config()).unwrap();
    let closer = reader.closer();
    reader.start().unwrap();

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        append(&writer_path, b"copied");
        thread::sleep(Duration::from_millis(500));
        closer.close();
    });

    let mut sink = Vec::new();
    std::io::copy(&mut reader, &mut sink).unwrap();
    writer.join().unwrap();

    assert_eq!(sink, b"copied");
}

#[tokio::test]
async fn test_watch_file_stream_happy_path() {
    let (_dir, path) = temp_target();
    append(&path, b"before");

    let mut stream = watch_file(&path, test_config()).await.unwrap();
    append(&path, b"after");

    let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(chunk, Some(b"after".to_vec()));

    stream.close();
    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(end, None);
}

#[tokio::test]
async fn test_watch_file_directory_is_invalid_target() {
    let dir = tempfile::tempdir().unwrap();
    let result = watch_file(dir.path(), None).await;

    assert!(matches!(result, Err(Error::InvalidTarget { .. })));
}
