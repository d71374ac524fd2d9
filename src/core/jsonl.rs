//! Line-oriented JSON files shared by the task instance store and the
//! event log.
//!
//! Appends run on the blocking pool and hold an exclusive `fs2` lock for
//! the duration of the write, so concurrent writers never interleave lines.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task;

use fs2::FileExt;

/// Append one line to `path`, creating the file if needed
pub async fn append_line(path: &Path, line: String) -> io::Result<()> {
    let path = path.to_path_buf();

    task::spawn_blocking(move || {
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        // Lock is released when file is dropped
        file.lock_exclusive()?;
        writeln!(file, "{}", line)?;
        file.flush()
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Read the non-blank lines of `path`; a missing file has none
pub async fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut lines = BufReader::new(file).lines();
    let mut out = Vec::new();

    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            out.push(line);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();

        let lines = read_lines(&temp_dir.path().join("absent.jsonl")).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_whole_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let path = path.clone();
                tokio::spawn(async move {
                    append_line(&path, format!("{{\"writer\":{}}}", i)).await.unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let lines = read_lines(&path).await.unwrap();
        assert_eq!(lines.len(), 16);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert!(value["writer"].is_u64());
        }
    }
}
