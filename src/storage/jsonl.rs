//! Newline-delimited JSON record store

use crate::extract::PageRecord;
use crate::storage::traits::{RecordStore, StorageResult};
use crate::url::{normalize_url, QueryPolicy};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The only part of a stored line needed to rebuild the index
#[derive(Deserialize)]
struct StoredKey {
    url: String,
}

/// Append-only NDJSON store, one record per line
///
/// The URL index is rebuilt from the file when the store is opened, which
/// is what makes an interrupted harvest resumable.
pub struct JsonlStore {
    path: PathBuf,
    file: File,
    urls: HashSet<String>,
}

impl JsonlStore {
    /// Opens (or creates) a store, indexing the records already in it
    ///
    /// Lines that are not valid UTF-8, not valid JSON or lack a `url` are
    /// logged and skipped.
    /// Stored URLs are re-normalized with `policy` so index lookups match the
    /// keys the crawler produces.
    pub fn open(path: &Path, policy: QueryPolicy) -> StorageResult<Self> {
        let mut urls = HashSet::new();

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for (index, bytes) in reader.split(b'\n').enumerate() {
                let line = match String::from_utf8(bytes?) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(
                            "Skipping malformed line {} in {}: {}",
                            index + 1,
                            path.display(),
                            e.utf8_error()
                        );
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoredKey>(&line) {
                    Ok(stored) => {
                        let key = normalize_url(&stored.url, policy)
                            .map(|u| u.to_string())
                            .unwrap_or(stored.url);
                        urls.insert(key);
                    }
                    Err(e) => tracing::warn!(
                        "Skipping malformed line {} in {}: {}",
                        index + 1,
                        path.display(),
                        e
                    ),
                }
            }
            tracing::info!("Resuming store {} with {} records", path.display(), urls.len());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        terminate_partial_line(&mut file)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            urls,
        })
    }

    /// Creates an empty store, truncating any existing file
    pub fn create(path: &Path) -> StorageResult<Self> {
        File::create(path)?;
        let file = OpenOptions::new().append(true).open(path)?;
        tracing::info!("Starting fresh store {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file,
            urls: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ends a line cut short by an interrupted write so the next record starts
/// on its own line
fn terminate_partial_line(file: &mut File) -> StorageResult<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
        file.flush()?;
    }
    Ok(())
}

impl RecordStore for JsonlStore {
    fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.urls.insert(record.url.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.urls.len()
    }
}

/// Reads every well-formed record of an NDJSON store
///
/// Returns the records and the number of lines that could not be decoded.
pub fn read_records(path: &Path) -> StorageResult<(Vec<PageRecord>, usize)> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut malformed = 0;

    for bytes in reader.split(b'\n') {
        let Ok(line) = String::from_utf8(bytes?) else {
            malformed += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PageRecord>(&line) {
            Ok(record) => records.push(record),
            Err(_) => malformed += 1,
        }
    }

    Ok((records, malformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{bare_record, full_record};
    use tempfile::TempDir;

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");

        let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
        store.append(&full_record("https://example.com/a")).unwrap();
        store.append(&full_record("https://example.com/b")).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.contains("https://example.com/a"));
        assert_eq!(lines(&path).len(), 2);
    }

    #[test]
    fn test_reopen_rebuilds_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");

        {
            let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
            store.append(&full_record("https://example.com/a")).unwrap();
        }

        let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
        assert!(store.contains("https://example.com/a"));
        store.append(&full_record("https://example.com/b")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(lines(&path).len(), 2);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        let good = serde_json::to_string(&bare_record("https://example.com/good")).unwrap();
        std::fs::write(&path, format!("{}\nnot json\n{{\"title\":\"no url\"}}\n", good)).unwrap();

        let store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains("https://example.com/good"));
    }

    #[test]
    fn test_stored_urls_are_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"url\":\"https://EXAMPLE.com/a/?utm_source=x\"}\n").unwrap();

        let store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();

        assert!(store.contains("https://example.com/a"));
    }

    #[test]
    fn test_partial_last_line_is_terminated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"url\":\"https://exam").unwrap();

        let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
        store.append(&full_record("https://example.com/b")).unwrap();

        let (records, malformed) = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(malformed, 1);
    }

    #[test]
    fn test_line_cut_inside_multibyte_character_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        let good = serde_json::to_string(&bare_record("https://example.com/a")).unwrap();
        let mut content = format!("{}\n", good).into_bytes();
        // "Café" cut after the first byte of the two-byte "é"
        content.extend_from_slice(b"{\"url\":\"https://example.com/b\",\"title\":\"Caf\xC3");
        std::fs::write(&path, &content).unwrap();

        let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("https://example.com/a"));
        assert!(!store.contains("https://example.com/b"));

        store.append(&full_record("https://example.com/b")).unwrap();
        assert!(store.contains("https://example.com/b"));

        let (records, malformed) = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(malformed, 1);
    }

    #[test]
    fn test_create_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        {
            let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
            store.append(&full_record("https://example.com/a")).unwrap();
        }

        let store = JsonlStore::create(&path).unwrap();

        assert!(store.is_empty());
        assert!(lines(&path).is_empty());
    }

    #[test]
    fn test_read_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        let record = full_record("https://example.com/a");
        let mut store = JsonlStore::open(&path, QueryPolicy::Drop).unwrap();
        store.append(&record).unwrap();

        let (records, malformed) = read_records(&path).unwrap();

        assert_eq!(records, vec![record]);
        assert_eq!(malformed, 0);
    }
}
