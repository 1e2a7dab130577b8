//! Atomic write operations for JSONL files.
//!
//! Data is written to a sibling `.tmp` file, flushed, then renamed over the
//! target. Renames within one filesystem are atomic on POSIX, so a crash
//! leaves either the old file or the new one, never a torn write.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically replaces `path` with one JSON line per value.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or the rename
/// fails. On failure the original file is left untouched.
///
/// # Examples
///
/// ```no_run
/// use linchpin_jsonl::write_jsonl_atomic;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ids = vec!["dep-a1b2", "dep-c3d4"];
/// write_jsonl_atomic("ids.jsonl", &ids).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await
}

/// Iterator flavour of [`write_jsonl_atomic`].
///
/// # Errors
///
/// See [`write_jsonl_atomic`].
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        // Best-effort cleanup; the write error is what matters.
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    tracing::trace!(path = %path.display(), "Atomically replaced JSONL file");
    Ok(())
}

/// Appends `.tmp` to the file name, keeping any existing extension.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    writer.into_inner().into_inner().sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Record {
        id: u32,
    }

    #[rstest]
    #[case("/data/edges.jsonl", "/data/edges.jsonl.tmp")]
    #[case("/data/edges", "/data/edges.tmp")]
    #[case("items.tar.gz", "items.tar.gz.tmp")]
    fn temp_path_keeps_extension(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(input)), Path::new(expected));
    }

    #[tokio::test]
    async fn replaces_existing_file_and_removes_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("edges.jsonl");
        tokio::fs::write(&target, "stale\n").await.unwrap();

        write_jsonl_atomic(&target, &[Record { id: 1 }, Record { id: 2 }])
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents, "{\"id\":1}\n{\"id\":2}\n");
        assert!(!dir.path().join("edges.jsonl.tmp").exists());
    }

    #[tokio::test]
    async fn empty_slice_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("empty.jsonl");

        write_jsonl_atomic::<Record, _>(&target, &[]).await.unwrap();

        assert_eq!(tokio::fs::metadata(&target).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_directory_fails_without_touching_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("edges.jsonl");

        let result = write_jsonl_atomic(&target, &[Record { id: 1 }]).await;

        assert!(result.is_err());
        assert!(!target.exists());
    }
}
