//! Artifact persistence: drains an asset stream into its output file.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::warn;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure while draining a stream: either the stream itself or the file.
#[derive(Debug, Error)]
pub enum WriteError<E> {
    /// The producing stream failed; carries its own error unchanged.
    #[error(transparent)]
    Source(E),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Write every chunk of `stream` to `destination`, creating or truncating it.
///
/// Resolves with the number of bytes written once the data is flushed and
/// synced. The file handle is closed before returning on every path; on
/// failure the partially written file is removed.
pub async fn write_artifact<S, E>(stream: S, destination: &Path) -> Result<u64, WriteError<E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let mut file = File::create(destination)
        .await
        .map_err(|source| PersistError::Io {
            path: destination.to_path_buf(),
            source,
        })?;

    let result = drain(&mut file, stream, destination).await;
    drop(file);

    if result.is_err() {
        if let Err(err) = fs::remove_file(destination).await {
            warn!(
                path = %destination.display(),
                error = %err,
                "failed to remove partial artifact"
            );
        }
    }

    result
}

async fn drain<S, E>(
    file: &mut File,
    stream: S,
    destination: &Path,
) -> Result<u64, WriteError<E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let io_error = |source| PersistError::Io {
        path: destination.to_path_buf(),
        source,
    };

    let mut total_bytes: u64 = 0;

    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(WriteError::Source)?;
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await.map_err(io_error)?;
        total_bytes += chunk.len() as u64;
    }

    file.flush().await.map_err(io_error)?;
    file.sync_all().await.map_err(io_error)?;
    Ok(total_bytes)
}
