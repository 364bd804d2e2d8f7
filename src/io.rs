use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Error, Result};
use log::warn;
use tokio::{
    fs::{create_dir_all, metadata, remove_file, OpenOptions},
    io::{AsyncWrite, AsyncWriteExt},
};

pub const MISSING_DATA: &str = "missing data";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Skipped,
    Written,
    Failed { reason: String },
}

async fn create_parent_dirs_for(path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::msg(format!("{} has no parent directory.", path.display())))?;
    create_dir_all(parent)
        .await
        .with_context(|| format!("creating directory {}", parent.display()))?;
    Ok(())
}

/// `Ok(false)` if nothing is at `path`, an error if something other than a
/// regular file is.
pub async fn file_exists<P>(path: P) -> Result<bool>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(true),
        Ok(_) => Err(Error::msg(format!(
            "{} exists but is not a regular file.",
            path.display()
        ))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(Error::from(err).context(format!("inspecting {}", path.display()))),
    }
}

/// Write all of `bytes` into the freshly created `path`, removing it again
/// if the write fails so the next run fetches it anew.
pub async fn write_or_remove<W>(path: &Path, mut writer: W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(err) => Err(err),
    };
    drop(writer);
    if let Err(err) = written {
        if let Err(remove_err) = remove_file(path).await {
            warn!("Could not remove partial file {}: {remove_err}", path.display());
        }
        return Err(Error::from(err).context(format!("writing file {}", path.display())));
    }
    Ok(())
}

/// Write `data` to `path` unless a file is already there.
///
/// The file is opened with `create_new`, so of two racing writers only one
/// gets [`WriteOutcome::Written`]. A failed write removes the file; a crash
/// mid-write leaves a partial file that later runs will skip.
pub async fn save_new_file<P>(path: P, data: Option<&[u8]>) -> Result<WriteOutcome>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    create_parent_dirs_for(path).await?;
    if file_exists(path).await? {
        return Ok(WriteOutcome::Skipped);
    }
    let Some(bytes) = data else {
        return Ok(WriteOutcome::Failed {
            reason: MISSING_DATA.to_owned(),
        });
    };
    let file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(WriteOutcome::Skipped),
        Err(err) => {
            return Err(Error::from(err).context(format!("creating file {}", path.display())))
        }
    };
    write_or_remove(path, file, bytes).await?;
    Ok(WriteOutcome::Written)
}
