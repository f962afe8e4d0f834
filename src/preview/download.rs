//! Best-effort file downloads
//!
//! The primary path fetches the file and hands it to a local [`FileSaver`] under the
//! suggested name; any failure degrades to opening the remote URL directly in a new
//! browsing context. Nothing on this path ever propagates an error to the caller.

use std::error::Error;
use std::path::PathBuf;

use crate::fetch::{ExternalOpener, FileFetcher};

/// The local destination of a downloaded file (the object-URL-and-anchor analog of the
/// original web client)
pub trait FileSaver: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), Box<dyn Error>>;
}

/// A [`FileSaver`] that writes into a directory on disk
pub struct DiskSaver {
    directory: PathBuf,
}

impl DiskSaver {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl FileSaver for DiskSaver {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
        let destination = self.directory.join(file_name);
        std::fs::write(&destination, bytes)?;
        log::info!("Saved {} bytes to {:?}", bytes.len(), destination);
        Ok(())
    }
}

/// Download `url` and save it under `suggested_name`.
///
/// The suggested name is sanitized before it reaches the local filesystem. On any
/// fetch or save failure, the remote URL is opened in a new browsing context instead
/// (exactly once), and the failure is only logged.
pub async fn download<F, S, O>(fetcher: &F, saver: &S, opener: &O, url: &str, suggested_name: &str)
where
    F: FileFetcher,
    S: FileSaver,
    O: ExternalOpener,
{
    let file_name = sanitize_filename::sanitize(suggested_name);

    let saved = match fetcher.fetch_bytes(url).await {
        Ok(bytes) => saver.save(&file_name, &bytes),
        Err(err) => Err(err),
    };

    if let Err(err) = saved {
        log::warn!("Unable to download {} as {:?} ({}), opening it directly instead", url, file_name, err);
        opener.open_in_new_tab(url);
    }
}

/// Ephemeral per-file download state, owned by the view that lists a material's files.
///
/// The download helper itself does not report progress; the view updates this from its
/// own bindings and resets it when the hosting modal closes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DownloadState {
    pub is_downloading: bool,
    /// 0–100
    pub progress: u8,
    pub error: Option<String>,
}

impl DownloadState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
