//! HTTP access and external-open actions used by previews and downloads
//!
//! Both are behind traits so that the preview session and the download helper can be
//! exercised in tests without any network or desktop environment.

use std::error::Error;

use async_trait::async_trait;

/// Something that can fetch remote files over HTTP
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// A HEAD-like reachability probe, succeeding iff the resource answers with a
    /// success status
    async fn probe(&self, url: &str) -> Result<(), Box<dyn Error>>;

    /// Fetch a resource as text.
    ///
    /// Implementations must refuse bodies whose *declared* `Content-Length` exceeds
    /// `size_ceiling`. A server that omits the header is trusted (the original client
    /// behaved the same way).
    async fn fetch_text(&self, url: &str, size_ceiling: u64) -> Result<String, Box<dyn Error>>;

    /// Fetch a resource as raw bytes
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>>;
}

/// Something that can show a URL in a new browsing context (the "open in new tab"
/// degrade path). This is a best-effort action: failures are logged, never returned.
pub trait ExternalOpener: Send + Sync {
    fn open_in_new_tab(&self, url: &str);
}

/// A [`FileFetcher`] backed by a reqwest client
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileFetcher for ReqwestFetcher {
    async fn probe(&self, url: &str) -> Result<(), Box<dyn Error>> {
        let response = self.http
            .head(url)
            .header("X-Client-Info", crate::config::client_info())
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", response.status()).into());
        }
        Ok(())
    }

    async fn fetch_text(&self, url: &str, size_ceiling: u64) -> Result<String, Box<dyn Error>> {
        let response = self.http
            .get(url)
            .header("X-Client-Info", crate::config::client_info())
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", response.status()).into());
        }
        if let Some(declared_len) = response.content_length() {
            if declared_len > size_ceiling {
                return Err(format!("File is too large for preview ({} bytes)", declared_len).into());
            }
        }

        let text = response.text().await?;
        Ok(text)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let response = self.http
            .get(url)
            .header("X-Client-Info", crate::config::client_info())
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// An [`ExternalOpener`] that delegates to the operating system's URL handler
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open_in_new_tab(&self, url: &str) {
        #[cfg(target_os = "macos")]
        let program = "open";
        #[cfg(target_os = "windows")]
        let program = "explorer";
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let program = "xdg-open";

        log::info!("Opening {} in a new browsing context", url);
        if let Err(err) = std::process::Command::new(program).arg(url).spawn() {
            log::warn!("Unable to open {}: {}", url, err);
        }
    }
}
