//! The file storage service study material files are uploaded to
//!
//! Uploaded objects get a random prefix so that two files with the same name never
//! collide, and are publicly readable afterwards at a stable URL. [`RemoteBucket`]
//! talks to the hosted service; [`MemoryBucket`] is its in-process stand-in for tests.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use url::Url;

#[cfg(feature = "local_store_mocks_remote_store")]
use crate::mock_behaviour::MockBehaviour;

/// Upload body chunk size. Small enough to give a usable progress granularity
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Called with `(bytes_sent, bytes_total)` as an upload progresses
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Where an uploaded file ended up
#[derive(Clone, Debug, PartialEq)]
pub struct StoredFile {
    /// The object path within the bucket (random prefix + sanitized file name)
    pub path: String,
}

/// A bucket files can be uploaded to
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Upload `bytes` under a collision-free name derived from `file_name`.
    ///
    /// The returned path is what [`public_url`](Self::public_url) expects.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>,
                    progress: Option<ProgressCallback>) -> Result<StoredFile, Box<dyn Error>>;

    /// The public URL an uploaded object is readable at
    fn public_url(&self, path: &str) -> Result<Url, Box<dyn Error>>;
}

/// Pick the name an object is stored under: a random prefix, then the sanitized
/// original name (kept so downloads can suggest it back)
fn object_path(file_name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4().to_hyphenated(), sanitize_filename::sanitize(file_name))
}

/// A bucket on the hosted storage service
pub struct RemoteBucket {
    base_url: Url,
    api_key: String,
    bucket: String,
    http: reqwest::Client,
}

impl RemoteBucket {
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(base_url: S, api_key: T, bucket: U) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl FileStorage for RemoteBucket {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>,
                    progress: Option<ProgressCallback>) -> Result<StoredFile, Box<dyn Error>>
    {
        let path = object_path(file_name);
        let url = self.base_url.join(&format!("storage/v1/object/{}/{}", self.bucket, path))?;

        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(|chunk| chunk.to_vec()).collect();
        let mut sent = 0;
        let body_stream = futures::stream::iter(chunks)
            .map(move |chunk| {
                sent += chunk.len() as u64;
                if let Some(report) = &progress {
                    report(sent, total);
                }
                Ok::<_, std::io::Error>(chunk)
            });

        let response = self.http
            .post(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Client-Info", crate::config::client_info())
            .body(reqwest::Body::wrap_stream(body_stream))
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", response.status()).into());
        }

        log::info!("Uploaded {} bytes as {}", total, path);
        Ok(StoredFile { path })
    }

    fn public_url(&self, path: &str) -> Result<Url, Box<dyn Error>> {
        let url = self.base_url.join(&format!("storage/v1/object/public/{}/{}", self.bucket, path))?;
        Ok(url)
    }
}

/// An in-memory bucket
pub struct MemoryBucket {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,

    #[cfg(feature = "local_store_mocks_remote_store")]
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryBucket {
    pub fn new<S: ToString>(bucket: S) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),

            #[cfg(feature = "local_store_mocks_remote_store")]
            mock_behaviour: None,
        }
    }

    #[cfg(feature = "local_store_mocks_remote_store")]
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// The stored bytes of an uploaded object
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl FileStorage for MemoryBucket {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>,
                    progress: Option<ProgressCallback>) -> Result<StoredFile, Box<dyn Error>>
    {
        #[cfg(feature = "local_store_mocks_remote_store")]
        self.mock_behaviour.as_ref().map_or(Ok(()), |b| b.lock().unwrap().can_upload())?;

        let path = object_path(file_name);
        let total = bytes.len() as u64;
        self.objects.lock().unwrap().insert(path.clone(), bytes);
        if let Some(report) = &progress {
            report(total, total);
        }
        Ok(StoredFile { path })
    }

    fn public_url(&self, path: &str) -> Result<Url, Box<dyn Error>> {
        let url = Url::parse(&format!("memory://{}/{}", self.bucket, path))?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn memory_bucket_round_trip() {
        let bucket = MemoryBucket::new("study-materials");
        let stored = bucket.upload("Report.pdf", b"content".to_vec(), None).await.unwrap();

        assert!(stored.path.ends_with("-Report.pdf"));
        assert_eq!(bucket.object(&stored.path).unwrap(), b"content");

        let url = bucket.public_url(&stored.path).unwrap();
        assert!(url.as_str().starts_with("memory://study-materials/"));
    }

    #[tokio::test]
    async fn upload_names_are_collision_free() {
        let bucket = MemoryBucket::new("study-materials");
        let first = bucket.upload("notes.txt", b"a".to_vec(), None).await.unwrap();
        let second = bucket.upload("notes.txt", b"b".to_vec(), None).await.unwrap();
        assert_ne!(first.path, second.path);
    }

    #[tokio::test]
    async fn progress_reports_completion() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_by_callback = Arc::clone(&seen);
        let report: ProgressCallback = Arc::new(move |sent, total| {
            assert_eq!(sent, total);
            seen_by_callback.store(sent, Ordering::SeqCst);
        });

        let bucket = MemoryBucket::new("study-materials");
        bucket.upload("notes.txt", vec![0; 10], Some(report)).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }
}
