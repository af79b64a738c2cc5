//! Image acquisition subsystem
//!
//! This module provides:
//! - `ObjectUrlRegistry`: local preview handles for selected files, with
//!   explicit release semantics (an unreleased handle is a resource leak)
//! - `ImageProbe`: the "does this URL actually serve an image" check
//! - `DebouncedUrlProbe`: runs the probe behind a debounce window so typing
//!   in the URL field does not fire a request per keystroke
//!
//! Out-of-order completions are handled with a generation counter: every
//! scheduled probe captures the generation it was started under, the previous
//! probe task is aborted, and the outcome is discarded whenever the
//! generation has moved on — checked both inside the task and again by the
//! pipeline when it applies the outcome.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::form::state::ImageFile;

/// Default debounce window before a URL probe fires
pub const PROBE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Why a URL probe rejected the URL
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    /// The request could not be made or did not complete
    #[error("image request failed: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status
    #[error("image request returned status {0}")]
    Status(u16),

    /// The response is not an image
    #[error("response is not an image")]
    NotAnImage,

    /// The URL is not even well-formed; no request was attempted
    #[error("not a well-formed http(s) URL")]
    InvalidFormat,
}

/// Checks whether a URL serves a loadable image
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}

/// HTTP-backed probe: issues a GET and checks status plus `Content-Type`
pub struct HttpImageProbe {
    client: reqwest::Client,
}

impl HttpImageProbe {
    /// Create a probe with its own client and timeout
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProbeError::Status(response.status().as_u16()));
        }

        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("image/"))
            .unwrap_or(false);

        if is_image {
            Ok(())
        } else {
            Err(ProbeError::NotAnImage)
        }
    }
}

/// Probe wrapper running the cheap format check before the network one.
///
/// Both checks sit behind the debounce window: typing never triggers either,
/// and a mistyped URL fails fast without a request.
pub struct CheckedImageProbe {
    inner: Arc<dyn ImageProbe>,
}

impl CheckedImageProbe {
    pub fn new(inner: Arc<dyn ImageProbe>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ImageProbe for CheckedImageProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        if !crate::form::schema::is_valid_image_url(url) {
            return Err(ProbeError::InvalidFormat);
        }
        self.inner.probe(url).await
    }
}

/// Local preview handles for selected files.
///
/// Stands in for the browser notion of an object URL: creating a handle for
/// a file yields an opaque `blob:` string the preview panel can show, and
/// every created handle must be revoked once it is no longer displayed. The
/// pipeline revokes the previous handle before creating a new one and clears
/// the registry on teardown.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: HashMap<String, Arc<ImageFile>>,
}

impl ObjectUrlRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new preview handle for a file
    pub fn create(&mut self, file: &ImageFile) -> String {
        let url = format!("blob:{}", Uuid::new_v4());
        self.entries.insert(url.clone(), Arc::new(file.clone()));
        url
    }

    /// Release a handle. Returns whether it existed.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    /// Look up the file behind a handle
    pub fn resolve(&self, url: &str) -> Option<Arc<ImageFile>> {
        self.entries.get(url).cloned()
    }

    /// Release every outstanding handle
    pub fn revoke_all(&mut self) {
        self.entries.clear();
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handles are live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Completion of one scheduled probe
#[derive(Debug)]
pub struct ProbeOutcome {
    /// Generation the probe was scheduled under
    pub generation: u64,
    /// The URL that was probed
    pub url: String,
    /// Probe result
    pub result: Result<(), ProbeError>,
}

/// Debounced, generation-guarded URL validation.
///
/// `schedule` restarts the debounce window: the previous pending task is
/// aborted and the generation counter bumped, so at most one probe per
/// validator is ever relevant. Completions arrive on the receiver returned
/// by `new`; consumers must compare `ProbeOutcome::generation` against
/// `current_generation` before acting on one.
pub struct DebouncedUrlProbe {
    probe: Arc<dyn ImageProbe>,
    delay: Duration,
    generation: Arc<AtomicU64>,
    outcomes: mpsc::UnboundedSender<ProbeOutcome>,
    task: Option<JoinHandle<()>>,
}

impl DebouncedUrlProbe {
    /// Create a validator and the receiver its outcomes arrive on
    pub fn new(
        probe: Arc<dyn ImageProbe>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ProbeOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                probe,
                delay,
                generation: Arc::new(AtomicU64::new(0)),
                outcomes: tx,
                task: None,
            },
            rx,
        )
    }

    /// Schedule a probe of `url` after the debounce window, superseding any
    /// pending or in-flight probe.
    pub fn schedule(&mut self, url: String) {
        let generation = self.bump();
        let probe = Arc::clone(&self.probe);
        let counter = Arc::clone(&self.generation);
        let outcomes = self.outcomes.clone();
        let delay = self.delay;

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if counter.load(Ordering::SeqCst) != generation {
                return;
            }
            let result = probe.probe(&url).await;
            if counter.load(Ordering::SeqCst) != generation {
                return;
            }
            // Receiver may be gone during teardown; nothing to do then.
            let _ = outcomes.send(ProbeOutcome {
                generation,
                url,
                result,
            });
        }));
    }

    /// Generation of the most recently scheduled probe
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancel any pending or in-flight probe and invalidate queued outcomes
    pub fn cancel(&mut self) {
        self.bump();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn bump(&mut self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        generation
    }
}

impl Drop for DebouncedUrlProbe {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scripted probe shared by the form engine tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Per-URL verdicts and an optional delay before answering
    pub(crate) struct StubProbe {
        pub(crate) fail: Vec<String>,
        pub(crate) delay: Duration,
    }

    impl StubProbe {
        pub(crate) fn instant() -> Self {
            Self {
                fail: Vec::new(),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ImageProbe for StubProbe {
        async fn probe(&self, url: &str) -> Result<(), ProbeError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.iter().any(|bad| bad == url) {
                Err(ProbeError::NotAnImage)
            } else {
                Ok(())
            }
        }
    }
}
