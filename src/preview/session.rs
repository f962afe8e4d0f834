//! The lifecycle of a single open preview

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fetch::{ExternalOpener, FileFetcher};
use crate::material::MaterialFile;
use crate::preview::{classify, resolve_preview_url, FileKind};

/// How long a renderer may stay silent before the preview is declared dead
pub const PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);
/// The largest text file that will be fetched and inlined
pub const MAX_TEXT_PREVIEW_BYTES: u64 = 1024 * 1024;
/// How far a downward swipe must travel to dismiss a preview on touch devices
pub const MIN_SWIPE_DISTANCE: f64 = 50.0;

pub static TIMEOUT_MESSAGE: &str = "Preview timed out. Please try opening in a new tab.";

/// What the renderer needs to know about the file being previewed
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewFrame {
    /// The public URL of the file itself
    pub url: String,
    pub kind: FileKind,
    /// The title to display (the uploader's file name, or the last URL path segment)
    pub title: String,
    /// Where the renderer should actually point (may be a third-party viewer URL)
    pub resolved_url: String,
    /// Inlined content, for raw text previews only
    pub text: Option<String>,
}

/// The preview lifecycle, as one tagged state.
///
/// The original client tracked this with several independent booleans
/// (`isLoading`, `isPreviewOpen`, `previewError`), which allowed impossible
/// combinations such as "errored while still loading". A single enum rules them out.
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewState {
    /// No preview has been requested yet
    Idle,
    /// A preview request is being prepared (classification, probes, text fetch)
    Opening { frame: PreviewFrame },
    /// The renderer is working; a load or error signal (or the timeout) will decide
    Loading { frame: PreviewFrame },
    /// The preview is displayed
    Ready { frame: PreviewFrame },
    /// The preview failed; the message is meant for an inline error panel
    Errored { frame: PreviewFrame, message: String },
    /// The user dismissed the preview; all per-session data has been dropped
    Closed,
}

impl PreviewState {
    pub fn frame(&self) -> Option<&PreviewFrame> {
        match self {
            PreviewState::Idle | PreviewState::Closed => None,
            PreviewState::Opening { frame } => Some(frame),
            PreviewState::Loading { frame } => Some(frame),
            PreviewState::Ready { frame } => Some(frame),
            PreviewState::Errored { frame, .. } => Some(frame),
        }
    }

    pub fn is_loading(&self) -> bool {
        match self {
            PreviewState::Loading { .. } => true,
            _ => false,
        }
    }
}

/// Manages the asynchronous lifecycle of one preview at a time.
///
/// Opening a new preview implicitly discards any prior one. Late signals from a
/// discarded preview (a renderer callback or a timeout racing against it) are detected
/// by an epoch check and suppressed, so a stale result can never repaint a closed or
/// superseded preview.
pub struct PreviewSession<F: FileFetcher, O: ExternalOpener> {
    fetcher: F,
    opener: O,
    state: PreviewState,
    epoch: u64,
}

impl<F: FileFetcher, O: ExternalOpener> PreviewSession<F, O> {
    pub fn new(fetcher: F, opener: O) -> Self {
        Self {
            fetcher,
            opener,
            state: PreviewState::Idle,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &PreviewState { &self.state }

    /// The identifier of the currently active preview request. Signals carrying an
    /// older epoch are stale and will be ignored.
    pub fn epoch(&self) -> u64 { self.epoch }

    /// Open a preview for one file of a study material.
    ///
    /// This never fails from the caller's point of view: failures land either in
    /// [`PreviewState::Errored`] or in an external open of the original URL.
    pub async fn open(&mut self, file: &MaterialFile) {
        self.epoch += 1;

        let kind = classify(&file.url);
        let title = file.display_name();
        log::debug!("Preview requested for {} ({})", title, kind.as_str());

        let mut frame = PreviewFrame {
            url: file.url.clone(),
            kind,
            title,
            resolved_url: resolve_preview_url(&file.url, kind),
            text: None,
        };
        self.state = PreviewState::Opening { frame: frame.clone() };

        match kind {
            FileKind::Text => {
                if frame.resolved_url != frame.url {
                    // A CSV routed to the spreadsheet viewer: same path as office documents
                    self.state = PreviewState::Loading { frame };
                    return;
                }
                match self.fetcher.fetch_text(&file.url, MAX_TEXT_PREVIEW_BYTES).await {
                    Ok(text) => {
                        frame.text = Some(text);
                        self.state = PreviewState::Ready { frame };
                    },
                    Err(err) => {
                        log::warn!("Text preview of {} failed: {}", file.url, err);
                        self.opener.open_in_new_tab(&file.url);
                        self.state = PreviewState::Errored {
                            frame,
                            message: format!("Failed to load text content: {}", err),
                        };
                    },
                }
            },

            FileKind::Pdf => {
                // Make sure the PDF is reachable before committing to the embedded viewer
                match self.fetcher.probe(&file.url).await {
                    Ok(()) => {
                        self.state = PreviewState::Loading { frame };
                    },
                    Err(err) => {
                        log::warn!("PDF {} is not reachable ({}), opening it directly", file.url, err);
                        self.opener.open_in_new_tab(&file.url);
                        self.state = PreviewState::Closed;
                    },
                }
            },

            FileKind::Word | FileKind::Excel | FileKind::Powerpoint => {
                self.state = PreviewState::Loading { frame };
            },

            // The native renderer assumes load responsibility for media and unknown files
            FileKind::Image | FileKind::Video | FileKind::Audio | FileKind::Other => {
                self.state = PreviewState::Ready { frame };
            },
        }
    }

    /// To be called when the renderer reports successful completion (iframe or media
    /// load event)
    pub fn renderer_loaded(&mut self, epoch: u64) {
        if epoch != self.epoch {
            log::debug!("Ignoring a load signal for a stale preview (epoch {} != {})", epoch, self.epoch);
            return;
        }
        match std::mem::replace(&mut self.state, PreviewState::Idle) {
            PreviewState::Loading { frame } => self.state = PreviewState::Ready { frame },
            // Not in a loading state: the signal lost the race against the timeout (or
            // against another terminal signal), its effect is suppressed
            other => self.state = other,
        }
    }

    /// To be called when the renderer reports a failure
    pub fn renderer_failed(&mut self, epoch: u64, message: &str) {
        if epoch != self.epoch {
            log::debug!("Ignoring an error signal for a stale preview (epoch {} != {})", epoch, self.epoch);
            return;
        }
        match std::mem::replace(&mut self.state, PreviewState::Idle) {
            PreviewState::Loading { frame } => {
                log::warn!("Preview of {} failed: {}", frame.url, message);
                self.state = PreviewState::Errored { frame, message: message.to_string() };
            },
            other => self.state = other,
        }
    }

    /// To be called when [`PREVIEW_TIMEOUT`] elapsed without a renderer signal.
    /// Usually armed through [`spawn_timeout`](Self::spawn_timeout).
    pub fn timeout_elapsed(&mut self, epoch: u64) {
        if epoch != self.epoch {
            log::debug!("Ignoring a timeout for a stale preview (epoch {} != {})", epoch, self.epoch);
            return;
        }
        match std::mem::replace(&mut self.state, PreviewState::Idle) {
            PreviewState::Loading { frame } => {
                log::warn!("Preview of {} timed out", frame.url);
                self.state = PreviewState::Errored { frame, message: TIMEOUT_MESSAGE.to_string() };
            },
            other => self.state = other,
        }
    }

    /// Dismiss the preview (close control, backdrop click, or dismiss swipe).
    ///
    /// Every per-session field is dropped, so a subsequent [`open`](Self::open) starts
    /// from a blank slate; in-flight signals for the dismissed preview become stale.
    pub fn close(&mut self) {
        self.epoch += 1;
        self.state = PreviewState::Closed;
    }

    /// Arm the loading timeout for the currently active preview.
    ///
    /// Whichever of the timer and the renderer signal fires first wins; the loser is
    /// suppressed by the state and epoch checks in the signal handlers.
    pub fn spawn_timeout(session: &Arc<Mutex<Self>>) -> tokio::task::JoinHandle<()>
    where
        F: 'static,
        O: 'static,
    {
        let session = Arc::clone(session);
        let epoch = session.lock().unwrap().epoch;
        tokio::spawn(async move {
            tokio::time::sleep(PREVIEW_TIMEOUT).await;
            session.lock().unwrap().timeout_elapsed(epoch);
        })
    }
}

/// Tracks a vertical touch gesture over an open preview: a downward swipe longer than
/// [`MIN_SWIPE_DISTANCE`] dismisses it
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start_y: Option<f64>,
    current_y: Option<f64>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(&mut self, y: f64) {
        self.start_y = Some(y);
        self.current_y = None;
    }

    pub fn touch_move(&mut self, y: f64) {
        self.current_y = Some(y);
    }

    /// Ends the gesture. Returns whether it was a dismissing downward swipe
    pub fn touch_end(&mut self) -> bool {
        let dismissed = match (self.start_y, self.current_y) {
            (Some(start), Some(end)) => end - start > MIN_SWIPE_DISTANCE,
            _ => false,
        };
        self.start_y = None;
        self.current_y = None;
        dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swipe_down_dismisses() {
        let mut swipe = SwipeTracker::new();
        swipe.touch_start(100.0);
        swipe.touch_move(130.0);
        swipe.touch_move(180.0);
        assert!(swipe.touch_end());
    }

    #[test]
    fn short_or_upward_swipes_do_not_dismiss() {
        let mut swipe = SwipeTracker::new();
        swipe.touch_start(100.0);
        swipe.touch_move(140.0);
        assert_eq!(swipe.touch_end(), false);

        swipe.touch_start(200.0);
        swipe.touch_move(100.0);
        assert_eq!(swipe.touch_end(), false);

        // A tap without any move is not a swipe
        swipe.touch_start(100.0);
        assert_eq!(swipe.touch_end(), false);
    }
}
