//! File previews
//!
//! This module turns the public URL of an uploaded file into something that can be
//! shown in-app: it classifies the file by extension ([`classify`]), picks the right
//! rendering strategy ([`resolve_preview_url`]), and drives the asynchronous lifecycle
//! of one open preview ([`session::PreviewSession`]). \
//! It also provides a best-effort download helper in the [`download`] module.

pub mod session;
pub use session::{PreviewSession, PreviewState, SwipeTracker};
pub mod download;

use url::Url;

static GOOGLE_VIEWER: &str = "https://docs.google.com/viewer";
static OFFICE_VIEWER: &str = "https://view.officeapps.live.com/op/embed.aspx";

static WORD_EXTENSIONS:       &[&str] = &["doc", "docx", "rtf"];
static EXCEL_EXTENSIONS:      &[&str] = &["xls", "xlsx", "csv"];
static POWERPOINT_EXTENSIONS: &[&str] = &["ppt", "pptx"];
static PDF_EXTENSIONS:        &[&str] = &["pdf"];
static TEXT_EXTENSIONS:       &[&str] = &["txt", "md", "json", "log", "xml", "csv", "html"];
static IMAGE_EXTENSIONS:      &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];
static VIDEO_EXTENSIONS:      &[&str] = &["mp4", "webm", "ogg", "mov", "avi", "m4v"];
static AUDIO_EXTENSIONS:      &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "flac"];

/// The semantic type of a file, as derived from its extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Word,
    Excel,
    Powerpoint,
    Pdf,
    Text,
    Image,
    Video,
    Audio,
    Other,
}

impl FileKind {
    /// A short label suited for display next to a file name
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Word => "word",
            FileKind::Excel => "excel",
            FileKind::Powerpoint => "powerpoint",
            FileKind::Pdf => "pdf",
            FileKind::Text => "text",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Other => "other",
        }
    }
}

/// Classify a file by the extension of the last segment of its URL path.
///
/// Some extensions belong to several sets (`csv` is both a spreadsheet and plain text,
/// `ogg` is both a video and an audio container); the first matching set in the order
/// below wins. A missing or unknown extension yields [`FileKind::Other`].
pub fn classify(url: &str) -> FileKind {
    let extension = match extension_of(url) {
        Some(ext) => ext,
        None => return FileKind::Other,
    };
    let extension = extension.as_str();

    if WORD_EXTENSIONS.contains(&extension)       { return FileKind::Word;       }
    if EXCEL_EXTENSIONS.contains(&extension)      { return FileKind::Excel;      }
    if POWERPOINT_EXTENSIONS.contains(&extension) { return FileKind::Powerpoint; }
    if PDF_EXTENSIONS.contains(&extension)        { return FileKind::Pdf;        }
    if TEXT_EXTENSIONS.contains(&extension)       { return FileKind::Text;       }
    if IMAGE_EXTENSIONS.contains(&extension)      { return FileKind::Image;      }
    if VIDEO_EXTENSIONS.contains(&extension)      { return FileKind::Video;      }
    if AUDIO_EXTENSIONS.contains(&extension)      { return FileKind::Audio;      }

    FileKind::Other
}

/// The lower-cased extension of the last path segment, if it has one
fn extension_of(url: &str) -> Option<String> {
    let segment = crate::material::file_name_from_url(url);
    match segment.rfind('.') {
        None => None,
        Some(pos) if pos + 1 == segment.len() => None,
        Some(pos) => Some(segment[pos + 1..].to_lowercase()),
    }
}

/// Decide how a file of the given kind should be rendered.
///
/// * documents are proxied through a third-party embedded viewer (Google Docs viewer
///   for PDFs, the Office embed endpoint for Word/Excel/PowerPoint and for CSVs that
///   were classified as text),
/// * everything else is returned unchanged: plain text is meant to be fetched and
///   inlined by the caller, media files are rendered natively.
///
/// URL construction failures are not propagated: the original URL is returned
/// unchanged so that the caller can still open the file directly.
pub fn resolve_preview_url(url: &str, kind: FileKind) -> String {
    match kind {
        FileKind::Pdf =>
            viewer_url(GOOGLE_VIEWER, &[("url", url), ("embedded", "true")])
                .unwrap_or_else(|err| degrade(url, err)),
        FileKind::Word | FileKind::Excel | FileKind::Powerpoint =>
            viewer_url(OFFICE_VIEWER, &[("src", url)])
                .unwrap_or_else(|err| degrade(url, err)),
        FileKind::Text if url.to_lowercase().ends_with(".csv") =>
            // CSVs are better rendered as a spreadsheet than as raw text
            viewer_url(OFFICE_VIEWER, &[("src", url)])
                .unwrap_or_else(|err| degrade(url, err)),
        _ => url.to_string(),
    }
}

fn viewer_url(endpoint: &str, params: &[(&str, &str)]) -> Result<String, url::ParseError> {
    Ok(Url::parse_with_params(endpoint, params)?.to_string())
}

fn degrade(url: &str, err: url::ParseError) -> String {
    log::warn!("Unable to build a preview URL for {}: {}. Using the original URL", url, err);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(classify("https://cdn.example.org/report.docx"), FileKind::Word);
        assert_eq!(classify("https://cdn.example.org/notes.RTF"),   FileKind::Word);
        assert_eq!(classify("https://cdn.example.org/grades.xlsx"), FileKind::Excel);
        assert_eq!(classify("https://cdn.example.org/slides.pptx"), FileKind::Powerpoint);
        assert_eq!(classify("https://cdn.example.org/paper.pdf"),   FileKind::Pdf);
        assert_eq!(classify("https://cdn.example.org/readme.md"),   FileKind::Text);
        assert_eq!(classify("https://cdn.example.org/photo.jpeg"),  FileKind::Image);
        assert_eq!(classify("https://cdn.example.org/lecture.mp4"), FileKind::Video);
        assert_eq!(classify("https://cdn.example.org/note.flac"),   FileKind::Audio);
    }

    #[test]
    fn classification_tie_breaks() {
        // csv belongs to both the excel and the text sets: excel wins
        assert_eq!(classify("report.csv"), FileKind::Excel);
        // ogg belongs to both the video and the audio sets: video wins
        assert_eq!(classify("clip.ogg"), FileKind::Video);
    }

    #[test]
    fn unknown_extensions() {
        assert_eq!(classify("x"), FileKind::Other);
        assert_eq!(classify("noext"), FileKind::Other);
        assert_eq!(classify(""), FileKind::Other);
        assert_eq!(classify("https://cdn.example.org/archive.xyz"), FileKind::Other);
        assert_eq!(classify("https://cdn.example.org/trailing."), FileKind::Other);
    }

    #[test]
    fn query_strings_do_not_confuse_the_classifier() {
        assert_eq!(classify("https://cdn.example.org/paper.pdf?token=ab.cd"), FileKind::Pdf);
    }

    #[test]
    fn resolver_routes_documents_through_viewers() {
        let url = "https://cdn.example.org/a.pdf";
        let resolved = resolve_preview_url(url, FileKind::Pdf);
        assert!(resolved.starts_with("https://docs.google.com/viewer?"));
        // The original URL must appear percent-encoded in the query string
        assert!(resolved.contains("https%3A%2F%2Fcdn.example.org%2Fa.pdf"));
        assert!(resolved.contains("embedded=true"));

        let resolved = resolve_preview_url("https://cdn.example.org/b.docx", FileKind::Word);
        assert!(resolved.starts_with("https://view.officeapps.live.com/op/embed.aspx?src="));
        assert!(resolved.contains("https%3A%2F%2Fcdn.example.org%2Fb.docx"));
    }

    #[test]
    fn resolver_routes_csv_text_to_the_office_viewer() {
        // A caller may hand us a CSV with a Text classification: it should still be
        // rendered as a spreadsheet, not raw-fetched
        let resolved = resolve_preview_url("https://cdn.example.org/data.csv", FileKind::Text);
        assert!(resolved.starts_with("https://view.officeapps.live.com/op/embed.aspx?src="));
    }

    #[test]
    fn resolver_is_identity_for_native_kinds() {
        let url = "https://cdn.example.org/photo.png";
        assert_eq!(resolve_preview_url(url, FileKind::Image), url);
        assert_eq!(resolve_preview_url(url, FileKind::Video), url);
        assert_eq!(resolve_preview_url(url, FileKind::Audio), url);
        assert_eq!(resolve_preview_url(url, FileKind::Other), url);
        assert_eq!(resolve_preview_url("https://cdn.example.org/notes.txt", FileKind::Text),
                   "https://cdn.example.org/notes.txt");
    }
}
