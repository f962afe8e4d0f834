//! Study materials (course resources with attached files)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The category labels the admin UI offers for a study material.
///
/// Unknown labels coming from the record store deserialize as `Others` rather than
/// failing the whole record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MaterialCategory {
    Task,
    Presentation,
    Assignment,
    Quiz,
    #[serde(rename = "Lab Report")]
    LabReport,
    #[serde(rename = "Lab Final")]
    LabFinal,
    #[serde(rename = "Lab Performance")]
    LabPerformance,
    Documents,
    #[serde(rename = "BLC")]
    Blc,
    Groups,
    Midterm,
    #[serde(rename = "Final Exam")]
    FinalExam,
    Project,
    #[serde(rename = "Class Slide")]
    ClassSlide,
    Slide,
    #[serde(other)]
    Others,
}

/// One uploaded file attached to a study material.
///
/// The record store keeps two index-aligned arrays (`file_urls` and
/// `original_file_names`); this crate zips them into explicit pairs as soon as records
/// cross its boundary, so a length mismatch cannot silently shift file names around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialFile {
    pub url: String,
    pub original_file_name: Option<String>,
}

impl MaterialFile {
    /// The name to show for this file: the uploader's original file name when known,
    /// the last path segment of the URL otherwise
    pub fn display_name(&self) -> String {
        match &self.original_file_name {
            Some(name) => name.clone(),
            None => file_name_from_url(&self.url).to_string(),
        }
    }

    /// Zip the record store's parallel arrays into pairs.
    ///
    /// A missing name at some index is tolerated (the URL will provide a display name);
    /// a length mismatch is logged, since it means the record was corrupted upstream.
    pub fn zip_aligned(file_urls: Vec<String>, original_file_names: Vec<String>) -> Vec<MaterialFile> {
        if file_urls.len() != original_file_names.len() {
            log::warn!("Mismatched file arrays ({} URLs but {} names), falling back to URL-derived names",
                       file_urls.len(), original_file_names.len());
        }

        file_urls.into_iter()
            .enumerate()
            .map(|(index, url)| MaterialFile {
                url,
                original_file_name: original_file_names.get(index).cloned(),
            })
            .collect()
    }
}

/// Extract the last path segment of a URL, ignoring any query string or fragment
pub(crate) fn file_name_from_url(url: &str) -> &str {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(segment) => segment,
        None => path,
    }
}

/// A study material, as stored in the record store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterial {
    id: String,
    title: String,
    description: String,
    course_id: String,
    category: MaterialCategory,
    files: Vec<MaterialFile>,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl StudyMaterial {
    /// Create a StudyMaterial instance from data the record store returned
    pub fn new_with_parameters(id: String, new: NewStudyMaterial,
                               created_at: DateTime<Utc>, created_by: Option<String>) -> Self
    {
        Self {
            id,
            title: new.title,
            description: new.description,
            course_id: new.course_id,
            category: new.category,
            files: new.files,
            created_at,
            created_by,
        }
    }

    pub fn id(&self) -> &str          { &self.id          }
    pub fn title(&self) -> &str       { &self.title       }
    pub fn description(&self) -> &str { &self.description }
    pub fn course_id(&self) -> &str   { &self.course_id   }
    pub fn category(&self) -> MaterialCategory  { self.category }
    pub fn files(&self) -> &[MaterialFile]      { &self.files   }
    pub fn created_at(&self) -> &DateTime<Utc>  { &self.created_at }
    pub fn created_by(&self) -> Option<&str>    { self.created_by.as_deref() }
}

/// A study material that has not been stored yet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewStudyMaterial {
    pub title: String,
    pub description: String,
    pub course_id: String,
    pub category: MaterialCategory,
    pub files: Vec<MaterialFile>,
}
