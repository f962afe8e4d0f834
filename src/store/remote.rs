//! This module provides a client to connect to the hosted record store
//!
//! The service speaks a PostgREST-style REST dialect: one endpoint per table under
//! `/rest/v1/`, filters passed as query parameters (`id=eq.<id>`), and mutated rows
//! echoed back when asked for with `Prefer: return=representation`.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::course::{format_class_times, parse_class_times, Course, NewCourse};
use crate::material::{MaterialCategory, MaterialFile, NewStudyMaterial, StudyMaterial};
use crate::store::EntityStore;
use crate::task::{NewTask, Task};

/// How many times a failed transport attempt is retried
const MAX_RETRIES: u32 = 3;

/// A record store backed by the hosted REST service
pub struct RemoteStore {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl RemoteStore {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString>(base_url: S, api_key: T) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url.as_ref())?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, Box<dyn Error>> {
        let url = self.base_url.join(&format!("rest/v1/{}", table))?;
        Ok(url)
    }

    /// Send a request, retrying transport-level failures with an exponential backoff
    /// (1 s, 2 s, 4 s). HTTP error statuses are not retried: the server did answer.
    async fn send_with_retry(&self, method: Method, url: Url, body: Option<serde_json::Value>,
                             return_representation: bool) -> Result<reqwest::Response, Box<dyn Error>>
    {
        let mut attempt = 0;
        loop {
            let mut request = self.http
                .request(method.clone(), url.clone())
                .header("apikey", &self.api_key)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("X-Client-Info", crate::config::client_info());
            if return_representation {
                request = request.header("Prefer", "return=representation");
            }
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(serde_json::to_string(body)?);
            }

            match request.send().await {
                Ok(response) => {
                    if response.status().is_success() == false {
                        return Err(format!("Unexpected HTTP status code {:?}", response.status()).into());
                    }
                    return Ok(response);
                },
                Err(err) => {
                    if attempt >= MAX_RETRIES {
                        return Err(err.into());
                    }
                    let backoff = Duration::from_secs(1 << attempt);
                    log::warn!("Request to {} failed ({}), retrying in {:?}", url, err, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                },
            }
        }
    }

    async fn list_rows<Row: DeserializeOwned>(&self, table: &str) -> Result<Vec<Row>, Box<dyn Error>> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self.send_with_retry(Method::GET, url, None, false).await?;
        let rows = response.json().await?;
        Ok(rows)
    }

    async fn insert_row<Row, P>(&self, table: &str, payload: &P) -> Result<Row, Box<dyn Error>>
    where
        Row: DeserializeOwned,
        P: Serialize,
    {
        let url = self.table_url(table)?;
        let body = serde_json::to_value(payload)?;

        let response = self.send_with_retry(Method::POST, url, Some(body), true).await?;
        // With return=representation, the mutated rows come back as an array
        let mut rows: Vec<Row> = response.json().await?;
        match rows.pop() {
            Some(row) => Ok(row),
            None => Err(format!("The record store did not return the created {} row", table).into()),
        }
    }

    async fn update_row<Row, P>(&self, table: &str, id: &str, payload: &P) -> Result<Row, Box<dyn Error>>
    where
        Row: DeserializeOwned,
        P: Serialize,
    {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        let body = serde_json::to_value(payload)?;

        let response = self.send_with_retry(Method::PATCH, url, Some(body), true).await?;
        let mut rows: Vec<Row> = response.json().await?;
        match rows.pop() {
            Some(row) => Ok(row),
            None => Err(format!("No {} row matches id {}", table, id).into()),
        }
    }

    async fn delete_row(&self, table: &str, id: &str) -> Result<(), Box<dyn Error>> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        self.send_with_retry(Method::DELETE, url, None, false).await?;
        Ok(())
    }
}

/// A `courses` row, as the record store returns it.
///
/// Class times are persisted as a single joined string; this is where they are parsed
/// back into structured [`ClassTime`](crate::ClassTime)s.
#[derive(Debug, Serialize, Deserialize)]
struct CourseRow {
    id: String,
    name: String,
    code: String,
    teacher: String,
    class_time: String,
    telegram_group: Option<String>,
    blc_link: Option<String>,
    blc_enroll_key: Option<String>,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Course {
        let new = NewCourse {
            name: row.name,
            code: row.code,
            teacher: row.teacher,
            class_times: parse_class_times(&row.class_time),
            telegram_group: row.telegram_group,
            blc_link: row.blc_link,
            blc_enroll_key: row.blc_enroll_key,
        };
        Course::new_with_parameters(row.id, new, row.created_at, row.created_by)
    }
}

#[derive(Debug, Serialize)]
struct CoursePayload<'a> {
    name: &'a str,
    code: &'a str,
    teacher: &'a str,
    class_time: String,
    telegram_group: Option<&'a str>,
    blc_link: Option<&'a str>,
    blc_enroll_key: Option<&'a str>,
}

impl<'a> From<&'a NewCourse> for CoursePayload<'a> {
    fn from(new: &'a NewCourse) -> Self {
        Self {
            name: &new.name,
            code: &new.code,
            teacher: &new.teacher,
            class_time: format_class_times(&new.class_times),
            telegram_group: new.telegram_group.as_deref(),
            blc_link: new.blc_link.as_deref(),
            blc_enroll_key: new.blc_enroll_key.as_deref(),
        }
    }
}

#[async_trait]
impl EntityStore<Course> for RemoteStore {
    async fn list(&self) -> Result<Vec<Course>, Box<dyn Error>> {
        let rows: Vec<CourseRow> = self.list_rows("courses").await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn create(&self, new: &NewCourse) -> Result<Course, Box<dyn Error>> {
        let row: CourseRow = self.insert_row("courses", &CoursePayload::from(new)).await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, new: &NewCourse) -> Result<Course, Box<dyn Error>> {
        let row: CourseRow = self.update_row("courses", id, &CoursePayload::from(new)).await?;
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>> {
        self.delete_row("courses", id).await
    }
}

/// A `tasks` row. Its shape matches [`NewTask`] plus the store-assigned fields, so the
/// creation payload serializes as-is.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRow {
    id: String,
    name: String,
    description: String,
    category: String,
    due_date: DateTime<Utc>,
    status: crate::task::TaskStatus,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Task {
        let new = NewTask {
            name: row.name,
            description: row.description,
            category: row.category,
            due_date: row.due_date,
            status: row.status,
        };
        Task::new_with_parameters(row.id, new, row.created_at, row.created_by)
    }
}

#[async_trait]
impl EntityStore<Task> for RemoteStore {
    async fn list(&self) -> Result<Vec<Task>, Box<dyn Error>> {
        let rows: Vec<TaskRow> = self.list_rows("tasks").await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn create(&self, new: &NewTask) -> Result<Task, Box<dyn Error>> {
        let row: TaskRow = self.insert_row("tasks", new).await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, new: &NewTask) -> Result<Task, Box<dyn Error>> {
        let row: TaskRow = self.update_row("tasks", id, new).await?;
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>> {
        self.delete_row("tasks", id).await
    }
}

/// A `study_materials` row.
///
/// The store keeps two index-aligned arrays for the attached files; they are zipped
/// into [`MaterialFile`] pairs here, with a per-index fallback in case the arrays got
/// out of sync upstream.
#[derive(Debug, Serialize, Deserialize)]
struct MaterialRow {
    id: String,
    title: String,
    description: String,
    course_id: String,
    category: MaterialCategory,
    #[serde(default)]
    file_urls: Vec<String>,
    #[serde(default)]
    original_file_names: Vec<String>,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl From<MaterialRow> for StudyMaterial {
    fn from(row: MaterialRow) -> StudyMaterial {
        let new = NewStudyMaterial {
            title: row.title,
            description: row.description,
            course_id: row.course_id,
            category: row.category,
            files: MaterialFile::zip_aligned(row.file_urls, row.original_file_names),
        };
        StudyMaterial::new_with_parameters(row.id, new, row.created_at, row.created_by)
    }
}

#[derive(Debug, Serialize)]
struct MaterialPayload<'a> {
    title: &'a str,
    description: &'a str,
    course_id: &'a str,
    category: MaterialCategory,
    file_urls: Vec<&'a str>,
    original_file_names: Vec<String>,
}

impl<'a> From<&'a NewStudyMaterial> for MaterialPayload<'a> {
    fn from(new: &'a NewStudyMaterial) -> Self {
        Self {
            title: &new.title,
            description: &new.description,
            course_id: &new.course_id,
            category: new.category,
            file_urls: new.files.iter().map(|f| f.url.as_str()).collect(),
            // Always write one name per URL so the arrays stay aligned
            original_file_names: new.files.iter().map(|f| f.display_name()).collect(),
        }
    }
}

#[async_trait]
impl EntityStore<StudyMaterial> for RemoteStore {
    async fn list(&self) -> Result<Vec<StudyMaterial>, Box<dyn Error>> {
        let rows: Vec<MaterialRow> = self.list_rows("study_materials").await?;
        Ok(rows.into_iter().map(StudyMaterial::from).collect())
    }

    async fn create(&self, new: &NewStudyMaterial) -> Result<StudyMaterial, Box<dyn Error>> {
        let row: MaterialRow = self.insert_row("study_materials", &MaterialPayload::from(new)).await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, new: &NewStudyMaterial) -> Result<StudyMaterial, Box<dyn Error>> {
        let row: MaterialRow = self.update_row("study_materials", id, &MaterialPayload::from(new)).await?;
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>> {
        self.delete_row("study_materials", id).await
    }
}
