//! Abstractions over the record store
//!
//! The backing service exposes one table per entity, with the same four operations on
//! each. The [`EntityStore`] trait captures those operations; [`RemoteStore`] talks to
//! the actual hosted service, while [`MemoryStore`] keeps everything in-process and is
//! what tests (and offline tooling) inject instead.
//!
//! The store is always passed as an explicit dependency. There is deliberately no
//! process-wide store singleton in this crate.

pub mod remote;
pub use remote::RemoteStore;
pub mod memory;
pub use memory::MemoryStore;

use std::error::Error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::course::{Course, NewCourse};
use crate::material::{NewStudyMaterial, StudyMaterial};
use crate::task::{NewTask, Task};

/// An entity that lives in one of the record store's tables
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned {
    /// The payload used to create (or fully update) such an entity
    type New: Clone + Send + Sync + Serialize;

    /// The table this entity lives in
    const TABLE: &'static str;

    fn id(&self) -> &str;

    /// Build the entity out of its creation payload and the fields the record store
    /// assigns (id, creation time, author)
    fn from_new(id: String, new: Self::New, created_at: DateTime<Utc>, created_by: Option<String>) -> Self;
}

impl Record for Course {
    type New = NewCourse;
    const TABLE: &'static str = "courses";

    fn id(&self) -> &str { self.id() }
    fn from_new(id: String, new: NewCourse, created_at: DateTime<Utc>, created_by: Option<String>) -> Self {
        Course::new_with_parameters(id, new, created_at, created_by)
    }
}

impl Record for Task {
    type New = NewTask;
    const TABLE: &'static str = "tasks";

    fn id(&self) -> &str { self.id() }
    fn from_new(id: String, new: NewTask, created_at: DateTime<Utc>, created_by: Option<String>) -> Self {
        Task::new_with_parameters(id, new, created_at, created_by)
    }
}

impl Record for StudyMaterial {
    type New = NewStudyMaterial;
    const TABLE: &'static str = "study_materials";

    fn id(&self) -> &str { self.id() }
    fn from_new(id: String, new: NewStudyMaterial, created_at: DateTime<Utc>, created_by: Option<String>) -> Self {
        StudyMaterial::new_with_parameters(id, new, created_at, created_by)
    }
}

/// The four operations the record store offers on every table.
///
/// `list` returns entities ordered by creation time, most recent first (this is what
/// every view of this data displays).
#[async_trait]
pub trait EntityStore<R: Record> {
    async fn list(&self) -> Result<Vec<R>, Box<dyn Error>>;
    async fn create(&self, new: &R::New) -> Result<R, Box<dyn Error>>;
    async fn update(&self, id: &str, new: &R::New) -> Result<R, Box<dyn Error>>;
    async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>>;
}

// A shared store is still a store. This lets callers keep a handle on a store they
// also hand to a Roster
#[async_trait]
impl<R, S> EntityStore<R> for std::sync::Arc<S>
where
    R: Record + 'static,
    S: EntityStore<R> + Send + Sync,
{
    async fn list(&self) -> Result<Vec<R>, Box<dyn Error>> {
        (**self).list().await
    }
    async fn create(&self, new: &R::New) -> Result<R, Box<dyn Error>> {
        (**self).create(new).await
    }
    async fn update(&self, id: &str, new: &R::New) -> Result<R, Box<dyn Error>> {
        (**self).update(id, new).await
    }
    async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>> {
        (**self).delete(id).await
    }
}
