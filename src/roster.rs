//! A cached view of the current courses and their study materials
//!
//! [`Roster`] wraps an [`EntityStore`] and keeps the last fetched snapshot of both
//! tables, so views can render synchronously and only hit the store on an explicit
//! refresh or when the realtime feed reports a change.

use std::error::Error;

use crate::course::{Course, NewCourse};
use crate::feed::{ChangeEvent, FeedReceiver};
use crate::material::{NewStudyMaterial, StudyMaterial};
use crate::store::{EntityStore, Record};

/// The cached courses-and-materials view.
///
/// The store is injected, never reached through a global, so a roster over a
/// [`MemoryStore`](crate::store::MemoryStore) behaves exactly like one over the hosted
/// service.
pub struct Roster<S>
where
    S: EntityStore<Course> + EntityStore<StudyMaterial>,
{
    store: S,
    courses: Vec<Course>,
    materials: Vec<StudyMaterial>,
}

impl<S> Roster<S>
where
    S: EntityStore<Course> + EntityStore<StudyMaterial>,
{
    /// Create an empty roster. Nothing is fetched until the first refresh
    pub fn new(store: S) -> Self {
        Self {
            store,
            courses: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// The courses from the last refresh, most recently created first
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// The study materials from the last refresh, most recently created first
    pub fn materials(&self) -> &[StudyMaterial] {
        &self.materials
    }

    pub async fn refresh_courses(&mut self) -> Result<(), Box<dyn Error>> {
        self.courses = EntityStore::<Course>::list(&self.store).await?;
        log::debug!("Refreshed {} courses", self.courses.len());
        Ok(())
    }

    pub async fn refresh_materials(&mut self) -> Result<(), Box<dyn Error>> {
        self.materials = EntityStore::<StudyMaterial>::list(&self.store).await?;
        log::debug!("Refreshed {} study materials", self.materials.len());
        Ok(())
    }

    pub async fn refresh_all(&mut self) -> Result<(), Box<dyn Error>> {
        self.refresh_courses().await?;
        self.refresh_materials().await?;
        Ok(())
    }

    /// Create a course, then refresh the cached course list
    pub async fn create_course(&mut self, new: &NewCourse) -> Result<Course, Box<dyn Error>> {
        let created = EntityStore::<Course>::create(&self.store, new).await?;
        self.refresh_courses().await?;
        Ok(created)
    }

    pub async fn update_course(&mut self, id: &str, new: &NewCourse) -> Result<Course, Box<dyn Error>> {
        let updated = EntityStore::<Course>::update(&self.store, id, new).await?;
        self.refresh_courses().await?;
        Ok(updated)
    }

    pub async fn delete_course(&mut self, id: &str) -> Result<(), Box<dyn Error>> {
        EntityStore::<Course>::delete(&self.store, id).await?;
        self.refresh_courses().await?;
        Ok(())
    }

    /// Create a study material, then refresh the cached material list
    pub async fn create_material(&mut self, new: &NewStudyMaterial) -> Result<StudyMaterial, Box<dyn Error>> {
        let created = EntityStore::<StudyMaterial>::create(&self.store, new).await?;
        self.refresh_materials().await?;
        Ok(created)
    }

    pub async fn update_material(&mut self, id: &str, new: &NewStudyMaterial) -> Result<StudyMaterial, Box<dyn Error>> {
        let updated = EntityStore::<StudyMaterial>::update(&self.store, id, new).await?;
        self.refresh_materials().await?;
        Ok(updated)
    }

    pub async fn delete_material(&mut self, id: &str) -> Result<(), Box<dyn Error>> {
        EntityStore::<StudyMaterial>::delete(&self.store, id).await?;
        self.refresh_materials().await?;
        Ok(())
    }

    /// React to one realtime change notification by refreshing the affected table.
    ///
    /// Events about tables this roster does not cache are ignored.
    pub async fn apply_change(&mut self, event: &ChangeEvent) -> Result<(), Box<dyn Error>> {
        if event.table == <Course as Record>::TABLE {
            self.refresh_courses().await
        } else if event.table == <StudyMaterial as Record>::TABLE {
            self.refresh_materials().await
        } else {
            log::debug!("Ignoring change event about an uncached table ({})", event);
            Ok(())
        }
    }

    /// Drain every change notification currently queued on `receiver` and refresh each
    /// affected table at most once
    pub async fn apply_pending(&mut self, receiver: &mut FeedReceiver) -> Result<(), Box<dyn Error>> {
        let mut courses_changed = false;
        let mut materials_changed = false;

        while let Ok(event) = receiver.try_recv() {
            if event.table == <Course as Record>::TABLE {
                courses_changed = true;
            } else if event.table == <StudyMaterial as Record>::TABLE {
                materials_changed = true;
            }
        }

        if courses_changed {
            self.refresh_courses().await?;
        }
        if materials_changed {
            self.refresh_materials().await?;
        }
        Ok(())
    }

    /// How many cached study materials belong to this course
    pub fn material_count_for(&self, course_id: &str) -> usize {
        self.materials.iter()
            .filter(|material| material.course_id() == course_id)
            .count()
    }

    pub fn materials_for_course(&self, course_id: &str) -> Vec<&StudyMaterial> {
        self.materials.iter()
            .filter(|material| material.course_id() == course_id)
            .collect()
    }
}
