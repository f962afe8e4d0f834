//! An in-process record store
//!
//! [`MemoryStore`] implements the same [`EntityStore`] operations as the hosted
//! service, keeping everything in hash maps. It assigns ids and creation times the way
//! the server would, and emits a [`ChangeEvent`] on every mutation, so code written
//! against the real store (including its realtime feed) runs unchanged in tests.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::course::Course;
use crate::feed::{ChangeEvent, ChangeKind, FeedSender};
use crate::material::StudyMaterial;
use crate::store::{EntityStore, Record};
use crate::task::Task;

#[cfg(feature = "local_store_mocks_remote_store")]
use std::sync::Arc;
#[cfg(feature = "local_store_mocks_remote_store")]
use crate::mock_behaviour::MockBehaviour;

/// A record store that lives in memory
pub struct MemoryStore {
    courses: Mutex<HashMap<String, Course>>,
    tasks: Mutex<HashMap<String, Task>>,
    materials: Mutex<HashMap<String, StudyMaterial>>,
    feed: Mutex<Option<FeedSender>>,

    #[cfg(feature = "local_store_mocks_remote_store")]
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            courses: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            materials: Mutex::new(HashMap::new()),
            feed: Mutex::new(None),

            #[cfg(feature = "local_store_mocks_remote_store")]
            mock_behaviour: None,
        }
    }

    #[cfg(feature = "local_store_mocks_remote_store")]
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Attach the emitting end of a change feed. Every subsequent mutation sends one
    /// event on it, mirroring the realtime channel of the hosted store
    pub fn attach_feed(&self, sender: FeedSender) {
        *self.feed.lock().unwrap() = Some(sender);
    }

    fn notify(&self, table: &'static str, kind: ChangeKind) {
        if let Some(sender) = &*self.feed.lock().unwrap() {
            let event = ChangeEvent::new(table, kind);
            if sender.send(event.clone()).is_err() {
                log::debug!("No subscriber left for change event ({})", event);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_memory_store {
    ($entity:ty, $table:ident) => {
        #[async_trait]
        impl EntityStore<$entity> for MemoryStore {
            async fn list(&self) -> Result<Vec<$entity>, Box<dyn Error>> {
                #[cfg(feature = "local_store_mocks_remote_store")]
                self.mock_behaviour.as_ref().map_or(Ok(()), |b| b.lock().unwrap().can_list())?;

                let mut all: Vec<$entity> = self.$table.lock().unwrap().values().cloned().collect();
                // Same order as the hosted store: most recently created first
                all.sort_by(|a, b| b.created_at().cmp(a.created_at()));
                Ok(all)
            }

            async fn create(&self, new: &<$entity as Record>::New) -> Result<$entity, Box<dyn Error>> {
                #[cfg(feature = "local_store_mocks_remote_store")]
                self.mock_behaviour.as_ref().map_or(Ok(()), |b| b.lock().unwrap().can_create())?;

                let id = uuid::Uuid::new_v4().to_hyphenated().to_string();
                let entity = <$entity as Record>::from_new(id.clone(), new.clone(), Utc::now(), None);
                self.$table.lock().unwrap().insert(id, entity.clone());
                self.notify(<$entity as Record>::TABLE, ChangeKind::Insert);
                Ok(entity)
            }

            async fn update(&self, id: &str, new: &<$entity as Record>::New) -> Result<$entity, Box<dyn Error>> {
                #[cfg(feature = "local_store_mocks_remote_store")]
                self.mock_behaviour.as_ref().map_or(Ok(()), |b| b.lock().unwrap().can_update())?;

                let updated = {
                    let mut rows = self.$table.lock().unwrap();
                    match rows.get(id) {
                        None => return Err(format!("No {} row matches id {}", <$entity as Record>::TABLE, id).into()),
                        Some(existing) => {
                            // Store-assigned fields survive an update
                            let updated = <$entity as Record>::from_new(
                                id.to_string(), new.clone(),
                                existing.created_at().clone(),
                                existing.created_by().map(|who| who.to_string()),
                            );
                            rows.insert(id.to_string(), updated.clone());
                            updated
                        },
                    }
                };
                self.notify(<$entity as Record>::TABLE, ChangeKind::Update);
                Ok(updated)
            }

            async fn delete(&self, id: &str) -> Result<(), Box<dyn Error>> {
                #[cfg(feature = "local_store_mocks_remote_store")]
                self.mock_behaviour.as_ref().map_or(Ok(()), |b| b.lock().unwrap().can_delete())?;

                match self.$table.lock().unwrap().remove(id) {
                    None => Err(format!("No {} row matches id {}", <$entity as Record>::TABLE, id).into()),
                    Some(_) => {
                        self.notify(<$entity as Record>::TABLE, ChangeKind::Delete);
                        Ok(())
                    },
                }
            }
        }
    };
}

impl_memory_store!(Course, courses);
impl_memory_store!(Task, tasks);
impl_memory_store!(StudyMaterial, materials);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::NewCourse;
    use crate::feed::change_channel;

    fn new_course(name: &str) -> NewCourse {
        NewCourse {
            name: name.to_string(),
            code: "CS101".to_string(),
            teacher: "Dr. Doe".to_string(),
            class_times: Vec::new(),
            telegram_group: None,
            blc_link: None,
            blc_enroll_key: None,
        }
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryStore::new();

        let created: Course = store.create(&new_course("Algorithms")).await.unwrap();
        assert_eq!(created.name(), "Algorithms");

        let mut renamed = new_course("Advanced Algorithms");
        renamed.code = "CS201".to_string();
        let updated = EntityStore::<Course>::update(&store, created.id(), &renamed).await.unwrap();
        assert_eq!(updated.name(), "Advanced Algorithms");
        assert_eq!(updated.created_at(), created.created_at());

        let all: Vec<Course> = store.list().await.unwrap();
        assert_eq!(all.len(), 1);

        EntityStore::<Course>::delete(&store, created.id()).await.unwrap();
        let all: Vec<Course> = store.list().await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_errors() {
        let store = MemoryStore::new();
        assert!(EntityStore::<Course>::update(&store, "nope", &new_course("x")).await.is_err());
        assert!(EntityStore::<Course>::delete(&store, "nope").await.is_err());
    }

    #[tokio::test]
    async fn mutations_feed_the_channel() {
        let store = MemoryStore::new();
        let (sender, mut receiver) = change_channel();
        store.attach_feed(sender);

        let created: Course = store.create(&new_course("Databases")).await.unwrap();
        EntityStore::<Course>::delete(&store, created.id()).await.unwrap();

        let first = receiver.recv().await.unwrap();
        assert_eq!((first.table, first.kind), ("courses", ChangeKind::Insert));
        let second = receiver.recv().await.unwrap();
        assert_eq!((second.table, second.kind), ("courses", ChangeKind::Delete));
    }
}
