//! This crate provides a way to manage student courses, tasks and study materials.
//!
//! The data itself lives in a hosted record store (a PostgREST-style REST API) and in a
//! file storage service. Both are abstracted behind traits, so that they can be swapped
//! for in-memory implementations in tests: see the [`store`] and [`storage`] modules.
//!
//! The most involved part of this crate is the [`preview`] module. \
//! Given the public URL of an uploaded file, it classifies it by extension, decides
//! whether it can be rendered natively, proxied through a third-party document viewer,
//! or fetched and inlined as raw text, and manages the asynchronous lifecycle of a
//! single preview (loading, load/error signals, timeout, dismissal). \
//! It also provides a download helper that degrades to opening the remote URL directly
//! when a local save is not possible.
//!
//! The [`roster`] module merges the record store and the realtime [`feed`] into one
//! convenient, cached view of the current courses and materials.

pub mod config;
pub mod settings;

mod course;
pub use course::{format_class_times, parse_class_times, ClassTime, Course, NewCourse};
mod task;
pub use task::{sort_for_display, NewTask, Task, TaskStatus};
mod material;
pub use material::{MaterialCategory, MaterialFile, NewStudyMaterial, StudyMaterial};

pub mod calendar;
pub mod preview;
pub use preview::FileKind;

pub mod fetch;
pub mod store;
pub mod storage;
pub mod feed;
pub mod roster;
pub use roster::Roster;

pub mod mock_behaviour;
