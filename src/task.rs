//! Student to-do tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a task still needs work.
///
/// "Overdue" is deliberately not a status: it is derived from the due date at display
/// time, so a task cannot be both completed and overdue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        match self {
            TaskStatus::Completed => true,
            _ => false,
        }
    }
}

/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    name: String,
    description: String,
    category: String,
    due_date: DateTime<Utc>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl Task {
    /// Create a Task instance from data the record store returned
    pub fn new_with_parameters(id: String, new: NewTask,
                               created_at: DateTime<Utc>, created_by: Option<String>) -> Self
    {
        Self {
            id,
            name: new.name,
            description: new.description,
            category: new.category,
            due_date: new.due_date,
            status: new.status,
            created_at,
            created_by,
        }
    }

    pub fn id(&self) -> &str          { &self.id          }
    pub fn name(&self) -> &str        { &self.name        }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> &str    { &self.category    }
    pub fn due_date(&self) -> &DateTime<Utc> { &self.due_date }
    pub fn status(&self) -> TaskStatus       { self.status    }
    pub fn created_at(&self) -> &DateTime<Utc> { &self.created_at }
    pub fn created_by(&self) -> Option<&str>   { self.created_by.as_deref() }

    pub fn set_status(&mut self, new_status: TaskStatus) {
        self.status = new_status;
    }

    /// Whether this task is past its due date and not completed
    pub fn is_overdue_at(&self, now: &DateTime<Utc>) -> bool {
        self.status.is_completed() == false && &self.due_date < now
    }
}

/// A task that has not been stored yet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub category: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

/// Sort tasks the way task lists display them: completed tasks sink to the bottom,
/// overdue tasks come after upcoming ones, then everything is ordered by due date.
pub fn sort_for_display(tasks: &mut Vec<Task>, now: &DateTime<Utc>) {
    tasks.sort_by(|a, b| {
        let completion = a.status.is_completed().cmp(&b.status.is_completed());
        if completion != std::cmp::Ordering::Equal {
            return completion;
        }
        let overdue = a.is_overdue_at(now).cmp(&b.is_overdue_at(now));
        if overdue != std::cmp::Ordering::Equal {
            return overdue;
        }
        a.due_date.cmp(&b.due_date)
    });
}
