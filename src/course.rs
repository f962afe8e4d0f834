//! Courses and their weekly class times

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A weekly time slot for a course.
///
/// The record store persists all the class times of a course as a single string
/// (`"Sunday at 10:00 in AB1-401, Tuesday at 10:00"`), so this type knows how to
/// round-trip through that format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTime {
    pub day: String,
    pub time: String,
    pub classroom: Option<String>,
}

impl Display for ClassTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.classroom {
            Some(room) => write!(f, "{} at {} in {}", self.day, self.time, room),
            None => write!(f, "{} at {}", self.day, self.time),
        }
    }
}

impl FromStr for ClassTime {
    type Err = Box<dyn std::error::Error + Send + Sync>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time_info, classroom) = match s.find(" in ") {
            Some(pos) => (&s[..pos], Some(s[pos + 4..].to_string())),
            None => (s, None),
        };
        let pos = time_info.find(" at ")
            .ok_or_else(|| format!("Invalid class time {:?}: missing \" at \"", s))?;
        Ok(Self {
            day: time_info[..pos].to_string(),
            time: time_info[pos + 4..].to_string(),
            classroom,
        })
    }
}

/// Parse the comma-joined string stored in the record store's `class_time` column.
///
/// Slots that do not follow the `"<day> at <time>[ in <classroom>]"` shape are skipped
/// (and logged), so that one malformed slot does not discard the whole course.
pub fn parse_class_times(joined: &str) -> Vec<ClassTime> {
    joined.split(", ")
        .filter(|part| part.is_empty() == false)
        .filter_map(|part| match part.parse() {
            Ok(ct) => Some(ct),
            Err(err) => {
                log::warn!("Ignoring malformed class time {:?}: {}", part, err);
                None
            },
        })
        .collect()
}

/// Join class times back into the single-string format the record store expects
pub fn format_class_times(class_times: &[ClassTime]) -> String {
    class_times.iter()
        .map(|ct| ct.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A course, as stored in the record store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    id: String,
    name: String,
    code: String,
    teacher: String,
    class_times: Vec<ClassTime>,
    telegram_group: Option<String>,
    blc_link: Option<String>,
    blc_enroll_key: Option<String>,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl Course {
    /// Create a Course instance from data the record store returned
    pub fn new_with_parameters(id: String, new: NewCourse,
                               created_at: DateTime<Utc>, created_by: Option<String>) -> Self
    {
        Self {
            id,
            name: new.name,
            code: new.code,
            teacher: new.teacher,
            class_times: new.class_times,
            telegram_group: new.telegram_group,
            blc_link: new.blc_link,
            blc_enroll_key: new.blc_enroll_key,
            created_at,
            created_by,
        }
    }

    pub fn id(&self) -> &str       { &self.id      }
    pub fn name(&self) -> &str     { &self.name    }
    pub fn code(&self) -> &str     { &self.code    }
    pub fn teacher(&self) -> &str  { &self.teacher }
    pub fn class_times(&self) -> &[ClassTime]       { &self.class_times }
    pub fn telegram_group(&self) -> Option<&str>    { self.telegram_group.as_deref() }
    pub fn blc_link(&self) -> Option<&str>          { self.blc_link.as_deref() }
    pub fn blc_enroll_key(&self) -> Option<&str>    { self.blc_enroll_key.as_deref() }
    pub fn created_at(&self) -> &DateTime<Utc>      { &self.created_at }
    pub fn created_by(&self) -> Option<&str>        { self.created_by.as_deref() }
}

/// A course that has not been stored yet (the record store will assign its id)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub teacher: String,
    pub class_times: Vec<ClassTime>,
    pub telegram_group: Option<String>,
    pub blc_link: Option<String>,
    pub blc_enroll_key: Option<String>,
}
