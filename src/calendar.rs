//! Month-grid helpers for the task calendar view
//!
//! The view shows one month at a time, summarizes the tasks due on each day, and
//! reveals a per-day tooltip after a short hover (or long-press on touch screens).
//! Everything here is pure bookkeeping; rendering stays with the caller.

use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate};

use crate::task::Task;

/// How long a day cell must be hovered (or pressed) before its tooltip shows
pub const TOOLTIP_DELAY: Duration = Duration::from_millis(500);

/// Every day of the given month, in order
pub fn days_of_month(year: i32, month: u32) -> Vec<NaiveDate> {
    let first = NaiveDate::from_ymd(year, month, 1);
    let (next_year, next_month) = next_month(year, month);
    let first_of_next = NaiveDate::from_ymd(next_year, next_month, 1);

    let mut days = Vec::with_capacity(31);
    let mut day = first;
    while day < first_of_next {
        days.push(day);
        day = day.succ();
    }
    days
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// What one day cell displays about the tasks due that day
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub in_progress: usize,
}

impl TaskSummary {
    /// Summarize the tasks whose due date falls on `date`.
    ///
    /// Overdue is judged against `now`, exactly like the task lists do, so a task is
    /// never counted both overdue and in progress.
    pub fn for_date(tasks: &[Task], date: NaiveDate, now: &chrono::DateTime<chrono::Utc>) -> Self {
        let mut summary = Self::default();
        for task in tasks {
            if task.due_date().naive_utc().date() != date {
                continue;
            }
            summary.total += 1;
            if task.status().is_completed() {
                summary.completed += 1;
            } else if task.is_overdue_at(now) {
                summary.overdue += 1;
            } else {
                summary.in_progress += 1;
            }
        }
        summary
    }
}

/// The delayed reveal of a day tooltip.
///
/// Hover and long-press share this: `begin` on enter/press, `cancel` on leave/release,
/// and `poll` from the caller's tick to learn when the delay has elapsed.
#[derive(Debug, Default)]
pub struct TooltipTimer {
    pending: Option<(NaiveDate, Instant)>,
}

impl TooltipTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the delay for the given day
    pub fn begin(&mut self, date: NaiveDate, now: Instant) {
        self.pending = Some((date, now));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// The day whose tooltip should now show, if the delay has elapsed.
    ///
    /// Returns the day at most once per `begin`.
    pub fn poll(&mut self, now: Instant) -> Option<NaiveDate> {
        match self.pending {
            Some((date, started)) if now.duration_since(started) >= TOOLTIP_DELAY => {
                self.pending = None;
                Some(date)
            },
            _ => None,
        }
    }
}

/// The grid position helpers views need: how many leading blanks before day 1
/// (weeks starting on Sunday)
pub fn leading_blanks(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd(year, month, 1).weekday().num_days_from_sunday()
}
