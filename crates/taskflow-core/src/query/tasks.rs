use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::task::{Task, TaskPriority, TaskStatus};

/// Deadline horizon for [`upcoming_tasks`].
pub const UPCOMING_TASK_DAYS: u64 = 7;

/// Task list filter. `None` / empty text means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring of the assignee
    pub assignee: String,
    /// Case-insensitive substring of title or description
    pub search: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        let assignee = self.assignee.trim().to_lowercase();
        if !assignee.is_empty() && !task.assignee.to_lowercase().contains(&assignee) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle)
    }
}

pub fn filter_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    filter: &TaskFilter,
) -> Vec<&'a Task> {
    tasks.into_iter().filter(|t| filter.matches(t)).collect()
}

/// Sort order for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSortKey {
    /// Newest first
    #[default]
    Created,
    /// Earliest first, tasks without a deadline last
    Deadline,
    /// High, medium, low
    Priority,
    /// Case-insensitive A-Z
    Title,
    /// Most recently updated first
    Updated,
}

impl TaskSortKey {
    pub const ALL: [TaskSortKey; 5] = [
        TaskSortKey::Created,
        TaskSortKey::Deadline,
        TaskSortKey::Priority,
        TaskSortKey::Title,
        TaskSortKey::Updated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSortKey::Created => "created",
            TaskSortKey::Deadline => "deadline",
            TaskSortKey::Priority => "priority",
            TaskSortKey::Title => "title",
            TaskSortKey::Updated => "updated",
        }
    }
}

impl fmt::Display for TaskSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskSortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskSortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid(
                    "sort",
                    format!("expected one of created, deadline, priority, title, updated; got '{s}'"),
                )
            })
    }
}

/// Sorted copy of `tasks`. Stable: ties keep their input order.
pub fn sort_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, key: TaskSortKey) -> Vec<&'a Task> {
    let mut sorted: Vec<&Task> = tasks.into_iter().collect();
    match key {
        TaskSortKey::Created => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TaskSortKey::Updated => sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        TaskSortKey::Deadline => sorted.sort_by_key(|t| (t.deadline.is_none(), t.deadline)),
        TaskSortKey::Priority => sorted.sort_by_key(|t| t.priority.rank()),
        TaskSortKey::Title => sorted.sort_by_cached_key(|t| t.title.to_lowercase()),
    }
    sorted
}

pub fn tasks_by_status(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

/// Open tasks whose deadline has passed.
pub fn overdue_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_overdue(today)).collect()
}

/// Open tasks due between today and [`UPCOMING_TASK_DAYS`] from now, inclusive.
pub fn upcoming_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_TASK_DAYS))
        .unwrap_or(NaiveDate::MAX);
    tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter(|t| t.deadline.is_some_and(|d| d >= today && d <= horizon))
        .collect()
}

/// Dashboard counters for a task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub overdue: usize,
}

pub fn task_stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    tasks.iter().fold(
        TaskStats {
            total: tasks.len(),
            ..Default::default()
        },
        |mut stats, task| {
            match task.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
            match task.priority {
                TaskPriority::High => stats.high += 1,
                TaskPriority::Medium => stats.medium += 1,
                TaskPriority::Low => stats.low += 1,
            }
            if task.is_overdue(today) {
                stats.overdue += 1;
            }
            stats
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::{Duration, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, title: &str) -> Task {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        NewTask::new(title).into_task(id.into(), created)
    }

    fn ids<'a>(tasks: &[&'a Task]) -> Vec<&'a str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn priority_sort_is_high_medium_low() {
        let mut low = task("low", "a");
        low.priority = TaskPriority::Low;
        let mut high = task("high", "b");
        high.priority = TaskPriority::High;
        let medium = task("medium", "c");
        let tasks = vec![low, high, medium];

        let sorted = sort_tasks(&tasks, TaskSortKey::Priority);
        assert_eq!(ids(&sorted), ["high", "medium", "low"]);
        assert_eq!(tasks[0].id, "low");
    }

    #[test]
    fn deadline_sort_puts_missing_last_and_keeps_order() {
        let mut a = task("a", "a");
        a.deadline = Some(date(2024, 3, 20));
        let b = task("b", "b");
        let mut c = task("c", "c");
        c.deadline = Some(date(2024, 3, 10));
        let d = task("d", "d");
        let tasks = vec![b, a, d, c];

        let sorted = sort_tasks(&tasks, TaskSortKey::Deadline);
        assert_eq!(ids(&sorted), ["c", "a", "b", "d"]);
    }

    #[test]
    fn created_and_updated_sort_newest_first() {
        let mut old = task("old", "x");
        let mut new = task("new", "y");
        new.created_at = old.created_at + Duration::hours(1);
        new.updated_at = new.created_at;
        old.updated_at = new.created_at + Duration::hours(1);
        let tasks = vec![old, new];

        assert_eq!(ids(&sort_tasks(&tasks, TaskSortKey::Created)), ["new", "old"]);
        assert_eq!(ids(&sort_tasks(&tasks, TaskSortKey::Updated)), ["old", "new"]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let tasks = vec![task("1", "banana"), task("2", "Apple"), task("3", "cherry")];
        assert_eq!(ids(&sort_tasks(&tasks, TaskSortKey::Title)), ["2", "1", "3"]);
    }

    #[test]
    fn filters_compose_with_and() {
        let mut a = task("a", "Write report");
        a.priority = TaskPriority::High;
        a.assignee = "Dana".into();
        let mut b = task("b", "Review");
        b.description = "the quarterly REPORT".into();
        b.priority = TaskPriority::High;
        let mut c = task("c", "Report bug");
        c.status = TaskStatus::Completed;
        c.priority = TaskPriority::High;
        let tasks = vec![a, b, c];

        let filter = TaskFilter {
            priority: Some(TaskPriority::High),
            status: Some(TaskStatus::Todo),
            search: "report".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), ["a", "b"]);

        let filter = TaskFilter {
            assignee: "dan".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), ["a"]);

        assert_eq!(filter_tasks(&tasks, &TaskFilter::default()).len(), 3);
    }

    #[test]
    fn filter_then_sort_chains_over_borrowed_views() {
        let mut a = task("a", "b task");
        a.priority = TaskPriority::Low;
        let b = task("b", "a task");
        let tasks = vec![a, b];
        let filtered = filter_tasks(&tasks, &TaskFilter::default());
        let sorted = sort_tasks(filtered, TaskSortKey::Title);
        assert_eq!(ids(&sorted), ["b", "a"]);
    }

    #[test]
    fn overdue_and_upcoming_skip_completed() {
        let today = date(2024, 3, 15);
        let mut late = task("late", "late");
        late.deadline = Some(date(2024, 3, 14));
        let mut done = task("done", "done");
        done.deadline = Some(date(2024, 3, 14));
        done.status = TaskStatus::Completed;
        let mut soon = task("soon", "soon");
        soon.deadline = Some(date(2024, 3, 22));
        let mut later = task("later", "later");
        later.deadline = Some(date(2024, 3, 23));
        let tasks = vec![late, done, soon, later];

        assert_eq!(ids(&overdue_tasks(&tasks, today)), ["late"]);
        assert_eq!(ids(&upcoming_tasks(&tasks, today)), ["soon"]);
        assert_eq!(ids(&tasks_by_status(&tasks, TaskStatus::Completed)), ["done"]);

        let stats = task_stats(&tasks, today);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.todo, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.medium, 4);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn sort_key_parses_names() {
        assert_eq!("deadline".parse::<TaskSortKey>().unwrap(), TaskSortKey::Deadline);
        assert!("newest".parse::<TaskSortKey>().is_err());
    }
}
