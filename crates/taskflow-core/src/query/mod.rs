//! Pure queries over record snapshots.
//!
//! Nothing here mutates its input or holds state. Selection functions return
//! borrowed views so callers can chain them (`filter_tasks` then `sort_tasks`)
//! without cloning records.

mod deadline;
mod events;
mod tasks;

pub use deadline::{days_until, describe_deadline};
pub use events::{
    check_conflicts, event_stats, events_for_date, events_in_range, overlaps, search_events,
    upcoming_events, EventStats, DEFAULT_UPCOMING_DAYS,
};
pub use tasks::{
    filter_tasks, overdue_tasks, sort_tasks, task_stats, tasks_by_status, upcoming_tasks,
    TaskFilter, TaskSortKey, TaskStats, UPCOMING_TASK_DAYS,
};
