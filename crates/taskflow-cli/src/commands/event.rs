//! Calendar event commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use taskflow_core::query::{
    event_stats, events_for_date, events_in_range, search_events, upcoming_events,
};
use taskflow_core::{ClockTime, Config, Event, EventPatch, NewEvent, SyncEngine};
use tracing::warn;

use super::{open_engine, print_json, today, CmdResult, ProviderChoice};

#[derive(Subcommand)]
pub enum EventAction {
    /// List events (upcoming by default)
    List {
        /// Events on one day (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["from", "all"])]
        date: Option<NaiveDate>,
        /// Start of an inclusive range
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// End of an inclusive range
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Every event, in stored order
        #[arg(long)]
        all: bool,
        /// Days ahead for the upcoming window (defaults to `calendar.upcoming_days`)
        #[arg(long)]
        days: Option<u32>,
        /// Title, description or location substring
        #[arg(long, default_value = "")]
        search: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an event
    Add {
        /// Event title
        title: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<ClockTime>,
        /// End time (HH:MM)
        #[arg(long)]
        end: Option<ClockTime>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Display color (defaults to `calendar.default_color`)
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        reminder: Option<String>,
    },
    /// Show event details
    Show {
        /// Event ID
        id: String,
    },
    /// Update an event
    Update {
        /// Event ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        start: Option<ClockTime>,
        #[arg(long)]
        end: Option<ClockTime>,
        /// Remove start and end time
        #[arg(long, conflicts_with_all = ["start", "end"])]
        clear_times: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        reminder: Option<String>,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
    /// Delete every event
    Clear,
    /// Events overlapping a time slot
    Conflicts {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        start: ClockTime,
        #[arg(long)]
        end: ClockTime,
        /// Event to ignore (the one being edited)
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Event counters
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub(crate) fn format_event(event: &Event) -> String {
    let slot = match (event.start_time, event.end_time) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => format!("{start}"),
        (None, Some(end)) => format!("-{end}"),
        (None, None) => "all day".to_string(),
    };
    let mut line = format!("{}  {} {:<11} {}", event.id, event.date, slot, event.title);
    if !event.location.is_empty() {
        line.push_str(&format!(" @ {}", event.location));
    }
    line
}

fn print_events<'a>(events: impl IntoIterator<Item = &'a Event>) {
    let mut any = false;
    for event in events {
        println!("{}", format_event(event));
        any = true;
    }
    if !any {
        println!("No events found");
    }
}

/// Warn about overlaps before a create or a reschedule.
fn report_conflicts(
    engine: &SyncEngine,
    date: NaiveDate,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    exclude: Option<&str>,
) {
    for other in engine.event_conflicts_for(date, start, end, exclude) {
        warn!(id = %other.id, title = %other.title, "time slot overlaps an existing event");
        eprintln!("warning: overlaps {}", format_event(other));
    }
}

pub async fn run(action: EventAction, choice: &ProviderChoice, config: &Config) -> CmdResult {
    let mut engine = open_engine(choice, config).await?;

    match action {
        EventAction::List {
            date,
            from,
            to,
            all,
            days,
            search,
            json,
        } => {
            let events = engine.events();
            let mut selected = match (date, from, to) {
                (Some(date), _, _) => events_for_date(events, date),
                (None, Some(from), Some(to)) => events_in_range(events, from, to),
                _ if all => events.iter().collect(),
                _ => upcoming_events(
                    events,
                    today(),
                    days.unwrap_or(config.calendar.upcoming_days),
                ),
            };
            if !search.trim().is_empty() {
                let hits = search_events(events, &search);
                selected.retain(|e| hits.iter().any(|h| h.id == e.id));
            }
            if json {
                print_json(&selected)?;
            } else {
                print_events(selected);
            }
        }
        EventAction::Add {
            title,
            date,
            start,
            end,
            description,
            location,
            color,
            reminder,
        } => {
            report_conflicts(&engine, date, start, end, None);
            let input = NewEvent {
                title,
                description,
                date: Some(date),
                start_time: start,
                end_time: end,
                location,
                color: color.or_else(|| Some(config.calendar.default_color.clone())),
                reminder,
                ..Default::default()
            };
            let event = engine.create_event(input).await?;
            println!("Event created: {}", event.id);
            print_json(&event)?;
        }
        EventAction::Show { id } => match engine.event(&id) {
            Some(event) => print_json(event)?,
            None => return Err(format!("event not found: {id}").into()),
        },
        EventAction::Update {
            id,
            title,
            date,
            start,
            end,
            clear_times,
            description,
            location,
            color,
            reminder,
        } => {
            let patch = EventPatch {
                title,
                description,
                date,
                start_time: if clear_times { Some(None) } else { start.map(Some) },
                end_time: if clear_times { Some(None) } else { end.map(Some) },
                location,
                color,
                reminder,
            };
            if let Some(current) = engine.event(&id) {
                let start = patch.start_time.unwrap_or(current.start_time);
                let end = patch.end_time.unwrap_or(current.end_time);
                report_conflicts(&engine, patch.date.unwrap_or(current.date), start, end, Some(id.as_str()));
            }
            let event = engine.update_event(&id, patch).await?;
            println!("Event updated: {}", event.id);
            print_json(&event)?;
        }
        EventAction::Delete { id } => {
            engine.delete_event(&id).await?;
            println!("Event deleted: {id}");
        }
        EventAction::Clear => {
            let removed = engine.clear_events().await?;
            println!("Deleted {removed} event(s)");
        }
        EventAction::Conflicts {
            date,
            start,
            end,
            exclude,
        } => print_events(engine.event_conflicts_for(date, Some(start), Some(end), exclude.as_deref())),
        EventAction::Stats { json } => {
            let stats = event_stats(engine.events(), today());
            if json {
                print_json(&stats)?;
            } else {
                println!("Total:    {}", stats.total);
                println!("Today:    {}", stats.today);
                println!("Upcoming: {}", stats.upcoming);
                for (month, count) in &stats.by_month {
                    println!("  {month}: {count}");
                }
            }
        }
    }
    Ok(())
}
