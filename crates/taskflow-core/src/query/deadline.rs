use chrono::NaiveDate;

/// Whole days from `today` to `deadline`; negative once it has passed.
pub fn days_until(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

/// Human-readable deadline, e.g. `Due tomorrow` or `Overdue by 2 days`.
pub fn describe_deadline(deadline: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(deadline) = deadline else {
        return "No deadline".to_string();
    };
    match days_until(deadline, today) {
        days if days < 0 => {
            let late = -days;
            format!("Overdue by {late} day{}", if late > 1 { "s" } else { "" })
        }
        0 => "Due today".to_string(),
        1 => "Due tomorrow".to_string(),
        days @ 2..=7 => format!("Due in {days} days"),
        _ => format!("Due {}", deadline.format("%b %-d, %Y")),
    }
}
