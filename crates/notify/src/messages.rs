//! Message composition for tray lifecycle notifications.

use chrono::{DateTime, Utc};

use couvoir_core::status::{completion_date, days_in_incubator, incubation_period};
use couvoir_core::tray::{Door, Position, Tray};

use crate::traits::Notification;

fn door_label(door: Door) -> &'static str {
    match door {
        Door::Left => "left",
        Door::Right => "right",
    }
}

fn position_label(position: Position) -> &'static str {
    match position {
        Position::Left => "left",
        Position::Right => "right",
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Confirmation sent when a tray is placed in the incubator, including the
/// computed removal-due date.
pub fn tray_added(tray: &Tray) -> Notification {
    let due = completion_date(tray.added_date, tray.egg_type);
    Notification {
        subject: "Tray added".to_string(),
        body: format!(
            "New tray of {} eggs added to the {} door, row {}, {} position. \
             Remember to remove it on {}!",
            tray.egg_type.as_str(),
            door_label(tray.door),
            tray.row,
            position_label(tray.position),
            format_date(due),
        ),
    }
}

/// Confirmation sent when a tray is marked as removed.
pub fn tray_removed(tray: &Tray) -> Notification {
    Notification {
        subject: "Tray removed".to_string(),
        body: format!(
            "Tray from the {} door, row {}, {} position has been marked as removed.",
            door_label(tray.door),
            tray.row,
            position_label(tray.position),
        ),
    }
}

/// The overdue alert pushed by the periodic sweep once a tray reaches its
/// incubation period. HTML formatting per the Telegram parse mode.
pub fn tray_overdue(tray: &Tray, now: DateTime<Utc>) -> Notification {
    let days = days_in_incubator(tray.added_date, now);
    let period = incubation_period(tray.egg_type);
    Notification {
        subject: "Tray ready to be removed".to_string(),
        body: format!(
            "🚨 <b>ALERT: Tray ready to be removed</b> 🚨\n\n\
             Door: <b>{}</b>\n\
             Row: <b>{}</b>\n\
             Added on: <b>{}</b>\n\
             Days in incubator: <b>{}</b>\n\n\
             This tray has reached or passed the {}-day {} incubation period \
             and is ready to be removed.",
            door_label(tray.door),
            tray.row,
            format_date(tray.added_date),
            days,
            period,
            tray.egg_type.as_str(),
        ),
    }
}
