//! Pure status engine: day counts, incubation periods, and the
//! readiness/overdue classification derived from them.
//!
//! Everything here is deterministic over an explicit `now` instant so the
//! service and sweep stay testable with fixed clocks.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::tray::{EggType, Tray};

const SECS_PER_DAY: i64 = 86_400;

/// Days an egg type spends in the incubator before removal is due.
pub fn incubation_period(egg_type: EggType) -> i64 {
    match egg_type {
        EggType::Chicken => 18,
        EggType::Duck => 25,
    }
}

/// Day count at which a tray is worth flagging as ready to remove,
/// ahead of the full incubation period.
pub fn warning_threshold(egg_type: EggType) -> i64 {
    match egg_type {
        EggType::Chicken => 16,
        EggType::Duck => 23,
    }
}

/// Whole days the tray has spent in the incubator, rounded up.
///
/// Uses the absolute difference so a (validated-against, but possible in
/// legacy data) future `added_date` yields a count instead of a negative.
pub fn days_in_incubator(added_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (now - added_date).num_seconds().abs();
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}

/// The date the incubation period completes and the tray must come out.
pub fn completion_date(added_date: DateTime<Utc>, egg_type: EggType) -> DateTime<Utc> {
    added_date + Duration::days(incubation_period(egg_type))
}

/// Whole days until the completion date, rounded up. `None` once the
/// completion date has passed — the overdue amount lives on
/// [`TrayStatus::Overdue`] instead of counting up from zero here.
pub fn days_remaining(
    added_date: DateTime<Utc>,
    egg_type: EggType,
    now: DateTime<Utc>,
) -> Option<i64> {
    let completion = completion_date(added_date, egg_type);
    if now >= completion {
        return None;
    }
    let secs = (completion - now).num_seconds();
    Some((secs + SECS_PER_DAY - 1) / SECS_PER_DAY)
}

/// Lifecycle category of a tray at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TrayStatus {
    Incubating,
    ReadyToRemove,
    Overdue { days_overdue: i64 },
    Removed,
}

impl TrayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrayStatus::Incubating => "incubating",
            TrayStatus::ReadyToRemove => "ready_to_remove",
            TrayStatus::Overdue { .. } => "overdue",
            TrayStatus::Removed => "removed",
        }
    }
}

/// Classify a tray. Exactly one category applies: removed wins, then the
/// incubation period, then the warning threshold.
pub fn status(tray: &Tray, now: DateTime<Utc>) -> TrayStatus {
    if tray.removed {
        return TrayStatus::Removed;
    }
    let days = days_in_incubator(tray.added_date, now);
    let period = incubation_period(tray.egg_type);
    if days >= period {
        return TrayStatus::Overdue {
            days_overdue: days - period,
        };
    }
    if days >= warning_threshold(tray.egg_type) {
        return TrayStatus::ReadyToRemove;
    }
    TrayStatus::Incubating
}

/// Which trays may be deleted from history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Only removed trays may be deleted.
    #[default]
    RemovedOnly,
    /// Removed trays, or active trays past their warning threshold.
    PastThreshold,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::RemovedOnly => "removed-only",
            DeletePolicy::PastThreshold => "past-threshold",
        }
    }

    /// Lenient parse with the strict policy as fallback.
    pub fn parse(s: &str) -> Self {
        match s {
            "past-threshold" => DeletePolicy::PastThreshold,
            _ => DeletePolicy::RemovedOnly,
        }
    }
}

/// Whether the tray may be deleted under the given policy.
pub fn can_delete(tray: &Tray, now: DateTime<Utc>, policy: DeletePolicy) -> bool {
    if tray.removed {
        return true;
    }
    match policy {
        DeletePolicy::RemovedOnly => false,
        DeletePolicy::PastThreshold => {
            days_in_incubator(tray.added_date, now) >= warning_threshold(tray.egg_type)
        }
    }
}

/// Whether the overdue alert for this tray is still owed: active, not yet
/// notified, and at or past its incubation period.
pub fn should_notify(tray: &Tray, now: DateTime<Utc>) -> bool {
    !tray.removed
        && !tray.notification_sent
        && days_in_incubator(tray.added_date, now) >= incubation_period(tray.egg_type)
}
