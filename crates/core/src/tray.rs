//! The tray record and its creation/update payloads.
//!
//! A tray occupies one slot of the incubator cabinet, addressed by
//! (door, row, position). `position` is a legacy slot coordinate kept for
//! cabinet addressing; it does not participate in status logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Which cabinet door the tray sits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Door {
    Left,
    Right,
}

impl Door {
    pub fn as_str(&self) -> &'static str {
        match self {
            Door::Left => "left",
            Door::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "left" => Ok(Door::Left),
            "right" => Ok(Door::Right),
            other => Err(ValidationError::new(format!("unknown door '{other}'"))),
        }
    }
}

/// Secondary slot coordinate within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            other => Err(ValidationError::new(format!("unknown position '{other}'"))),
        }
    }
}

/// Egg species in the tray. Determines incubation period and warning
/// threshold. Unknown values decode as chicken, matching the stored
/// records written before duck support existed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EggType {
    #[default]
    Chicken,
    Duck,
}

impl From<String> for EggType {
    fn from(s: String) -> Self {
        EggType::parse(&s)
    }
}

impl EggType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EggType::Chicken => "chicken",
            EggType::Duck => "duck",
        }
    }

    /// Lenient parse: anything that is not "duck" is a chicken.
    pub fn parse(s: &str) -> Self {
        match s {
            "duck" => EggType::Duck,
            _ => EggType::Chicken,
        }
    }
}

pub const MIN_ROW: u8 = 1;
pub const MAX_ROW: u8 = 3;

/// A tray of eggs placed in the incubator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tray {
    pub id: Uuid,
    pub door: Door,
    /// Row within the door, 1..=3.
    pub row: u8,
    pub position: Position,
    #[serde(default)]
    pub egg_type: EggType,
    pub added_date: DateTime<Utc>,
    #[serde(default)]
    pub removed: bool,
    /// Set exactly when `removed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notification_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tray {
    /// Build a fresh active tray from validated input. `added_date` defaults
    /// to `now`, egg type to chicken.
    pub fn from_input(input: TrayInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            door: input.door,
            row: input.row,
            position: input.position,
            egg_type: input.egg_type.unwrap_or_default(),
            added_date: input.added_date.unwrap_or(now),
            removed: false,
            removed_date: None,
            notification_sent: false,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a tray.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayInput {
    pub door: Door,
    pub row: u8,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egg_type: Option<EggType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TrayInput {
    /// Range/date checks the type system can't express.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if !(MIN_ROW..=MAX_ROW).contains(&self.row) {
            return Err(ValidationError::new(format!(
                "row must be between {MIN_ROW} and {MAX_ROW}, got {}",
                self.row
            )));
        }
        if let Some(added) = self.added_date {
            if added > now {
                return Err(ValidationError::new(
                    "addedDate must not be in the future",
                ));
            }
        }
        Ok(())
    }
}

/// Whitelisted partial update: notes and the notification flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_sent: Option<bool>,
}

impl TrayPatch {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.notification_sent.is_none()
    }
}
