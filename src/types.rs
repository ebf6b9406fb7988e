use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: u64,
    pub date: NaiveDate,
    pub time: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub problem: String,
    pub created_at: DateTime<Utc>,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

/// An all-day blackout set by the administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    pub all_day: bool,
    pub created_at: DateTime<Utc>,
}

/// A single blocked time slot on an otherwise open day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The whole persisted document. Mutations always replace it as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingData {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub blocked_dates: Vec<BlockedDate>,
    #[serde(default)]
    pub blocked_slots: Vec<BlockedSlot>,
}

/// A validated submission, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub date: NaiveDate,
    pub time: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub problem: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    Free,
    Partial,
    Full,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatus {
    pub status: DayState,
    pub available_slots: Vec<String>,
    pub total_slots: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub time: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub slots: Vec<SlotInfo>,
}
