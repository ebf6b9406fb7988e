use crate::types::{BookingData, DateAvailability, DayState, DayStatus, SlotInfo};
use chrono::{Datelike, FixedOffset, NaiveDate, Utc, Weekday};
use std::collections::BTreeMap;

/// The fixed daily slot grid. Bookings and slot blocks only ever refer
/// to these labels.
pub const WORKING_HOURS: [&str; 8] = [
    "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

pub const WORKING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

const DEFAULT_SLOT_BLOCK_REASON: &str = "Blocked";
const BOOKED_SLOT_REASON: &str = "Busy";

/// The deployment runs against a single fixed zone (UTC+3, no DST).
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

pub fn local_today() -> NaiveDate {
    Utc::now().with_timezone(&local_offset()).date_naive()
}

pub fn is_working_day(date: NaiveDate) -> bool {
    WORKING_DAYS.contains(&date.weekday())
}

pub fn is_working_hour(time: &str) -> bool {
    WORKING_HOURS.contains(&time)
}

/// A slot is free unless the whole day is blocked, the slot itself is
/// blocked, or a booking already sits on it.
pub fn is_slot_available(data: &BookingData, date: NaiveDate, time: &str) -> bool {
    if data
        .blocked_dates
        .iter()
        .any(|blocked| blocked.date == date && blocked.all_day)
    {
        return false;
    }

    if data
        .blocked_slots
        .iter()
        .any(|blocked| blocked.date == date && blocked.time == time)
    {
        return false;
    }

    if data
        .bookings
        .iter()
        .any(|booking| booking.date == date && booking.time == time)
    {
        return false;
    }

    true
}

/// Status of one day: `blocked` whenever an all-day block exists,
/// otherwise `free`/`partial`/`full` from the per-slot availability.
pub fn day_status(data: &BookingData, date: NaiveDate) -> DayStatus {
    if let Some(blocked) = data
        .blocked_dates
        .iter()
        .find(|blocked| blocked.date == date && blocked.all_day)
    {
        return DayStatus {
            status: DayState::Blocked,
            available_slots: Vec::new(),
            total_slots: WORKING_HOURS.len(),
            reason: blocked.reason.clone(),
        };
    }

    let available_slots: Vec<String> = WORKING_HOURS
        .iter()
        .filter(|time| is_slot_available(data, date, time))
        .map(|time| time.to_string())
        .collect();

    let status = if available_slots.is_empty() {
        DayState::Full
    } else if available_slots.len() == WORKING_HOURS.len() {
        DayState::Free
    } else {
        DayState::Partial
    };

    DayStatus {
        status,
        available_slots,
        total_slots: WORKING_HOURS.len(),
        reason: None,
    }
}

/// Day statuses for one month, keyed by date. Past days and non-working
/// days are left out entirely rather than marked unavailable.
pub fn month_availability(
    data: &BookingData,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> BTreeMap<NaiveDate, DayStatus> {
    let mut dates = BTreeMap::new();

    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return dates;
    };

    let mut day = first;
    while day.year() == year && day.month() == month {
        if day >= today && is_working_day(day) {
            dates.insert(day, day_status(data, day));
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    dates
}

/// Per-slot view of a single day, with the reason a slot is closed.
pub fn date_availability(data: &BookingData, date: NaiveDate) -> DateAvailability {
    if let Some(blocked) = data
        .blocked_dates
        .iter()
        .find(|blocked| blocked.date == date && blocked.all_day)
    {
        return DateAvailability {
            date,
            blocked: true,
            reason: blocked.reason.clone(),
            slots: Vec::new(),
        };
    }

    let slots = WORKING_HOURS
        .iter()
        .map(|time| {
            let available = is_slot_available(data, date, time);
            let mut slot = SlotInfo {
                time: time.to_string(),
                available,
                reason: None,
                blocked: None,
                booked: None,
            };

            if !available {
                if let Some(blocked) = data
                    .blocked_slots
                    .iter()
                    .find(|blocked| blocked.date == date && blocked.time == *time)
                {
                    slot.reason = Some(
                        blocked
                            .reason
                            .clone()
                            .unwrap_or_else(|| DEFAULT_SLOT_BLOCK_REASON.to_string()),
                    );
                    slot.blocked = Some(true);
                } else if data
                    .bookings
                    .iter()
                    .any(|booking| booking.date == date && booking.time == *time)
                {
                    slot.reason = Some(BOOKED_SLOT_REASON.to_string());
                    slot.booked = Some(true);
                }
            }

            slot
        })
        .collect();

    DateAvailability {
        date,
        blocked: false,
        reason: None,
        slots,
    }
}
