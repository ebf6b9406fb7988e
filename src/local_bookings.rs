use crate::availability::{is_slot_available, is_working_day, local_today};
use crate::backend::BookingBackend;
use crate::error::BookingError;
use crate::store::JsonStore;
use crate::types::{BlockedDate, BlockedSlot, Booking, BookingData, BookingStatus, NewBooking};
use chrono::{NaiveDate, Utc};

pub const PAST_DATE_REJECTION: &str = "Cannot book a date in the past";
pub const CLOSED_DAY_REJECTION: &str = "Selected day is not a working day";
pub const SLOT_TAKEN_REJECTION: &str =
    "Selected time is already taken or blocked. Please choose another time.";

/// File-backed [`BookingBackend`]. Every mutation is one atomic
/// read-modify-write cycle on the underlying [`JsonStore`].
#[derive(Debug, Clone)]
pub struct LocalBookings {
    store: JsonStore,
}

impl LocalBookings {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

impl BookingBackend for LocalBookings {
    fn snapshot(&self) -> BookingData {
        let mut data = self.store.read();
        data.bookings
            .sort_by(|a, b| (a.date, a.time.as_str()).cmp(&(b.date, b.time.as_str())));
        data
    }

    fn submit_booking(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        if booking.date < local_today() {
            return Err(BookingError::Rejected(PAST_DATE_REJECTION.to_string()));
        }
        if !is_working_day(booking.date) {
            return Err(BookingError::Rejected(CLOSED_DAY_REJECTION.to_string()));
        }
        // Cheap pre-check on a lockless read. The authoritative check
        // runs again inside the transform, so two racing submissions
        // for the same slot cannot both land.
        if !is_slot_available(&self.store.read(), booking.date, &booking.time) {
            return Err(BookingError::Rejected(SLOT_TAKEN_REJECTION.to_string()));
        }

        self.store.update(move |data| {
            if !is_slot_available(data, booking.date, &booking.time) {
                return Err(BookingError::Rejected(SLOT_TAKEN_REJECTION.to_string()));
            }

            let id = data
                .bookings
                .iter()
                .map(|existing| existing.id)
                .max()
                .unwrap_or(0)
                + 1;
            let record = Booking {
                id,
                date: booking.date,
                time: booking.time,
                name: booking.name,
                phone: booking.phone,
                email: booking.email,
                problem: booking.problem,
                created_at: Utc::now(),
                status: BookingStatus::Confirmed,
            };
            data.bookings.push(record.clone());
            Ok(record)
        })
    }

    fn block_slot(
        &self,
        date: NaiveDate,
        time: String,
        reason: String,
    ) -> Result<(), BookingError> {
        self.store.update(move |data| {
            let taken = data
                .blocked_slots
                .iter()
                .any(|blocked| blocked.date == date && blocked.time == time);
            if taken {
                return Err(BookingError::Conflict("Slot is already blocked".to_string()));
            }

            data.blocked_slots.push(BlockedSlot {
                date,
                time,
                reason: Some(reason),
                created_at: Utc::now(),
            });
            Ok(())
        })
    }

    fn unblock_slot(&self, date: NaiveDate, time: String) -> Result<(), BookingError> {
        self.store.update(move |data| {
            let mut found = false;
            data.blocked_slots.retain(|blocked| {
                if blocked.date == date && blocked.time == time {
                    found = true;
                    false
                } else {
                    true
                }
            });

            if !found {
                return Err(BookingError::NotFound("Block not found".to_string()));
            }
            Ok(())
        })
    }

    fn block_date(&self, date: NaiveDate, reason: String) -> Result<(), BookingError> {
        self.store.update(move |data| {
            let taken = data
                .blocked_dates
                .iter()
                .any(|blocked| blocked.date == date && blocked.all_day);
            if taken {
                return Err(BookingError::Conflict("Date is already blocked".to_string()));
            }

            data.blocked_dates.push(BlockedDate {
                date,
                reason: Some(reason),
                all_day: true,
                created_at: Utc::now(),
            });
            Ok(())
        })
    }

    fn unblock_date(&self, date: NaiveDate) -> Result<(), BookingError> {
        self.store.update(move |data| {
            let mut found = false;
            data.blocked_dates.retain(|blocked| {
                if blocked.date == date && blocked.all_day {
                    found = true;
                    false
                } else {
                    true
                }
            });

            if !found {
                return Err(BookingError::NotFound("Date block not found".to_string()));
            }
            Ok(())
        })
    }

    fn delete_booking(&self, id: u64) -> Result<(), BookingError> {
        self.store.update(move |data| {
            let mut found = false;
            data.bookings.retain(|booking| {
                if booking.id == id {
                    found = true;
                    false
                } else {
                    true
                }
            });

            if !found {
                return Err(BookingError::NotFound("Booking not found".to_string()));
            }
            Ok(())
        })
    }
}
