use crate::error::BookingError;
use crate::types::{Booking, BookingData, NewBooking};
use chrono::NaiveDate;

/// Storage-facing operations behind the HTTP handlers. `snapshot` never
/// fails; an unreadable store reads as empty.
pub trait BookingBackend: Clone + Send + Sync + 'static {
    fn snapshot(&self) -> BookingData;
    fn submit_booking(&self, booking: NewBooking) -> Result<Booking, BookingError>;
    fn block_slot(&self, date: NaiveDate, time: String, reason: String)
        -> Result<(), BookingError>;
    fn unblock_slot(&self, date: NaiveDate, time: String) -> Result<(), BookingError>;
    fn block_date(&self, date: NaiveDate, reason: String) -> Result<(), BookingError>;
    fn unblock_date(&self, date: NaiveDate) -> Result<(), BookingError>;
    fn delete_booking(&self, id: u64) -> Result<(), BookingError>;
}
