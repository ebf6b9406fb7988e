use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::{
    backend::BookingBackend,
    configuration::Configuration,
    error::BookingError,
    notifier::Notifier,
    session,
    types::{Booking, BookingData, BookingStatus, NewBooking},
};

pub struct MockBookingBackendInner {
    pub success: AtomicBool,
    pub calls_to_snapshot: AtomicU64,
    pub calls_to_submit_booking: AtomicU64,
    pub calls_to_block_slot: AtomicU64,
    pub calls_to_unblock_slot: AtomicU64,
    pub calls_to_block_date: AtomicU64,
    pub calls_to_unblock_date: AtomicU64,
    pub calls_to_delete_booking: AtomicU64,
    pub data: Mutex<BookingData>,
}

#[derive(Clone)]
pub struct MockBookingBackend(pub Arc<MockBookingBackendInner>);

impl MockBookingBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_snapshot: AtomicU64::default(),
            calls_to_submit_booking: AtomicU64::default(),
            calls_to_block_slot: AtomicU64::default(),
            calls_to_unblock_slot: AtomicU64::default(),
            calls_to_block_date: AtomicU64::default(),
            calls_to_unblock_date: AtomicU64::default(),
            calls_to_delete_booking: AtomicU64::default(),
            data: Mutex::default(),
        }
    }
}

impl MockBookingBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingBackendInner::new()))
    }

    fn succeeding(&self) -> bool {
        self.0.success.load(Ordering::SeqCst)
    }
}

impl BookingBackend for MockBookingBackend {
    fn snapshot(&self) -> BookingData {
        self.0.calls_to_snapshot.fetch_add(1, Ordering::SeqCst);
        self.0.data.lock().unwrap().clone()
    }

    fn submit_booking(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        self.0
            .calls_to_submit_booking
            .fetch_add(1, Ordering::SeqCst);
        if !self.succeeding() {
            return Err(BookingError::Rejected("Supposed to fail".to_string()));
        }
        Ok(Booking {
            id: 1,
            date: booking.date,
            time: booking.time,
            name: booking.name,
            phone: booking.phone,
            email: booking.email,
            problem: booking.problem,
            created_at: Utc::now(),
            status: BookingStatus::Confirmed,
        })
    }

    fn block_slot(
        &self,
        _date: NaiveDate,
        _time: String,
        _reason: String,
    ) -> Result<(), BookingError> {
        self.0.calls_to_block_slot.fetch_add(1, Ordering::SeqCst);
        match self.succeeding() {
            true => Ok(()),
            false => Err(BookingError::Conflict("Supposed to fail".to_string())),
        }
    }

    fn unblock_slot(&self, _date: NaiveDate, _time: String) -> Result<(), BookingError> {
        self.0.calls_to_unblock_slot.fetch_add(1, Ordering::SeqCst);
        match self.succeeding() {
            true => Ok(()),
            false => Err(BookingError::NotFound("Supposed to fail".to_string())),
        }
    }

    fn block_date(&self, _date: NaiveDate, _reason: String) -> Result<(), BookingError> {
        self.0.calls_to_block_date.fetch_add(1, Ordering::SeqCst);
        match self.succeeding() {
            true => Ok(()),
            false => Err(BookingError::Conflict("Supposed to fail".to_string())),
        }
    }

    fn unblock_date(&self, _date: NaiveDate) -> Result<(), BookingError> {
        self.0.calls_to_unblock_date.fetch_add(1, Ordering::SeqCst);
        match self.succeeding() {
            true => Ok(()),
            false => Err(BookingError::NotFound("Supposed to fail".to_string())),
        }
    }

    fn delete_booking(&self, _id: u64) -> Result<(), BookingError> {
        self.0
            .calls_to_delete_booking
            .fetch_add(1, Ordering::SeqCst);
        match self.succeeding() {
            true => Ok(()),
            false => Err(BookingError::NotFound("Supposed to fail".to_string())),
        }
    }
}

/// Counts deliveries instead of talking to Telegram.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notifications: Arc<AtomicU64>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_created(&self, _booking: Booking) -> Result<(), String> {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Admin password is "123".
#[derive(Clone)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn port(&self) -> String {
        "0".to_string()
    }

    fn data_file(&self) -> PathBuf {
        PathBuf::from("unused.json")
    }

    fn admin_password_hash(&self) -> String {
        session::hash_password("123")
    }

    fn telegram_bot_token(&self) -> Option<String> {
        None
    }

    fn telegram_chat_id(&self) -> Option<String> {
        None
    }

    fn session_ttl_hours(&self) -> i64 {
        24
    }
}
