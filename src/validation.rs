use crate::availability::is_working_hour;
use crate::types::NewBooking;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[а-яёА-ЯЁa-zA-Z\s\-]+$").unwrap();
    static ref DATE_INPUT_RE: Regex = Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").unwrap();
    static ref ISO_DATE_RE: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();
    static ref MONTH_RE: Regex = Regex::new(r"^(\d{4})-(\d{2})$").unwrap();
}

/// Raw booking form fields as they arrive on the wire. Dates are entered
/// as `DD.MM.YYYY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BookingSubmission {
    #[validate(custom(function = validate_name))]
    pub name: String,
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    #[validate(custom(function = validate_email_field))]
    pub email: String,
    #[validate(custom(function = validate_submission_date))]
    pub date: String,
    #[validate(custom(function = validate_slot_time))]
    pub time: String,
    pub problem: String,
}

/// Violations are reported for every field at once, in this order.
const FIELD_ORDER: [&str; 5] = ["name", "phone", "email", "date", "time"];

/// Check every rule and either hand back a cleaned-up [`NewBooking`] or
/// the full list of violations.
pub fn validate_submission(submission: &BookingSubmission) -> Result<NewBooking, Vec<String>> {
    let cleaned = BookingSubmission {
        name: submission.name.trim().to_string(),
        phone: submission.phone.trim().to_string(),
        email: submission.email.trim().to_string(),
        date: submission.date.trim().to_string(),
        time: submission.time.trim().to_string(),
        problem: submission.problem.trim().to_string(),
    };

    if let Err(errors) = cleaned.validate() {
        return Err(collect_messages(&errors));
    }

    let Some(date) = parse_submission_date(&cleaned.date) else {
        return Err(vec!["Invalid date".to_string()]);
    };

    Ok(NewBooking {
        date,
        time: cleaned.time,
        name: cleaned.name,
        phone: cleaned.phone,
        email: cleaned.email,
        problem: cleaned.problem,
    })
}

/// `DD.MM.YYYY` to a calendar date. Strict two-digit day and month.
pub fn parse_submission_date(raw: &str) -> Option<NaiveDate> {
    let captures = DATE_INPUT_RE.captures(raw.trim())?;
    let day = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let year = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM-DD` to a calendar date, as used by the admin endpoints.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let captures = ISO_DATE_RE.captures(raw.trim())?;
    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let day = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM` to a (year, month) pair with the month range checked.
pub fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let captures = MONTH_RE.captures(raw.trim())?;
    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?;
    Some((year, month))
}

fn collect_messages(errors: &ValidationErrors) -> Vec<String> {
    let field_errors = errors.field_errors();
    let mut messages = Vec::new();
    for field in FIELD_ORDER {
        if let Some(list) = field_errors.get(field) {
            for error in list.iter() {
                messages.push(describe(error));
            }
        }
    }
    messages
}

fn describe(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|message| message.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

fn violation(message: &'static str) -> ValidationError {
    ValidationError::new("invalid").with_message(Cow::Borrowed(message))
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(violation("Name is required"));
    }
    if !NAME_RE.is_match(name) {
        return Err(violation("Name contains invalid characters"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(violation("Phone is required"));
    }
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 11 || !digits.starts_with('7') {
        return Err(violation("Invalid phone number"));
    }
    Ok(())
}

fn validate_email_field(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(violation("Email is required"));
    }
    if !email.validate_email() {
        return Err(violation("Invalid email"));
    }
    Ok(())
}

fn validate_submission_date(date: &str) -> Result<(), ValidationError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(violation("Date is required"));
    }
    if !DATE_INPUT_RE.is_match(date) {
        return Err(violation("Invalid date format"));
    }
    if parse_submission_date(date).is_none() {
        return Err(violation("Invalid date"));
    }
    Ok(())
}

fn validate_slot_time(time: &str) -> Result<(), ValidationError> {
    let time = time.trim();
    if time.is_empty() {
        return Err(violation("Time is required"));
    }
    if !is_working_hour(time) {
        return Err(violation("Invalid time"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn submission() -> BookingSubmission {
        BookingSubmission {
            name: "Анна Иванова".to_string(),
            phone: "+7 (900) 123-45-67".to_string(),
            email: "anna@example.com".to_string(),
            date: "06.01.2099".to_string(),
            time: "10:00".to_string(),
            problem: "Ноутбук не включается".to_string(),
        }
    }

    #[test]
    fn valid_submission_becomes_a_new_booking() {
        let booking = validate_submission(&submission()).unwrap();
        assert_eq!(booking.date, NaiveDate::from_ymd_opt(2099, 1, 6).unwrap());
        assert_eq!(booking.time, "10:00");
        assert_eq!(booking.name, "Анна Иванова");
        assert_eq!(booking.problem, "Ноутбук не включается");
    }

    #[test]
    fn fields_are_trimmed_before_validation() {
        let mut raw = submission();
        raw.name = "  Anna  ".to_string();
        raw.date = " 06.01.2099 ".to_string();

        let booking = validate_submission(&raw).unwrap();
        assert_eq!(booking.name, "Anna");
        assert_eq!(booking.date, NaiveDate::from_ymd_opt(2099, 1, 6).unwrap());
    }

    #[test]
    fn empty_submission_reports_every_field_in_order() {
        let errors = validate_submission(&BookingSubmission::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Name is required",
                "Phone is required",
                "Email is required",
                "Date is required",
                "Time is required",
            ]
        );
    }

    #[test]
    fn all_violations_are_reported_not_just_the_first() {
        let mut raw = submission();
        raw.phone = "8-900-123-45-67".to_string();
        raw.time = "10:30".to_string();

        let errors = validate_submission(&raw).unwrap_err();
        assert_eq!(errors, vec!["Invalid phone number", "Invalid time"]);
    }

    #[test_case::test_case("Anna", true)]
    #[test_case::test_case("Анна Иванова", true)]
    #[test_case::test_case("Anna-Maria", true)]
    #[test_case::test_case("Anna123", false)]
    #[test_case::test_case("anna@", false)]
    #[test_case::test_case("", false)]
    fn name_rules(name: &str, valid: bool) {
        assert_eq!(validate_name(name).is_ok(), valid);
    }

    #[test_case::test_case("+7 (900) 123-45-67", true)]
    #[test_case::test_case("79001234567", true)]
    #[test_case::test_case("8-900-123-45-67", false)]
    #[test_case::test_case("7900123456", false)]
    #[test_case::test_case("790012345678", false)]
    #[test_case::test_case("", false)]
    fn phone_rules(phone: &str, valid: bool) {
        assert_eq!(validate_phone(phone).is_ok(), valid);
    }

    #[test_case::test_case("anna@example.com", true)]
    #[test_case::test_case("not-an-email", false)]
    #[test_case::test_case("", false)]
    fn email_rules(email: &str, valid: bool) {
        assert_eq!(validate_email_field(email).is_ok(), valid);
    }

    #[test_case::test_case("06.01.2099", None)]
    #[test_case::test_case("", Some("Date is required"))]
    #[test_case::test_case("2099-01-06", Some("Invalid date format"))]
    #[test_case::test_case("6.1.2099", Some("Invalid date format"))]
    #[test_case::test_case("31.02.2099", Some("Invalid date"))]
    #[test_case::test_case("00.01.2099", Some("Invalid date"))]
    fn submission_date_rules(raw: &str, expected: Option<&str>) {
        let message = validate_submission_date(raw)
            .err()
            .map(|error| describe(&error));
        assert_eq!(message.as_deref(), expected);
    }

    #[test_case::test_case("10:00", true)]
    #[test_case::test_case("17:00", true)]
    #[test_case::test_case("10:30", false)]
    #[test_case::test_case("18:00", false)]
    #[test_case::test_case("", false)]
    fn slot_time_rules(time: &str, valid: bool) {
        assert_eq!(validate_slot_time(time).is_ok(), valid);
    }

    #[test_case::test_case("2099-01", Some((2099, 1)))]
    #[test_case::test_case("2099-12", Some((2099, 12)))]
    #[test_case::test_case("2099-13", None)]
    #[test_case::test_case("2099-00", None)]
    #[test_case::test_case("2099-1", None)]
    #[test_case::test_case("january", None)]
    fn month_parsing(raw: &str, expected: Option<(i32, u32)>) {
        assert_eq!(parse_month(raw), expected);
    }

    #[test_case::test_case("2099-01-06", true)]
    #[test_case::test_case("2099-02-31", false)]
    #[test_case::test_case("06.01.2099", false)]
    #[test_case::test_case("2099-1-6", false)]
    fn iso_date_parsing(raw: &str, valid: bool) {
        assert_eq!(parse_iso_date(raw).is_some(), valid);
    }
}
