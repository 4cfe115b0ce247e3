//! Booking form model: the draft being edited and the wire types around it.

pub mod catalog;
pub mod controller;
pub mod validate;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Date format accepted in the form and sent to the backend.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wall-clock time format (hour:minute).
pub const TIME_FORMAT: &str = "%H:%M";

/// Form fields in display and focus order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Phone,
    Service,
    Date,
    Time,
    Address,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Phone,
        Field::Service,
        Field::Date,
        Field::Time,
        Field::Address,
    ];

    /// Label shown next to the field.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Full Name",
            Field::Phone => "Phone",
            Field::Service => "Service",
            Field::Date => "Date",
            Field::Time => "Time",
            Field::Address => "Address",
        }
    }

    /// Prompt used by the input box when editing this field.
    pub fn prompt(self) -> &'static str {
        match self {
            Field::Name => "Full name:",
            Field::Phone => "Phone (10 digits):",
            Field::Service => "Search services:",
            Field::Date => "Date (YYYY-MM-DD):",
            Field::Time => "Time (HH:MM):",
            Field::Address => "Address:",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// Next field, wrapping around.
    pub fn next(self) -> Field {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous field, wrapping around.
    pub fn prev(self) -> Field {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// The single mutable entity of a form session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDraft {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub address: String,
}

impl BookingDraft {
    /// Fresh draft with date/time taken from `now` (truncated to minutes).
    pub fn new(service: impl Into<String>, now: NaiveDateTime) -> Self {
        let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0);
        Self {
            name: String::new(),
            phone: String::new(),
            service: service.into(),
            date: Some(now.date()),
            time,
            address: String::new(),
        }
    }

    /// Fresh draft stamped with the local clock.
    pub fn starting_now(service: impl Into<String>) -> Self {
        Self::new(service, chrono::Local::now().naive_local())
    }

    /// Current value of a field as text.
    pub fn display(&self, field: Field) -> String {
        match field {
            Field::Name => self.name.clone(),
            Field::Phone => self.phone.clone(),
            Field::Service => self.service.clone(),
            Field::Date => self
                .date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            Field::Time => self
                .time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            Field::Address => self.address.clone(),
        }
    }
}

/// JSON body of `POST /api/bookings/create`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub address: String,
}

impl BookingRequest {
    /// Snapshot of the draft; `None` when date or time is missing.
    pub fn from_draft(draft: &BookingDraft) -> Option<Self> {
        let date = draft.date?;
        let time = draft.time?;
        Some(Self {
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            service: draft.service.clone(),
            date: date.format(DATE_FORMAT).to_string(),
            time: time.format(TIME_FORMAT).to_string(),
            address: draft.address.clone(),
        })
    }
}

/// One entry of `GET /api/bookings/mybookings`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BookingRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(hh, mm, ss))
            .expect("valid timestamp")
    }

    #[test]
    fn test_new_draft_defaults_to_now_truncated_to_minutes() {
        let draft = BookingDraft::new("Fan Repair", at(2025, 1, 10, 10, 30, 59));
        assert_eq!(draft.display(Field::Date), "2025-01-10");
        assert_eq!(draft.display(Field::Time), "10:30");
        assert_eq!(draft.service, "Fan Repair");
        assert!(draft.name.is_empty() && draft.phone.is_empty() && draft.address.is_empty());
    }

    #[test]
    fn test_request_body_uses_wire_formats() {
        let mut draft = BookingDraft::new("AC Repair", at(2025, 3, 2, 9, 5, 0));
        draft.name = "Asha".into();
        let req = BookingRequest::from_draft(&draft).expect("date and time present");
        let json = serde_json::to_value(&req).expect("serializable");
        assert_eq!(json["date"], "2025-03-02");
        assert_eq!(json["time"], "09:05");
        assert_eq!(json["service"], "AC Repair");

        draft.time = None;
        assert!(BookingRequest::from_draft(&draft).is_none());
    }

    #[test]
    fn test_focus_order_wraps() {
        assert_eq!(Field::Address.next(), Field::Name);
        assert_eq!(Field::Name.prev(), Field::Address);
        assert_eq!(Field::Phone.next(), Field::Service);
    }

    #[test]
    fn test_booking_record_reads_mongo_id() {
        let rec: BookingRecord = serde_json::from_str(
            r#"{"_id":"abc","service":"Fan Repair","date":"2025-01-10","time":"10:30","status":"Upcoming","extra":1}"#,
        )
        .expect("parse");
        assert_eq!(rec.id, "abc");
        assert_eq!(rec.status, "Upcoming");
    }
}
