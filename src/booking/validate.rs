//! Field rules shared by blur feedback and whole-form validation.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use super::{BookingDraft, Field};

/// Field -> error message. A missing key means the field passes.
pub type ValidationState = BTreeMap<Field, String>;

// ASCII digits only; `\d` would also accept other scripts.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

/// Check one field of the draft.
pub fn validate_field(field: Field, draft: &BookingDraft) -> Option<String> {
    let msg = match field {
        Field::Name if draft.name.trim().is_empty() => "Name is required",
        Field::Phone => {
            let phone = draft.phone.trim();
            if phone.is_empty() {
                "Phone number is required"
            } else if !PHONE_RE.is_match(phone) {
                "Enter a valid 10-digit phone number"
            } else {
                return None;
            }
        }
        Field::Date if draft.date.is_none() => "Date is required",
        Field::Time if draft.time.is_none() => "Time is required",
        Field::Address if draft.address.trim().is_empty() => "Address is required",
        _ => return None,
    };
    Some(msg.to_string())
}

/// Check every field. Empty result means the draft may be submitted.
pub fn validate_all(draft: &BookingDraft) -> ValidationState {
    Field::ALL
        .iter()
        .filter_map(|&f| validate_field(f, draft).map(|msg| (f, msg)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn valid_draft() -> BookingDraft {
        BookingDraft {
            name: "Asha".into(),
            phone: "9876543210".into(),
            service: "Fan Repair".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10),
            time: NaiveTime::from_hms_opt(10, 30, 0),
            address: "12 Lane".into(),
        }
    }

    fn phone_error(phone: &str) -> Option<String> {
        let mut d = valid_draft();
        d.phone = phone.into();
        validate_field(Field::Phone, &d)
    }

    #[test]
    fn test_phone_rules() {
        assert_eq!(phone_error("1234567890"), None);
        assert_eq!(phone_error(" 1234567890 "), None);
        for bad in ["123456789", "12345678901", "12345abcde", "١٢٣٤٥٦٧٨٩٠"] {
            assert_eq!(
                phone_error(bad).as_deref(),
                Some("Enter a valid 10-digit phone number"),
                "{bad}"
            );
        }
        assert_eq!(phone_error("").as_deref(), Some("Phone number is required"));
        assert_eq!(phone_error("   ").as_deref(), Some("Phone number is required"));
    }

    #[test]
    fn test_empty_draft_reports_every_required_field() {
        let d = BookingDraft {
            name: " ".into(),
            phone: String::new(),
            service: "Fan Repair".into(),
            date: None,
            time: None,
            address: "\t".into(),
        };
        let errors = validate_all(&d);
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[&Field::Name], "Name is required");
        assert_eq!(errors[&Field::Date], "Date is required");
        assert_eq!(errors[&Field::Time], "Time is required");
        assert_eq!(errors[&Field::Address], "Address is required");
        assert!(!errors.contains_key(&Field::Service));
    }

    #[test]
    fn test_whole_form_agrees_with_field_rules() {
        let mut drafts = vec![valid_draft()];
        let mut d = valid_draft();
        d.name.clear();
        drafts.push(d);
        let mut d = valid_draft();
        d.phone = "12345".into();
        drafts.push(d);
        let mut d = valid_draft();
        d.date = None;
        d.address.clear();
        drafts.push(d);

        for d in &drafts {
            let all = validate_all(d);
            let each_passes = Field::ALL.iter().all(|&f| validate_field(f, d).is_none());
            assert_eq!(all.is_empty(), each_passes);
            // Same input, same output.
            assert_eq!(all, validate_all(d));
        }
    }
}
