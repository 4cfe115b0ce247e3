//! Booking form controller: field state, validation, address detection and
//! the submission lifecycle of a single form session.
//!
//! Network work never happens here. `begin_*` methods decide whether an
//! operation may start and hand back what the worker needs; `finish_*`
//! methods apply the worker's result. A disposed controller ignores every
//! late result.

use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use super::{
    BookingDraft, BookingRequest, DATE_FORMAT, Field, TIME_FORMAT,
    validate::{ValidationState, validate_all, validate_field},
};
use crate::error::{DetectionError, SubmitError};

/// Where the submission lifecycle currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
}

/// A blocking message waiting for the user to acknowledge it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
}

pub struct BookingController {
    session: Uuid,
    draft: BookingDraft,
    errors: ValidationState,
    state: SubmissionState,
    detecting: bool,
    geolocation_supported: bool,
    redirect_delay: Duration,
    redirect_at: Option<Instant>,
    in_flight: Option<BookingRequest>,
    last_booking: Option<BookingRequest>,
    notice: Option<Notice>,
    disposed: bool,
}

impl BookingController {
    pub fn new(draft: BookingDraft, geolocation_supported: bool, redirect_delay: Duration) -> Self {
        Self {
            session: Uuid::new_v4(),
            draft,
            errors: ValidationState::new(),
            state: SubmissionState::Idle,
            detecting: false,
            geolocation_supported,
            redirect_delay,
            redirect_at: None,
            in_flight: None,
            last_booking: None,
            notice: None,
            disposed: false,
        }
    }

    /// Identifies this form session in worker commands and events.
    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationState {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The booking accepted by the backend in this session, if any.
    pub fn last_booking(&self) -> Option<&BookingRequest> {
        self.last_booking.as_ref()
    }

    /// Dismiss the pending notice.
    pub fn acknowledge(&mut self) {
        self.notice = None;
    }

    /// Replace a text field from user input.
    ///
    /// Date and time must parse; an empty value clears them. On a parse
    /// error the previous value is kept and a hint is returned.
    pub fn set_field(&mut self, field: Field, raw: &str) -> Result<(), String> {
        if self.disposed {
            return Ok(());
        }
        let value = raw.trim();
        match field {
            Field::Name => self.draft.name = raw.to_string(),
            Field::Phone => self.draft.phone = raw.to_string(),
            Field::Address => self.draft.address = raw.to_string(),
            Field::Service => self.draft.service = value.to_string(),
            Field::Date if value.is_empty() => self.draft.date = None,
            Field::Date => {
                let d = NaiveDate::parse_from_str(value, DATE_FORMAT)
                    .map_err(|_| "Use the YYYY-MM-DD format".to_string())?;
                self.draft.date = Some(d);
            }
            Field::Time if value.is_empty() => self.draft.time = None,
            Field::Time => {
                let t = NaiveTime::parse_from_str(value, TIME_FORMAT)
                    .map_err(|_| "Use the HH:MM format".to_string())?;
                self.draft.time = Some(t);
            }
        }
        Ok(())
    }

    /// Field lost focus: refresh that field's error only.
    pub fn blur(&mut self, field: Field) {
        if self.disposed {
            return;
        }
        match validate_field(field, &self.draft) {
            Some(msg) => {
                self.errors.insert(field, msg);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Try to start a submission.
    ///
    /// Returns the request to send, `Ok(None)` when a submission is already
    /// running (or the session is over), or `Invalid` with every failing
    /// field when the draft does not validate.
    pub fn begin_submit(&mut self) -> Result<Option<BookingRequest>, SubmitError> {
        if self.disposed || self.state != SubmissionState::Idle {
            tracing::debug!(state = ?self.state, "submit ignored");
            return Ok(None);
        }

        self.errors = validate_all(&self.draft);
        if !self.errors.is_empty() {
            tracing::info!(fields = self.errors.len(), "submit refused: validation failed");
            return Err(SubmitError::Invalid(self.errors.clone()));
        }
        let Some(request) = BookingRequest::from_draft(&self.draft) else {
            return Err(SubmitError::Invalid(self.errors.clone()));
        };

        self.state = SubmissionState::Submitting;
        self.in_flight = Some(request.clone());
        tracing::info!(session = %self.session, service = %request.service, "submitting booking");
        Ok(Some(request))
    }

    /// Apply the backend's answer to the running submission.
    pub fn finish_submit(&mut self, result: Result<(), SubmitError>, now: Instant) {
        if self.disposed || self.state != SubmissionState::Submitting {
            return;
        }
        let sent = self.in_flight.take();
        match result {
            Ok(()) => {
                self.state = SubmissionState::Succeeded;
                // Keep service/date/time, clear who and where.
                self.draft.name.clear();
                self.draft.phone.clear();
                self.draft.address.clear();
                self.last_booking = sent;
                self.redirect_at = Some(now + self.redirect_delay);
                tracing::info!(session = %self.session, "booking created");
            }
            Err(SubmitError::Invalid(errors)) => {
                self.state = SubmissionState::Idle;
                self.errors = errors;
            }
            Err(e) => {
                self.state = SubmissionState::Idle;
                tracing::warn!(session = %self.session, "booking failed: {e}");
                self.notice = Some(Notice {
                    title: "Booking failed",
                    message: e.to_string(),
                });
            }
        }
    }

    /// Try to start address detection.
    ///
    /// `Ok(true)` means the worker should be asked for a position,
    /// `Ok(false)` that detection is already running.
    pub fn begin_detect(&mut self) -> Result<bool, DetectionError> {
        if self.disposed {
            return Ok(false);
        }
        if !self.geolocation_supported {
            let e = DetectionError::Unsupported;
            self.notice = Some(Notice {
                title: "Location",
                message: e.to_string(),
            });
            return Err(e);
        }
        if self.detecting {
            return Ok(false);
        }
        self.detecting = true;
        Ok(true)
    }

    /// Apply the outcome of a detection. Always leaves `Detecting`.
    pub fn finish_detect(&mut self, result: Result<String, DetectionError>) {
        if self.disposed {
            return;
        }
        self.detecting = false;
        match result {
            Ok(address) => {
                self.draft.address = address;
                self.errors.remove(&Field::Address);
            }
            Err(e) => {
                tracing::warn!(session = %self.session, "address detection failed: {e}");
                self.notice = Some(Notice {
                    title: "Location",
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn redirect_pending(&self) -> bool {
        self.redirect_at.is_some()
    }

    /// True exactly once, when the post-success redirect is due.
    pub fn poll_redirect(&mut self, now: Instant) -> bool {
        match self.redirect_at {
            Some(at) if now >= at => {
                self.redirect_at = None;
                true
            }
            _ => false,
        }
    }

    /// Tear the session down: cancel the redirect, drop busy flags, and
    /// ignore anything that arrives later.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.detecting = false;
        self.redirect_at = None;
        self.in_flight = None;
        if self.state == SubmissionState::Submitting {
            self.state = SubmissionState::Idle;
        }
    }
}
