//! Background worker performing the network side of the booking flow.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    api::{BookingApi, Capabilities, Geocoder, Geolocator, PositionOptions},
    booking::{BookingRecord, BookingRequest},
    error::{BookingsRejected, DetectionError, PositionError, SubmitError},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// POST a validated booking for the given form session.
    SubmitBooking {
        session: Uuid,
        request: BookingRequest,
    },
    /// Locate the device and reverse-geocode it.
    DetectAddress { session: Uuid },
    /// Fetch the bookings list.
    LoadBookings,
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    SubmitFinished {
        session: Uuid,
        result: Result<(), SubmitError>,
    },
    AddressDetected {
        session: Uuid,
        result: Result<String, DetectionError>,
    },
    BookingsLoaded(Vec<BookingRecord>),
    /// User-visible error message.
    Error(String),
}

/// Main worker loop. Each command runs in its own task so a detection and a
/// submission can be in flight together.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    caps: Capabilities,
) {
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        let caps = caps.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            handle(cmd, &caps, &tx).await;
        });
    }

    tracing::info!("worker stopped");
}

async fn handle(cmd: WorkerCmd, caps: &Capabilities, tx: &mpsc::Sender<WorkerEvent>) {
    match cmd {
        WorkerCmd::SubmitBooking { session, request } => {
            tracing::info!("submit booking start: {session}");
            let result = submit_booking(caps.bookings.as_ref(), &request).await;
            match &result {
                Ok(()) => tracing::info!("submit booking done: {session}"),
                Err(e) => tracing::warn!("submit booking failed: {session}: {e}"),
            }
            let _ = tx.send(WorkerEvent::SubmitFinished { session, result }).await;
        }

        WorkerCmd::DetectAddress { session } => {
            tracing::info!("detect address start: {session}");
            let result = match &caps.geolocator {
                Some(locator) => {
                    detect_address(
                        locator.as_ref(),
                        caps.geocoder.as_ref(),
                        &caps.position_options,
                    )
                    .await
                }
                None => Err(DetectionError::Unsupported),
            };
            if let Err(e) = &result {
                tracing::warn!("detect address failed: {session}: {e}");
            }
            let _ = tx.send(WorkerEvent::AddressDetected { session, result }).await;
        }

        WorkerCmd::LoadBookings => {
            tracing::info!("load bookings");
            match caps.bookings.my_bookings().await {
                Ok(list) => {
                    tracing::info!("bookings loaded: {}", list.len());
                    let _ = tx.send(WorkerEvent::BookingsLoaded(list)).await;
                }
                Err(e) => {
                    tracing::error!("bookings load failed: {e}");
                    let _ = tx.send(WorkerEvent::Error(bookings_error_message(&e))).await;
                }
            }
        }
    }
}

/// POST the booking and classify the outcome.
pub async fn submit_booking(
    api: &dyn BookingApi,
    request: &BookingRequest,
) -> Result<(), SubmitError> {
    match api.create_booking(request).await {
        Ok(reply) if reply.is_success() => Ok(()),
        Ok(reply) => Err(SubmitError::Rejected(reply.body)),
        Err(e) => {
            tracing::debug!("no response from backend: {e}");
            Err(SubmitError::Network)
        }
    }
}

/// Text shown when the bookings list cannot be loaded. The server's own
/// message is shown alone; transport and parse failures get a prefix.
pub fn bookings_error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<BookingsRejected>() {
        Some(rejected) => rejected.to_string(),
        None => format!("Error fetching bookings: {e}"),
    }
}

/// Locate the device, then turn the coordinates into an address.
pub async fn detect_address(
    locator: &dyn Geolocator,
    geocoder: &dyn Geocoder,
    options: &PositionOptions,
) -> Result<String, DetectionError> {
    let position = tokio::time::timeout(options.timeout, locator.current_position(options))
        .await
        .unwrap_or(Err(PositionError::Timeout))?;
    tracing::debug!(
        "position fix: {:.5},{:.5}",
        position.latitude,
        position.longitude
    );

    geocoder.reverse(position).await.map_err(|e| {
        tracing::debug!("reverse geocoding failed: {e}");
        DetectionError::Geocoding
    })
}
