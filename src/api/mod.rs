//! Host capabilities the booking flow depends on, and their HTTP-backed
//! implementations.

pub mod backend;
pub mod location;
pub mod nominatim;

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::{
    booking::{BookingRecord, BookingRequest},
    error::PositionError,
};

/// Latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// How a position should be acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest acceptable cached position; zero forces a fresh fix.
    pub maximum_age: Duration,
}

/// Status and raw body of a backend response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Booking backend.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Send a booking. `Err` means no response was received.
    async fn create_booking(&self, request: &BookingRequest) -> anyhow::Result<BackendReply>;

    /// Bookings of the configured account.
    async fn my_bookings(&self) -> anyhow::Result<Vec<BookingRecord>>;
}

/// Coordinates to a human-readable place name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, at: Coordinates) -> anyhow::Result<String>;
}

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinates, PositionError>;
}

/// Everything the worker needs to talk to the outside world.
#[derive(Clone)]
pub struct Capabilities {
    pub bookings: Arc<dyn BookingApi>,
    pub geocoder: Arc<dyn Geocoder>,
    /// `None` when the host cannot locate itself.
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub position_options: PositionOptions,
}

impl Capabilities {
    /// Wire the HTTP implementations from config.
    pub fn from_config(cfg: &crate::config::Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.geocoding.user_agent.clone())
            .build()?;
        Ok(Self {
            bookings: Arc::new(backend::BackendClient::new(http.clone(), &cfg.backend)),
            geocoder: Arc::new(nominatim::Nominatim::new(http.clone(), &cfg.geocoding)),
            geolocator: location::from_config(http, &cfg.geolocation),
            position_options: cfg.geolocation.position_options(),
        })
    }
}
