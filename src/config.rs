//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::api::PositionOptions;

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Booking backend.
    pub backend: BackendCfg,
    /// Reverse-geocoding service used by address detection.
    pub geocoding: GeocodingCfg,
    /// Where the device position comes from.
    pub geolocation: GeolocationCfg,
    /// Form behaviour.
    pub booking: BookingCfg,
    /// Service catalog; the first entry is the form default.
    pub services: Vec<ServiceCfg>,
}

/// Booking backend location and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCfg {
    /// Base URL without trailing slash, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Value of the `Authorization` header for the bookings list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Reverse-geocoding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingCfg {
    pub reverse_url: String,
    /// Value for `accept-language`.
    pub language: String,
    /// Nominatim rejects requests without an identifying agent.
    pub user_agent: String,
}

/// Position source of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// No geolocation capability.
    Off,
    /// Coordinates from this file.
    Fixed,
    /// Lookup by public IP address.
    Ip,
}

/// Geolocation capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationCfg {
    pub source: LocationSource,
    /// Used when `source = "fixed"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Used when `source = "fixed"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Used when `source = "ip"`; must answer `{"lat": .., "lon": ..}`.
    pub lookup_url: String,
    /// Precision hint. The fixed and IP sources each have a single
    /// accuracy, so neither reads it.
    pub high_accuracy: bool,
    /// Upper bound on waiting for a position.
    pub timeout_ms: u64,
    /// How old a reused IP fix may be; 0 always looks up afresh.
    pub maximum_age_ms: u64,
}

impl GeolocationCfg {
    /// Options passed with every position request.
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

/// Booking form behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCfg {
    /// Delay before returning home after a successful booking.
    pub redirect_delay_secs: u64,
}

/// One bookable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCfg {
    pub name: String,
    /// Estimated price in rupees.
    pub price: u32,
}

impl ServiceCfg {
    /// Built-in catalog.
    pub fn defaults() -> Vec<Self> {
        [
            ("Fan Repair", 499),
            ("AC Repair", 1299),
            ("Switch Repair", 299),
            ("Light Installation", 399),
        ]
        .into_iter()
        .map(|(name, price)| Self {
            name: name.into(),
            price,
        })
        .collect()
    }
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_secs(self.booking.redirect_delay_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendCfg {
                base_url: "http://localhost:5000".into(),
                auth_token: None,
            },
            geocoding: GeocodingCfg {
                reverse_url: "https://nominatim.openstreetmap.org/reverse".into(),
                language: "en".into(),
                user_agent: concat!("wireup_booking/", env!("CARGO_PKG_VERSION")).into(),
            },
            geolocation: GeolocationCfg {
                source: LocationSource::Ip,
                latitude: None,
                longitude: None,
                lookup_url: "http://ip-api.com/json".into(),
                high_accuracy: true,
                timeout_ms: 10_000,
                maximum_age_ms: 0,
            },
            booking: BookingCfg {
                redirect_delay_secs: 5,
            },
            services: ServiceCfg::defaults(),
        }
    }
}
