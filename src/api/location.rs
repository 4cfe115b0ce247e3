//! Geolocation sources for hosts without a GPS API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use super::{Coordinates, Geolocator, PositionOptions};
use crate::{
    config::{GeolocationCfg, LocationSource},
    error::PositionError,
};

/// Build the configured source; `None` when geolocation is switched off.
pub fn from_config(http: Client, cfg: &GeolocationCfg) -> Option<Arc<dyn Geolocator>> {
    match cfg.source {
        LocationSource::Off => None,
        LocationSource::Fixed => Some(Arc::new(FixedLocation::new(cfg.latitude, cfg.longitude))),
        LocationSource::Ip => Some(Arc::new(IpLocation::new(http, cfg.lookup_url.clone()))),
    }
}

/// Coordinates written in the config file.
pub struct FixedLocation {
    at: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let at = latitude.zip(longitude).map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        });
        Self { at }
    }
}

#[async_trait]
impl Geolocator for FixedLocation {
    async fn current_position(&self, _: &PositionOptions) -> Result<Coordinates, PositionError> {
        self.at.ok_or(PositionError::PositionUnavailable)
    }
}

/// ip-api.com style answer.
#[derive(Debug, Deserialize)]
struct IpLookupResp {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLookupResp {
    fn into_coordinates(self) -> Result<Coordinates, PositionError> {
        if self.status.as_deref().is_some_and(|s| s != "success") {
            tracing::warn!("ip lookup refused: {}", self.message.unwrap_or_default());
            return Err(PositionError::PositionUnavailable);
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(PositionError::PositionUnavailable),
        }
    }
}

/// Approximate position from the public IP address.
///
/// The last fix is reused while it is younger than `maximum_age`; zero
/// always performs a fresh lookup.
pub struct IpLocation {
    http: Client,
    lookup_url: String,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl IpLocation {
    pub fn new(http: Client, lookup_url: String) -> Self {
        Self {
            http,
            lookup_url,
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self, maximum_age: Duration, now: Instant) -> Option<Coordinates> {
        if maximum_age.is_zero() {
            return None;
        }
        let last = *self.last_fix.lock().ok()?;
        last.filter(|(at, _)| now.saturating_duration_since(*at) <= maximum_age)
            .map(|(_, pos)| pos)
    }

    fn remember(&self, pos: Coordinates, now: Instant) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((now, pos));
        }
    }
}

#[async_trait]
impl Geolocator for IpLocation {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        if let Some(pos) = self.cached(options.maximum_age, Instant::now()) {
            tracing::debug!("reusing cached ip position");
            return Ok(pos);
        }
        let resp = self
            .http
            .get(&self.lookup_url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PositionError::Timeout
                } else {
                    tracing::warn!("ip lookup failed: {e}");
                    PositionError::PositionUnavailable
                }
            })?;
        let body = resp
            .json::<IpLookupResp>()
            .await
            .map_err(|e| PositionError::Other(e.to_string()))?;
        let pos = body.into_coordinates()?;
        self.remember(pos, Instant::now());
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PositionOptions {
        PositionOptions {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_fixed_location_needs_both_coordinates() {
        let full = FixedLocation::new(Some(12.5), Some(77.25));
        assert_eq!(
            full.current_position(&opts()).await,
            Ok(Coordinates {
                latitude: 12.5,
                longitude: 77.25
            })
        );
        let half = FixedLocation::new(Some(12.5), None);
        assert_eq!(
            half.current_position(&opts()).await,
            Err(PositionError::PositionUnavailable)
        );
    }

    #[test]
    fn test_ip_lookup_failure_is_unavailable() {
        let r: IpLookupResp =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).expect("parse");
        assert_eq!(r.into_coordinates(), Err(PositionError::PositionUnavailable));

        let r: IpLookupResp =
            serde_json::from_str(r#"{"status":"success","lat":19.07,"lon":72.87}"#).expect("parse");
        assert_eq!(
            r.into_coordinates(),
            Ok(Coordinates {
                latitude: 19.07,
                longitude: 72.87
            })
        );
    }

    #[test]
    fn test_ip_fix_reused_only_within_maximum_age() {
        let ip = IpLocation::new(Client::new(), "http://127.0.0.1:9/json".into());
        let t0 = Instant::now();
        let here = Coordinates {
            latitude: 19.07,
            longitude: 72.87,
        };
        assert_eq!(ip.cached(Duration::from_secs(60), t0), None);

        ip.remember(here, t0);
        // Zero forces a fresh lookup.
        assert_eq!(ip.cached(Duration::ZERO, t0), None);
        assert_eq!(
            ip.cached(Duration::from_secs(60), t0 + Duration::from_secs(30)),
            Some(here)
        );
        assert_eq!(
            ip.cached(Duration::from_secs(60), t0 + Duration::from_secs(61)),
            None
        );
    }

    #[test]
    fn test_off_means_no_capability() {
        let mut cfg = crate::config::Config::default().geolocation;
        cfg.source = LocationSource::Off;
        assert!(from_config(Client::new(), &cfg).is_none());
    }
}
