//! Reverse geocoding through a Nominatim-compatible service.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Coordinates, Geocoder};
use crate::config::GeocodingCfg;

/// The only field we read from the reverse response.
#[derive(Debug, Deserialize)]
struct ReverseResp {
    #[serde(default)]
    display_name: Option<String>,
}

pub struct Nominatim {
    http: Client,
    reverse_url: String,
    language: String,
}

impl Nominatim {
    pub fn new(http: Client, cfg: &GeocodingCfg) -> Self {
        Self {
            http,
            reverse_url: cfg.reverse_url.clone(),
            language: cfg.language.clone(),
        }
    }

    fn reverse_url(&self, at: Coordinates) -> String {
        format!(
            "{}?format=json&lat={}&lon={}&accept-language={}",
            self.reverse_url,
            at.latitude,
            at.longitude,
            urlencoding::encode(&self.language)
        )
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    async fn reverse(&self, at: Coordinates) -> Result<String> {
        let resp = self
            .http
            .get(self.reverse_url(at))
            .send()
            .await?
            .json::<ReverseResp>()
            .await?;
        // A response without a place name yields an empty address.
        Ok(resp.display_name.unwrap_or_default())
    }
}
