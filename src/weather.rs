//! Weather lookup passthrough and the static city list that feeds it.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

use crate::error::{ApiError, UpstreamPayload};
use crate::proxy::{ProxyClient, truncate_for_log};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct CityInfo {
    pub city: String,
    pub cityid: String,
}

#[derive(Debug, Clone, Default)]
pub struct CityList {
    cities: Vec<CityInfo>,
}

impl CityList {
    const BUILTIN: &'static str = include_str!("../data/cities.json");

    /// # Errors
    ///
    /// Returns an error if the embedded city list is malformed.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        let cities = serde_json::from_str(Self::BUILTIN)?;
        Ok(Self { cities })
    }

    #[must_use]
    pub fn all(&self) -> &[CityInfo] {
        &self.cities
    }

    /// Cities whose name contains `query`; everything for a blank query.
    #[must_use]
    pub fn search(
        &self,
        query: &str,
    ) -> Vec<CityInfo> {
        let query = query.trim();
        self.cities
            .iter()
            .filter(|c| query.is_empty() || c.city.contains(query))
            .cloned()
            .collect()
    }

    /// Maps a city name to the id the weather provider expects.
    #[must_use]
    pub fn resolve_city(
        &self,
        name: &str,
    ) -> Option<&str> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|c| c.city == name)
            .map(|c| c.cityid.as_str())
    }
}

impl ProxyClient {
    /// Looks up weather for a comma-separated list of city ids.
    ///
    /// The provider's status, content type and body come back unchanged: as `Ok` for 2xx
    /// and as [`ApiError::Upstream`] otherwise.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a blank `city_ids`, `Upstream` for provider errors, and
    /// `Timeout`/`Unreachable` when the provider cannot be reached.
    pub async fn forward_weather_lookup(
        &self,
        city_ids: &str,
    ) -> Result<UpstreamPayload, ApiError> {
        let city_ids = city_ids.trim();
        if city_ids.is_empty() {
            tracing::warn!(status = 400, "weather request rejected: blank cityIds");
            return Err(ApiError::bad_request("cityIds query parameter is required"));
        }

        let request_id = uuid::Uuid::new_v4();
        let url = &self.config().weather_url;
        let started = Instant::now();
        let builder = self
            .http()
            .get(url)
            .query(&[("cityIds", city_ids)])
            .timeout(self.config().weather_timeout);

        let reply = self.send(builder).await.inspect_err(|e| {
            tracing::error!(%request_id, url = %url, city_ids = %truncate_for_log(city_ids, 64), error = %e, "weather request failed");
        })?;

        tracing::info!(
            %request_id,
            url = %url,
            city_ids = %truncate_for_log(city_ids, 64),
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis(),
            "weather request forwarded"
        );

        if (200..300).contains(&reply.status) {
            Ok(reply)
        } else {
            Err(ApiError::Upstream(reply))
        }
    }
}
