use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use crate::config::GeoConfig;

/// Placeholder stored when a location cannot be resolved
pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Network lookups that turn coordinates or addresses into place names.
/// Both lookups fall back to [`UNKNOWN_LOCATION`] instead of failing.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String;

    /// Location of the uploading client, or of this server when the client
    /// address is unknown or not publicly routable.
    async fn upload_location(&self, client_ip: Option<IpAddr>) -> String;
}

/// Nominatim for reverse geocoding, ipinfo for IP lookups.
#[derive(Clone)]
pub struct HttpGeolocator {
    agent: ureq::Agent,
    config: GeoConfig,
}

impl HttpGeolocator {
    pub fn new(config: &GeoConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            config: config.clone(),
        }
    }

    fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, GeoError> {
        let mut request = self
            .agent
            .get(url)
            .header("User-Agent", self.config.user_agent.as_str());
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let mut response = request.call()?;
        let body = response.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn lookup_address(&self, latitude: f64, longitude: f64) -> Result<String, GeoError> {
        let response = self.fetch_json(
            &self.config.reverse_geocode_url,
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("accept-language", "en".to_string()),
            ],
        )?;
        display_name(&response).ok_or(GeoError::MissingField("display_name"))
    }

    fn lookup_ip_location(&self, client_ip: Option<IpAddr>) -> Result<String, GeoError> {
        let ip = match client_ip.filter(is_publicly_routable) {
            Some(ip) => ip.to_string(),
            None => self.public_ip()?,
        };

        let url = format!("{}/{}/json", self.config.ip_info_url.trim_end_matches('/'), ip);
        let info = self.fetch_json(&url, &[])?;
        Ok(place_from_ip_info(&info))
    }

    fn public_ip(&self) -> Result<String, GeoError> {
        let response = self.fetch_json(&self.config.ip_echo_url, &[])?;
        response["ip"]
            .as_str()
            .map(str::to_string)
            .ok_or(GeoError::MissingField("ip"))
    }
}

#[async_trait]
impl Geolocator for HttpGeolocator {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        let this = self.clone();
        let result = tokio::task::spawn_blocking(move || this.lookup_address(latitude, longitude))
            .await
            .map_err(GeoError::from)
            .and_then(|inner| inner);

        match result {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding of {}, {} failed: {}", latitude, longitude, e);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }

    async fn upload_location(&self, client_ip: Option<IpAddr>) -> String {
        let this = self.clone();
        let result = tokio::task::spawn_blocking(move || this.lookup_ip_location(client_ip))
            .await
            .map_err(GeoError::from)
            .and_then(|inner| inner);

        match result {
            Ok(place) => {
                debug!("Upload location for {:?}: {}", client_ip, place);
                place
            }
            Err(e) => {
                warn!("IP location lookup failed: {}", e);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

fn display_name(response: &Value) -> Option<String> {
    response["display_name"]
        .as_str()
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

/// `"<city>, <region>"`, each part defaulting to `Unknown`
fn place_from_ip_info(info: &Value) -> String {
    let city = info["city"].as_str().unwrap_or(UNKNOWN_LOCATION);
    let region = info["region"].as_str().unwrap_or(UNKNOWN_LOCATION);
    format!("{}, {}", city, region)
}

fn is_publicly_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            // 100.64.0.0/10 carrier-grade NAT
            let shared = v4.octets()[0] == 100 && v4.octets()[1] & 0xc0 == 64;
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || shared)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_publicly_routable(&IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Client address as reported by a reverse proxy: first `X-Forwarded-For`
/// entry, else `X-Real-IP`.
pub fn client_ip_from_headers(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
) -> Option<IpAddr> {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| real_ip.and_then(|ip| ip.trim().parse().ok()))
}
