//! Shared value types for the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-user key for rate limiting and pending-intent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl From<places_client::LatLng> for GeoPoint {
    fn from(p: places_client::LatLng) -> Self {
        Self::new(p.latitude, p.longitude)
    }
}

/// Image bytes plus their MIME type, as sent to the AI backend.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

// Bytes are noise in logs
impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlob")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// A user-supplied location reference. Ephemeral.
#[derive(Debug, Clone)]
pub enum RawInput {
    Link { url: String, identity: Identity },
    Image { bytes: Vec<u8>, identity: Identity },
}

impl RawInput {
    pub fn link(url: impl Into<String>, identity: impl Into<Identity>) -> Self {
        Self::Link {
            url: url.into(),
            identity: identity.into(),
        }
    }

    pub fn image(bytes: Vec<u8>, identity: impl Into<Identity>) -> Self {
        Self::Image {
            bytes,
            identity: identity.into(),
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            Self::Link { identity, .. } | Self::Image { identity, .. } => *identity,
        }
    }
}
