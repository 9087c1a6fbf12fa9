//! Provider photo acquisition.
//!
//! Two-step protocol: resolve the photo reference to a direct URI, then
//! download it. Any failure means "image unavailable", never a pipeline error.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::fetch::WebFetcher;
use crate::lookup::PlacesLookup;
use crate::types::ImageBlob;

/// Longest side requested from the photo endpoint.
pub const MAX_PHOTO_PX: u32 = 800;

pub struct MediaAcquirer {
    lookup: Arc<dyn PlacesLookup>,
    fetcher: Arc<dyn WebFetcher>,
    timeout: Duration,
}

impl MediaAcquirer {
    pub fn new(lookup: Arc<dyn PlacesLookup>, fetcher: Arc<dyn WebFetcher>, timeout: Duration) -> Self {
        Self {
            lookup,
            fetcher,
            timeout,
        }
    }

    pub async fn fetch_provider_photo(&self, photo_ref: &str) -> Option<ImageBlob> {
        let uri = match self.lookup.photo_uri(photo_ref, MAX_PHOTO_PX).await {
            Ok(Some(uri)) => uri,
            Ok(None) => {
                debug!(photo_ref = %photo_ref, "Photo media response had no URI");
                return None;
            }
            Err(e) => {
                warn!(photo_ref = %photo_ref, error = %e, "Photo URI resolution failed");
                return None;
            }
        };

        match self.fetcher.get(&uri, self.timeout).await {
            Ok(response) if response.status == 200 => Some(response.into_image()),
            Ok(response) => {
                warn!(photo_ref = %photo_ref, status = response.status, "Photo download rejected");
                None
            }
            Err(e) => {
                warn!(photo_ref = %photo_ref, error = %e, "Photo download failed");
                None
            }
        }
    }

    /// Fetch up to `limit` photos in order, skipping any that fail.
    pub async fn fetch_provider_photos(&self, photo_refs: &[&str], limit: usize) -> Vec<ImageBlob> {
        let mut images = Vec::new();
        for photo_ref in photo_refs.iter().take(limit) {
            if let Some(image) = self.fetch_provider_photo(photo_ref).await {
                images.push(image);
            }
        }
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPlacesLookup, MockWebFetcher};
    use places_client::PlacesError;

    const PHOTO: &str = "places/abc/photos/p1";
    const URI: &str = "https://lh3.googleusercontent.com/p/photo1";

    fn acquirer(lookup: MockPlacesLookup, fetcher: MockWebFetcher) -> MediaAcquirer {
        MediaAcquirer::new(Arc::new(lookup), Arc::new(fetcher), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_two_step_fetch() {
        let lookup = MockPlacesLookup::new().with_photo(PHOTO, URI);
        let fetcher = MockWebFetcher::new().with_image(URI, b"png-bytes", "image/png");

        let image = acquirer(lookup, fetcher).fetch_provider_photo(PHOTO).await.unwrap();

        assert_eq!(image.bytes, b"png-bytes".to_vec());
        assert_eq!(image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_uri_step_non_200_yields_none() {
        let lookup = MockPlacesLookup::new().with_photo_error(
            PHOTO,
            PlacesError::Api {
                status: 403,
                message: "forbidden".into(),
            },
        );
        let fetcher = MockWebFetcher::new();

        assert!(acquirer(lookup, fetcher).fetch_provider_photo(PHOTO).await.is_none());
    }

    #[tokio::test]
    async fn test_download_step_non_200_yields_none() {
        let lookup = MockPlacesLookup::new().with_photo(PHOTO, URI);
        let fetcher = MockWebFetcher::new().with_status(URI, 404);

        assert!(acquirer(lookup, fetcher).fetch_provider_photo(PHOTO).await.is_none());
    }

    #[tokio::test]
    async fn test_batch_respects_limit_and_skips_failures() {
        let lookup = MockPlacesLookup::new()
            .with_photo("p1", "https://img/1")
            .with_photo("p2", "https://img/2")
            .with_photo("p3", "https://img/3")
            .with_photo("p4", "https://img/4");
        let fetcher = MockWebFetcher::new()
            .with_image("https://img/1", b"1", "image/jpeg")
            .with_status("https://img/2", 500)
            .with_image("https://img/3", b"3", "image/jpeg")
            .with_image("https://img/4", b"4", "image/jpeg");

        let images = acquirer(lookup, fetcher)
            .fetch_provider_photos(&["p1", "p2", "p3", "p4"], 3)
            .await;

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].bytes, b"1".to_vec());
        assert_eq!(images[1].bytes, b"3".to_vec());
    }
}
