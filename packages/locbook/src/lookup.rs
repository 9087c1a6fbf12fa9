//! Places-lookup seam.
//!
//! [`PlacesLookup`] is what the resolver and media acquirer depend on;
//! [`GooglePlaces`] adapts the `places-client` crate to it and turns a missing
//! key into a `Config` error the callers degrade on.

use async_trait::async_trait;
use places_client::{FieldMask, Place, PlacesClient, PlacesError};

#[async_trait]
pub trait PlacesLookup: Send + Sync {
    /// Best text-search candidate, or `None` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<Place>, PlacesError>;

    /// Direct image URI for a photo reference, bounded to `max_px` on both sides.
    async fn photo_uri(&self, photo_ref: &str, max_px: u32) -> Result<Option<String>, PlacesError>;
}

pub struct GooglePlaces {
    client: Option<PlacesClient>,
    mask: FieldMask,
}

impl GooglePlaces {
    pub fn new(client: Option<PlacesClient>, mask: FieldMask) -> Self {
        Self { client, mask }
    }

    /// Field mask for the given review budget and image-analysis flag.
    pub fn field_mask(max_reviews: usize, image_analysis: bool) -> FieldMask {
        let mut mask = FieldMask::basic();
        if max_reviews > 0 {
            mask = mask.with_reviews();
        }
        if image_analysis {
            mask = mask.with_photos();
        }
        mask
    }

    fn client(&self) -> Result<&PlacesClient, PlacesError> {
        self.client
            .as_ref()
            .ok_or_else(|| PlacesError::Config("places API key not set".into()))
    }
}

#[async_trait]
impl PlacesLookup for GooglePlaces {
    async fn search(&self, query: &str) -> Result<Option<Place>, PlacesError> {
        let places = self.client()?.search_text(query, &self.mask).await?;
        Ok(places.into_iter().next())
    }

    async fn photo_uri(&self, photo_ref: &str, max_px: u32) -> Result<Option<String>, PlacesError> {
        let media = self.client()?.photo_media(photo_ref, max_px, max_px).await?;
        Ok(media.photo_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mask_follows_settings() {
        let header = GooglePlaces::field_mask(5, true).header_value();
        assert!(header.contains("places.reviews"));
        assert!(header.contains("places.photos"));

        let header = GooglePlaces::field_mask(0, false).header_value();
        assert!(!header.contains("places.reviews"));
        assert!(!header.contains("places.photos"));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let lookup = GooglePlaces::new(None, FieldMask::basic());

        let err = lookup.search("Test Cafe").await.unwrap_err();
        assert!(matches!(err, PlacesError::Config(_)));

        let err = lookup.photo_uri("places/a/photos/b", 800).await.unwrap_err();
        assert!(matches!(err, PlacesError::Config(_)));
    }
}
