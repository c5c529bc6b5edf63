use serde_json::json;
use tracing::instrument;

use miraki_core::{ArtistId, ArtworkId};

use crate::error::ApiError;
use crate::models::{Areas, Artwork, ArtworkDraft, ArtworkQuery, Page, UploadedImage};
use crate::transport::{image_form, segment};

use super::{Resource, ResourceService};

impl Resource for Artwork {
    type Id = ArtworkId;
    type Draft = ArtworkDraft;
    type Query = ArtworkQuery;

    const PATH: &'static str = "/artworks";
}

impl ResourceService<Artwork> {
    /// Set or clear the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artwork does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn toggle_featured(&self, id: &ArtworkId, featured: bool) -> Result<Artwork, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "featured"),
                &json!({ "featured": featured }),
            )
            .await
    }

    /// Upload an artwork image; the returned URL goes into a draft.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.transport()
            .upload("/admin/upload/artwork", image_form(bytes, file_name))
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Artwork>, ApiError> {
        self.transport()
            .get_with("/artworks/search", &[("q", query)])
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Result<Vec<Artwork>, ApiError> {
        self.transport()
            .get(&format!("/artworks/category/{}", segment(category)))
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(artist_id = %artist_id))]
    pub async fn by_artist(&self, artist_id: &ArtistId) -> Result<Page<Artwork>, ApiError> {
        self.transport()
            .get(&format!("/artworks/artist/{}", segment(artist_id.as_str())))
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.transport().get("/artworks/categories").await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn areas(&self) -> Result<Vec<String>, ApiError> {
        let areas: Areas = self.transport().get("/artworks/areas").await?;
        Ok(areas.areas)
    }
}
