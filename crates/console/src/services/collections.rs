use serde_json::json;
use tracing::instrument;

use miraki_core::{ArtworkId, CollectionId};

use crate::error::ApiError;
use crate::models::{Collection, CollectionDraft, CollectionQuery, UploadedImage};
use crate::transport::{image_form, segment};

use super::{Resource, ResourceService};

impl Resource for Collection {
    type Id = CollectionId;
    type Draft = CollectionDraft;
    type Query = CollectionQuery;

    const PATH: &'static str = "/collections";
}

impl ResourceService<Collection> {
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn toggle_featured(
        &self,
        id: &CollectionId,
        featured: bool,
    ) -> Result<Collection, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "featured"),
                &json!({ "featured": featured }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_priority(
        &self,
        id: &CollectionId,
        priority: i32,
    ) -> Result<Collection, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "priority"),
                &json!({ "priority": priority }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id, artwork_id = %artwork_id))]
    pub async fn add_artwork(
        &self,
        id: &CollectionId,
        artwork_id: &ArtworkId,
    ) -> Result<Collection, ApiError> {
        self.transport()
            .post(
                &Self::item_subpath(id.as_str(), "artworks"),
                &json!({ "artworkId": artwork_id }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artwork is not in the collection.
    #[instrument(skip(self), fields(id = %id, artwork_id = %artwork_id))]
    pub async fn remove_artwork(
        &self,
        id: &CollectionId,
        artwork_id: &ArtworkId,
    ) -> Result<Collection, ApiError> {
        let path = format!(
            "{}/{}",
            Self::item_subpath(id.as_str(), "artworks"),
            segment(artwork_id.as_str())
        );
        self.transport().delete(&path).await
    }

    /// Persist the order of artworks inside a collection.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, artwork_ids), fields(id = %id, count = artwork_ids.len()))]
    pub async fn reorder_artworks(
        &self,
        id: &CollectionId,
        artwork_ids: &[ArtworkId],
    ) -> Result<Collection, ApiError> {
        self.transport()
            .post(
                &Self::item_subpath(id.as_str(), "artworks/reorder"),
                &json!({ "artworkIds": artwork_ids }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Result<Vec<Collection>, ApiError> {
        self.transport().get("/collections/featured").await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_cover_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.transport()
            .upload("/admin/upload/collection", image_form(bytes, file_name))
            .await
    }
}
