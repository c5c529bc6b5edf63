use miraki_core::{ArtworkId, CollectionId};

use crate::error::ApiError;
use crate::models::{Collection, CollectionDraft, CollectionQuery, Page, UploadedImage};
use crate::query::{Mutation, Query, QueryKey, scope};

use super::Console;

impl Console {
    #[must_use]
    pub fn collections(&self, params: &CollectionQuery) -> Query<Page<Collection>> {
        let key = QueryKey::scope(scope::COLLECTIONS)
            .with("list")
            .with_params(params);
        let params = params.clone();
        self.read(key, self.services.collections.clone(), move |service| {
            let params = params.clone();
            async move { service.get_all(&params).await }
        })
    }

    #[must_use]
    pub fn collection(&self, id: &CollectionId) -> Query<Collection> {
        let key = QueryKey::scope(scope::COLLECTION).with(id);
        let id = id.clone();
        self.read(key, self.services.collections.clone(), move |service| {
            let id = id.clone();
            async move { service.get_by_id(&id).await }
        })
    }

    #[must_use]
    pub fn featured_collections(&self) -> Query<Vec<Collection>> {
        let key = QueryKey::scope(scope::COLLECTIONS).with("featured");
        self.read(key, self.services.collections.clone(), |service| async move {
            service.featured().await
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the draft.
    pub async fn create_collection(&self, draft: &CollectionDraft) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::CreateCollection,
                self.services.collections.create(draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    pub async fn update_collection(
        &self,
        id: &CollectionId,
        draft: &CollectionDraft,
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateCollection(id.clone()),
                self.services.collections.update(id, draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the collection does not exist.
    pub async fn toggle_collection_featured(
        &self,
        id: &CollectionId,
        featured: bool,
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::ToggleCollectionFeatured(id.clone()),
                self.services.collections.toggle_featured(id, featured),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the collection does not exist.
    pub async fn update_collection_priority(
        &self,
        id: &CollectionId,
        priority: i32,
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateCollectionPriority(id.clone()),
                self.services.collections.update_priority(id, priority),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if either record does not exist.
    pub async fn add_artwork_to_collection(
        &self,
        id: &CollectionId,
        artwork_id: &ArtworkId,
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::AddCollectionArtwork(id.clone()),
                self.services.collections.add_artwork(id, artwork_id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artwork is not in the collection.
    pub async fn remove_artwork_from_collection(
        &self,
        id: &CollectionId,
        artwork_id: &ArtworkId,
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::RemoveCollectionArtwork(id.clone()),
                self.services.collections.remove_artwork(id, artwork_id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn reorder_collection_artworks(
        &self,
        id: &CollectionId,
        artwork_ids: &[ArtworkId],
    ) -> Result<Collection, ApiError> {
        self.cache
            .mutate(
                Mutation::ReorderCollectionArtworks(id.clone()),
                self.services.collections.reorder_artworks(id, artwork_ids),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the collection does not exist.
    pub async fn delete_collection(&self, id: &CollectionId) -> Result<(), ApiError> {
        self.cache
            .mutate(
                Mutation::DeleteCollection(id.clone()),
                self.services.collections.delete(id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn upload_collection_cover(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.cache
            .mutate(
                Mutation::UploadCollectionCover,
                self.services.collections.upload_cover_image(bytes, file_name),
            )
            .await
    }
}
