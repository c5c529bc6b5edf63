use miraki_core::{ArtistId, ArtworkId};

use crate::error::ApiError;
use crate::models::{Artwork, ArtworkDraft, ArtworkQuery, Page, UploadedImage};
use crate::query::{Mutation, Query, QueryKey, scope};

use super::Console;

impl Console {
    /// Paginated artwork list.
    #[must_use]
    pub fn artworks(&self, params: &ArtworkQuery) -> Query<Page<Artwork>> {
        let key = QueryKey::scope(scope::ARTWORKS)
            .with("list")
            .with_params(params);
        let params = params.clone();
        self.read(key, self.services.artworks.clone(), move |service| {
            let params = params.clone();
            async move { service.get_all(&params).await }
        })
    }

    #[must_use]
    pub fn artwork(&self, id: &ArtworkId) -> Query<Artwork> {
        let key = QueryKey::scope(scope::ARTWORK).with(id);
        let id = id.clone();
        self.read(key, self.services.artworks.clone(), move |service| {
            let id = id.clone();
            async move { service.get_by_id(&id).await }
        })
    }

    #[must_use]
    pub fn artwork_search(&self, query: &str) -> Query<Vec<Artwork>> {
        let key = QueryKey::scope(scope::ARTWORKS).with("search").with(query);
        let query = query.to_string();
        self.read(key, self.services.artworks.clone(), move |service| {
            let query = query.clone();
            async move { service.search(&query).await }
        })
    }

    #[must_use]
    pub fn artworks_by_category(&self, category: &str) -> Query<Vec<Artwork>> {
        let key = QueryKey::scope(scope::ARTWORKS)
            .with("category")
            .with(category);
        let category = category.to_string();
        self.read(key, self.services.artworks.clone(), move |service| {
            let category = category.clone();
            async move { service.by_category(&category).await }
        })
    }

    #[must_use]
    pub fn artworks_by_artist(&self, artist_id: &ArtistId) -> Query<Page<Artwork>> {
        let key = QueryKey::scope(scope::ARTWORKS)
            .with("artist")
            .with(artist_id);
        let artist_id = artist_id.clone();
        self.read(key, self.services.artworks.clone(), move |service| {
            let artist_id = artist_id.clone();
            async move { service.by_artist(&artist_id).await }
        })
    }

    #[must_use]
    pub fn artwork_categories(&self) -> Query<Vec<String>> {
        let key = QueryKey::scope(scope::ARTWORKS).with("categories");
        self.read(key, self.services.artworks.clone(), |service| async move {
            service.categories().await
        })
    }

    #[must_use]
    pub fn artwork_areas(&self) -> Query<Vec<String>> {
        let key = QueryKey::scope(scope::ARTWORKS).with("areas");
        self.read(key, self.services.artworks.clone(), |service| async move {
            service.areas().await
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the draft.
    pub async fn create_artwork(&self, draft: &ArtworkDraft) -> Result<Artwork, ApiError> {
        self.cache
            .mutate(Mutation::CreateArtwork, self.services.artworks.create(draft))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    pub async fn update_artwork(
        &self,
        id: &ArtworkId,
        draft: &ArtworkDraft,
    ) -> Result<Artwork, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateArtwork(id.clone()),
                self.services.artworks.update(id, draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artwork does not exist.
    pub async fn toggle_artwork_featured(
        &self,
        id: &ArtworkId,
        featured: bool,
    ) -> Result<Artwork, ApiError> {
        self.cache
            .mutate(
                Mutation::ToggleArtworkFeatured(id.clone()),
                self.services.artworks.toggle_featured(id, featured),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artwork does not exist.
    pub async fn delete_artwork(&self, id: &ArtworkId) -> Result<(), ApiError> {
        self.cache
            .mutate(
                Mutation::DeleteArtwork(id.clone()),
                self.services.artworks.delete(id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn upload_artwork_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.cache
            .mutate(
                Mutation::UploadArtworkImage,
                self.services.artworks.upload_image(bytes, file_name),
            )
            .await
    }
}
