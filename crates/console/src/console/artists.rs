use miraki_core::ArtistId;

use crate::error::ApiError;
use crate::models::{Artist, ArtistDraft, ArtistQuery, Location, Page, SocialLinks, UploadedImage};
use crate::query::{Mutation, Query, QueryKey, scope};

use super::Console;

impl Console {
    #[must_use]
    pub fn artists(&self, params: &ArtistQuery) -> Query<Page<Artist>> {
        let key = QueryKey::scope(scope::ARTISTS)
            .with("list")
            .with_params(params);
        let params = params.clone();
        self.read(key, self.services.artists.clone(), move |service| {
            let params = params.clone();
            async move { service.get_all(&params).await }
        })
    }

    #[must_use]
    pub fn artist(&self, id: &ArtistId) -> Query<Artist> {
        let key = QueryKey::scope(scope::ARTIST).with(id);
        let id = id.clone();
        self.read(key, self.services.artists.clone(), move |service| {
            let id = id.clone();
            async move { service.get_by_id(&id).await }
        })
    }

    #[must_use]
    pub fn artist_search(&self, query: &str) -> Query<Page<Artist>> {
        let key = QueryKey::scope(scope::ARTISTS).with("search").with(query);
        let query = query.to_string();
        self.read(key, self.services.artists.clone(), move |service| {
            let query = query.clone();
            async move { service.search(&query).await }
        })
    }

    #[must_use]
    pub fn popular_artists(&self) -> Query<Page<Artist>> {
        let key = QueryKey::scope(scope::ARTISTS).with("popular");
        self.read(key, self.services.artists.clone(), |service| async move {
            service.popular().await
        })
    }

    #[must_use]
    pub fn artist_areas(&self) -> Query<Vec<String>> {
        let key = QueryKey::scope(scope::ARTISTS).with("areas");
        self.read(key, self.services.artists.clone(), |service| async move {
            service.areas().await
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the draft.
    pub async fn create_artist(&self, draft: &ArtistDraft) -> Result<Artist, ApiError> {
        self.cache
            .mutate(Mutation::CreateArtist, self.services.artists.create(draft))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    pub async fn update_artist(
        &self,
        id: &ArtistId,
        draft: &ArtistDraft,
    ) -> Result<Artist, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateArtist(id.clone()),
                self.services.artists.update(id, draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artist does not exist.
    pub async fn update_artist_social_links(
        &self,
        id: &ArtistId,
        links: SocialLinks,
    ) -> Result<Artist, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateArtist(id.clone()),
                self.services.artists.update_social_links(id, links),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artist does not exist.
    pub async fn update_artist_location(
        &self,
        id: &ArtistId,
        location: Location,
    ) -> Result<Artist, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateArtist(id.clone()),
                self.services.artists.update_location(id, location),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artist does not exist.
    pub async fn delete_artist(&self, id: &ArtistId) -> Result<(), ApiError> {
        self.cache
            .mutate(
                Mutation::DeleteArtist(id.clone()),
                self.services.artists.delete(id),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn upload_artist_image(
        &self,
        id: &ArtistId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.cache
            .mutate(
                Mutation::UploadArtistImage(id.clone()),
                self.services
                    .artists
                    .upload_profile_image(id, bytes, file_name),
            )
            .await
    }
}
