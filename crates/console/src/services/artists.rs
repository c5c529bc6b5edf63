use tracing::instrument;

use miraki_core::ArtistId;

use crate::error::ApiError;
use crate::models::{
    Areas, Artist, ArtistDraft, ArtistQuery, Location, Page, SocialLinks, SortOrder, UploadedImage,
};
use crate::transport::image_form;

use super::{Resource, ResourceService};

impl Resource for Artist {
    type Id = ArtistId;
    type Draft = ArtistDraft;
    type Query = ArtistQuery;

    const PATH: &'static str = "/artists";
}

impl ResourceService<Artist> {
    /// Distinct areas artists are located in.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn areas(&self) -> Result<Vec<String>, ApiError> {
        let areas: Areas = self.transport().get("/artists/areas").await?;
        Ok(areas.areas)
    }

    /// Free-text search over the artist list.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Page<Artist>, ApiError> {
        let params = ArtistQuery {
            search: Some(query.to_string()),
            ..ArtistQuery::default()
        };
        self.get_all(&params).await
    }

    /// Artists ordered by popularity, most popular first.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn popular(&self) -> Result<Page<Artist>, ApiError> {
        let params = ArtistQuery {
            sort_by: Some("popularity".to_string()),
            sort_order: Some(SortOrder::Desc),
            ..ArtistQuery::default()
        };
        self.get_all(&params).await
    }

    /// Replace an artist's social links.
    ///
    /// The backend has no partial endpoint, so this reads the artist and
    /// writes it back with the new links.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artist does not exist.
    #[instrument(skip(self, links), fields(id = %id))]
    pub async fn update_social_links(
        &self,
        id: &ArtistId,
        links: SocialLinks,
    ) -> Result<Artist, ApiError> {
        let current = self.get_by_id(id).await?;
        let draft = ArtistDraft {
            social_links: Some(links),
            ..ArtistDraft::from(&current)
        };
        self.update(id, &draft).await
    }

    /// Replace an artist's location. Read-modify-write like
    /// [`update_social_links`](Self::update_social_links).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the artist does not exist.
    #[instrument(skip(self, location), fields(id = %id))]
    pub async fn update_location(
        &self,
        id: &ArtistId,
        location: Location,
    ) -> Result<Artist, ApiError> {
        let current = self.get_by_id(id).await?;
        let draft = ArtistDraft {
            location: Some(location),
            ..ArtistDraft::from(&current)
        };
        self.update(id, &draft).await
    }

    /// Upload a profile image for an artist.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, bytes), fields(id = %id, size = bytes.len()))]
    pub async fn upload_profile_image(
        &self,
        id: &ArtistId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        let form = image_form(bytes, file_name).text("artistId", id.to_string());
        self.transport().upload("/admin/upload/artist", form).await
    }
}
