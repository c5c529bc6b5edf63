use serde_json::json;
use tracing::instrument;

use miraki_core::BannerId;

use crate::error::ApiError;
use crate::models::{Banner, BannerDraft, BannerQuery, UploadedImage};
use crate::transport::image_form;

use super::{Resource, ResourceService};

impl Resource for Banner {
    type Id = BannerId;
    type Draft = BannerDraft;
    type Query = BannerQuery;

    const PATH: &'static str = "/banners";
}

impl ResourceService<Banner> {
    /// Activate or deactivate a banner.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_status(&self, id: &BannerId, active: bool) -> Result<Banner, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "status"),
                &json!({ "active": active }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_priority(&self, id: &BannerId, priority: i32) -> Result<Banner, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "priority"),
                &json!({ "priority": priority }),
            )
            .await
    }

    /// Banners currently shown on the storefront.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Vec<Banner>, ApiError> {
        self.transport().get("/banners/active").await
    }

    /// Persist a new display order. `ordered_ids` is the complete order,
    /// first shown first.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
    pub async fn reorder(&self, ordered_ids: &[BannerId]) -> Result<Vec<Banner>, ApiError> {
        self.transport()
            .post("/banners/reorder", &json!({ "orderedIds": ordered_ids }))
            .await
    }

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
            .upload("/admin/upload/banner", image_form(bytes, file_name))
            .await
    }
}
