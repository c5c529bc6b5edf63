use miraki_core::BannerId;
use tracing::warn;

use crate::error::ApiError;
use crate::models::{Banner, BannerDraft, BannerQuery, Page, UploadedImage};
use crate::query::{Mutation, Query, QueryKey, scope};

use super::Console;

/// Move the element at `from` to position `to`, shifting the elements in
/// between. Returns `false` and leaves `items` untouched if either index is
/// out of range.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

impl Console {
    #[must_use]
    pub fn banners(&self, params: &BannerQuery) -> Query<Page<Banner>> {
        let key = QueryKey::scope(scope::BANNERS)
            .with("list")
            .with_params(params);
        let params = params.clone();
        self.read(key, self.services.banners.clone(), move |service| {
            let params = params.clone();
            async move { service.get_all(&params).await }
        })
    }

    #[must_use]
    pub fn banner(&self, id: &BannerId) -> Query<Banner> {
        let key = QueryKey::scope(scope::BANNER).with(id);
        let id = id.clone();
        self.read(key, self.services.banners.clone(), move |service| {
            let id = id.clone();
            async move { service.get_by_id(&id).await }
        })
    }

    #[must_use]
    pub fn active_banners(&self) -> Query<Vec<Banner>> {
        let key = QueryKey::scope(scope::BANNERS).with("active");
        self.read(key, self.services.banners.clone(), |service| async move {
            service.active().await
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the draft.
    pub async fn create_banner(&self, draft: &BannerDraft) -> Result<Banner, ApiError> {
        self.cache
            .mutate(Mutation::CreateBanner, self.services.banners.create(draft))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    pub async fn update_banner(
        &self,
        id: &BannerId,
        draft: &BannerDraft,
    ) -> Result<Banner, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateBanner(id.clone()),
                self.services.banners.update(id, draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the banner does not exist.
    pub async fn update_banner_status(&self, id: &BannerId, active: bool) -> Result<Banner, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateBannerStatus(id.clone()),
                self.services.banners.update_status(id, active),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the banner does not exist.
    pub async fn update_banner_priority(
        &self,
        id: &BannerId,
        priority: i32,
    ) -> Result<Banner, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateBannerPriority(id.clone()),
                self.services.banners.update_priority(id, priority),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the banner does not exist.
    pub async fn delete_banner(&self, id: &BannerId) -> Result<(), ApiError> {
        self.cache
            .mutate(
                Mutation::DeleteBanner(id.clone()),
                self.services.banners.delete(id),
            )
            .await
    }

    /// Persist `banners` in the given order, first shown first.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn reorder_banners(&self, banners: &[Banner]) -> Result<Vec<Banner>, ApiError> {
        let ordered_ids: Vec<BannerId> = banners.iter().map(|b| b.id.clone()).collect();
        self.cache
            .mutate(
                Mutation::ReorderBanners,
                self.services.banners.reorder(&ordered_ids),
            )
            .await
    }

    /// Apply a drag-and-drop move to a locally held banner list and persist
    /// it. The local order changes immediately; if the server rejects the
    /// new order, `banners` is restored to what it was before the move.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if an index is out of range, otherwise
    /// the error from [`reorder_banners`](Self::reorder_banners).
    pub async fn move_banner(
        &self,
        banners: &mut Vec<Banner>,
        from: usize,
        to: usize,
    ) -> Result<(), ApiError> {
        let previous = banners.clone();
        if !move_item(banners, from, to) {
            return Err(ApiError::Validation {
                message: format!("Cannot move banner from {from} to {to}"),
                details: None,
            });
        }

        if let Err(e) = self.reorder_banners(banners).await {
            warn!(error = %e, "Banner reorder rejected, restoring previous order");
            *banners = previous;
            return Err(e);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn upload_banner_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ApiError> {
        self.cache
            .mutate(
                Mutation::UploadBannerImage,
                self.services.banners.upload_image(bytes, file_name),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_item_forward_and_back() {
        let mut items = vec!["b1", "b2", "b3"];
        assert!(move_item(&mut items, 0, 1));
        assert_eq!(items, ["b2", "b1", "b3"]);

        assert!(move_item(&mut items, 2, 0));
        assert_eq!(items, ["b3", "b2", "b1"]);
    }

    #[test]
    fn test_move_item_same_index_is_noop() {
        let mut items = vec![1, 2, 3];
        assert!(move_item(&mut items, 1, 1));
        assert_eq!(items, [1, 2, 3]);
    }

    #[test]
    fn test_move_item_out_of_range() {
        let mut items = vec![1, 2, 3];
        assert!(!move_item(&mut items, 3, 0));
        assert!(!move_item(&mut items, 0, 5));
        assert_eq!(items, [1, 2, 3]);
    }
}
