//! Every write the console performs, and the cache keys it makes stale.

use std::fmt;

use miraki_core::{ArtistId, ArtworkId, BannerId, CollectionId, OrderId};

use super::key::{QueryKey, scope};

/// A console write operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateArtist,
    UpdateArtist(ArtistId),
    DeleteArtist(ArtistId),
    UploadArtistImage(ArtistId),

    CreateArtwork,
    UpdateArtwork(ArtworkId),
    ToggleArtworkFeatured(ArtworkId),
    DeleteArtwork(ArtworkId),
    UploadArtworkImage,

    UpdateOrder(OrderId),
    UpdateOrderStatus(OrderId),
    UpdateOrderPayment(OrderId),
    UpdateOrderTracking(OrderId),
    DeleteOrder(OrderId),

    CreateBanner,
    UpdateBanner(BannerId),
    UpdateBannerStatus(BannerId),
    UpdateBannerPriority(BannerId),
    DeleteBanner(BannerId),
    ReorderBanners,
    UploadBannerImage,

    CreateCollection,
    UpdateCollection(CollectionId),
    ToggleCollectionFeatured(CollectionId),
    UpdateCollectionPriority(CollectionId),
    AddCollectionArtwork(CollectionId),
    RemoveCollectionArtwork(CollectionId),
    ReorderCollectionArtworks(CollectionId),
    DeleteCollection(CollectionId),
    UploadCollectionCover,
}

impl Mutation {
    /// Key prefixes made stale by a successful run of this mutation.
    ///
    /// Uploads only store a file and return its URL; the entity changes when
    /// the URL is saved through a later update.
    #[must_use]
    pub fn invalidates(&self) -> Vec<QueryKey> {
        let list = QueryKey::scope;
        let one = |entity: &str, id: &str| QueryKey::scope(entity).with(id);

        match self {
            Self::CreateArtist => vec![list(scope::ARTISTS)],
            Self::UpdateArtist(id) | Self::DeleteArtist(id) | Self::UploadArtistImage(id) => {
                vec![list(scope::ARTISTS), one(scope::ARTIST, id.as_str())]
            }

            Self::CreateArtwork => vec![list(scope::ARTWORKS)],
            Self::UpdateArtwork(id) | Self::ToggleArtworkFeatured(id) | Self::DeleteArtwork(id) => {
                vec![list(scope::ARTWORKS), one(scope::ARTWORK, id.as_str())]
            }

            Self::UpdateOrder(id)
            | Self::UpdateOrderStatus(id)
            | Self::UpdateOrderPayment(id)
            | Self::DeleteOrder(id) => vec![
                list(scope::ORDERS),
                one(scope::ORDER, id.as_str()),
                list(scope::ORDER_STATS),
            ],
            Self::UpdateOrderTracking(id) => {
                vec![list(scope::ORDERS), one(scope::ORDER, id.as_str())]
            }

            Self::CreateBanner | Self::ReorderBanners => vec![list(scope::BANNERS)],
            Self::UpdateBanner(id)
            | Self::UpdateBannerStatus(id)
            | Self::UpdateBannerPriority(id)
            | Self::DeleteBanner(id) => {
                vec![list(scope::BANNERS), one(scope::BANNER, id.as_str())]
            }

            Self::CreateCollection => vec![list(scope::COLLECTIONS)],
            Self::UpdateCollection(id)
            | Self::ToggleCollectionFeatured(id)
            | Self::UpdateCollectionPriority(id)
            | Self::AddCollectionArtwork(id)
            | Self::RemoveCollectionArtwork(id)
            | Self::ReorderCollectionArtworks(id)
            | Self::DeleteCollection(id) => {
                vec![list(scope::COLLECTIONS), one(scope::COLLECTION, id.as_str())]
            }

            Self::UploadArtworkImage | Self::UploadBannerImage | Self::UploadCollectionCover => {
                Vec::new()
            }
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateArtist => "create_artist",
            Self::UpdateArtist(_) => "update_artist",
            Self::DeleteArtist(_) => "delete_artist",
            Self::UploadArtistImage(_) => "upload_artist_image",
            Self::CreateArtwork => "create_artwork",
            Self::UpdateArtwork(_) => "update_artwork",
            Self::ToggleArtworkFeatured(_) => "toggle_artwork_featured",
            Self::DeleteArtwork(_) => "delete_artwork",
            Self::UploadArtworkImage => "upload_artwork_image",
            Self::UpdateOrder(_) => "update_order",
            Self::UpdateOrderStatus(_) => "update_order_status",
            Self::UpdateOrderPayment(_) => "update_order_payment",
            Self::UpdateOrderTracking(_) => "update_order_tracking",
            Self::DeleteOrder(_) => "delete_order",
            Self::CreateBanner => "create_banner",
            Self::UpdateBanner(_) => "update_banner",
            Self::UpdateBannerStatus(_) => "update_banner_status",
            Self::UpdateBannerPriority(_) => "update_banner_priority",
            Self::DeleteBanner(_) => "delete_banner",
            Self::ReorderBanners => "reorder_banners",
            Self::UploadBannerImage => "upload_banner_image",
            Self::CreateCollection => "create_collection",
            Self::UpdateCollection(_) => "update_collection",
            Self::ToggleCollectionFeatured(_) => "toggle_collection_featured",
            Self::UpdateCollectionPriority(_) => "update_collection_priority",
            Self::AddCollectionArtwork(_) => "add_collection_artwork",
            Self::RemoveCollectionArtwork(_) => "remove_collection_artwork",
            Self::ReorderCollectionArtworks(_) => "reorder_collection_artworks",
            Self::DeleteCollection(_) => "delete_collection",
            Self::UploadCollectionCover => "upload_collection_cover",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(mutation: &Mutation) -> Vec<String> {
        mutation
            .invalidates()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_artist_mutations() {
        assert_eq!(keys(&Mutation::CreateArtist), ["artists"]);
        for m in [
            Mutation::UpdateArtist("ar-1".into()),
            Mutation::DeleteArtist("ar-1".into()),
            Mutation::UploadArtistImage("ar-1".into()),
        ] {
            assert_eq!(keys(&m), ["artists", "artist/ar-1"], "{m}");
        }
    }

    #[test]
    fn test_artwork_mutations() {
        assert_eq!(keys(&Mutation::CreateArtwork), ["artworks"]);
        for m in [
            Mutation::UpdateArtwork("aw-1".into()),
            Mutation::ToggleArtworkFeatured("aw-1".into()),
            Mutation::DeleteArtwork("aw-1".into()),
        ] {
            assert_eq!(keys(&m), ["artworks", "artwork/aw-1"], "{m}");
        }
    }

    #[test]
    fn test_order_mutations_refresh_stats_when_money_moves() {
        for m in [
            Mutation::UpdateOrder("o-1".into()),
            Mutation::UpdateOrderStatus("o-1".into()),
            Mutation::UpdateOrderPayment("o-1".into()),
            Mutation::DeleteOrder("o-1".into()),
        ] {
            assert_eq!(keys(&m), ["orders", "order/o-1", "order-stats"], "{m}");
        }
        assert_eq!(
            keys(&Mutation::UpdateOrderTracking("o-1".into())),
            ["orders", "order/o-1"]
        );
    }

    #[test]
    fn test_banner_mutations() {
        assert_eq!(keys(&Mutation::CreateBanner), ["banners"]);
        assert_eq!(keys(&Mutation::ReorderBanners), ["banners"]);
        for m in [
            Mutation::UpdateBanner("b-1".into()),
            Mutation::UpdateBannerStatus("b-1".into()),
            Mutation::UpdateBannerPriority("b-1".into()),
            Mutation::DeleteBanner("b-1".into()),
        ] {
            assert_eq!(keys(&m), ["banners", "banner/b-1"], "{m}");
        }
    }

    #[test]
    fn test_collection_mutations() {
        assert_eq!(keys(&Mutation::CreateCollection), ["collections"]);
        for m in [
            Mutation::UpdateCollection("c-1".into()),
            Mutation::ToggleCollectionFeatured("c-1".into()),
            Mutation::UpdateCollectionPriority("c-1".into()),
            Mutation::AddCollectionArtwork("c-1".into()),
            Mutation::RemoveCollectionArtwork("c-1".into()),
            Mutation::ReorderCollectionArtworks("c-1".into()),
            Mutation::DeleteCollection("c-1".into()),
        ] {
            assert_eq!(keys(&m), ["collections", "collection/c-1"], "{m}");
        }
    }

    #[test]
    fn test_uploads_invalidate_nothing() {
        for m in [
            Mutation::UploadArtworkImage,
            Mutation::UploadBannerImage,
            Mutation::UploadCollectionCover,
        ] {
            assert!(m.invalidates().is_empty(), "{m}");
        }
    }
}
