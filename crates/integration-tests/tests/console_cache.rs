//! End-to-end cache and mutation tests against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use miraki_console::models::{ArtworkDraft, ArtworkQuery, BannerQuery};
use miraki_console::{ApiError, Console, NotificationKind};
use miraki_core::ArtworkId;
use miraki_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, MockBackend, password};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn signed_in(backend: &MockBackend) -> Console {
    let console = backend.console();
    console
        .login(ADMIN_EMAIL, &password(ADMIN_PASSWORD))
        .await
        .unwrap();
    console
}

fn banner_ids(banners: &[miraki_console::models::Banner]) -> Vec<&str> {
    banners.iter().map(|b| b.id.as_str()).collect()
}

// =============================================================================
// Request Sharing
// =============================================================================

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;
    backend.set_read_delay(Duration::from_millis(100));

    let params = ArtworkQuery::default();
    let (first, second) = tokio::join!(
        console.artworks(&params).fetch(),
        console.artworks(&params).fetch()
    );

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(backend.hits("GET /artworks"), 1);
}

#[tokio::test]
async fn test_different_params_are_separate_entries() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;

    let featured = ArtworkQuery {
        featured: Some(true),
        ..ArtworkQuery::default()
    };
    console.artworks(&ArtworkQuery::default()).fetch().await.unwrap();
    console.artworks(&featured).fetch().await.unwrap();

    assert_eq!(backend.hits("GET /artworks"), 2);
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_artwork_update_refetches_list_and_detail() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;
    let id = ArtworkId::new("aw-1");

    let mut list = console.artworks(&ArtworkQuery::default()).watch().await;
    let mut detail = console.artwork(&id).watch().await;
    timeout(WAIT, list.settled()).await.unwrap();
    let before = timeout(WAIT, detail.settled()).await.unwrap();
    assert_eq!(before.data.unwrap().title, "Monsoon over Kochi");

    let draft = ArtworkDraft {
        title: Some("Monsoon over Mattancherry".to_string()),
        ..ArtworkDraft::default()
    };
    let mut notifications = console.notifier().subscribe();
    console.update_artwork(&id, &draft).await.unwrap();

    let list_state = timeout(WAIT, list.settled()).await.unwrap();
    let detail_state = timeout(WAIT, detail.settled()).await.unwrap();

    assert_eq!(backend.hits("GET /artworks"), 2);
    assert_eq!(backend.hits("GET /artworks/aw-1"), 2);
    assert_eq!(detail_state.data.unwrap().title, "Monsoon over Mattancherry");
    assert_eq!(
        list_state.data.unwrap().items[0].title,
        "Monsoon over Mattancherry"
    );

    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.description, "Operation completed successfully");
}

#[tokio::test]
async fn test_failed_update_notifies_and_keeps_cache() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;
    let missing = ArtworkId::new("aw-404");

    console.artworks(&ArtworkQuery::default()).fetch().await.unwrap();
    let mut notifications = console.notifier().subscribe();

    let err = console
        .update_artwork(&missing, &ArtworkDraft::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.description, "Artwork not found");
    assert_eq!(backend.hits("GET /artworks"), 1);
}

// =============================================================================
// Banner Ordering
// =============================================================================

#[tokio::test]
async fn test_banner_reorder_sends_new_order_and_refreshes_list() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;

    let mut list = console.banners(&BannerQuery::default()).watch().await;
    let state = timeout(WAIT, list.settled()).await.unwrap();
    let mut banners = state.data.unwrap().items;
    assert_eq!(banner_ids(&banners), ["b1", "b2", "b3"]);

    console.move_banner(&mut banners, 0, 1).await.unwrap();

    assert_eq!(banner_ids(&banners), ["b2", "b1", "b3"]);
    assert_eq!(backend.reorders(), [["b2", "b1", "b3"]]);

    let refreshed = timeout(WAIT, list.settled()).await.unwrap();
    assert_eq!(backend.hits("GET /banners"), 2);
    assert_eq!(
        banner_ids(&refreshed.data.unwrap().items),
        ["b2", "b1", "b3"]
    );
}

#[tokio::test]
async fn test_rejected_banner_reorder_restores_local_order() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;
    backend.reject_reorder(true);

    let mut banners = console
        .banners(&BannerQuery::default())
        .fetch()
        .await
        .unwrap()
        .items;

    let err = console.move_banner(&mut banners, 2, 0).await.unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(banner_ids(&banners), ["b1", "b2", "b3"]);
    assert_eq!(backend.reorders(), [["b3", "b1", "b2"]]);
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_stats_decode_money() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;

    let stats = console
        .order_stats(Default::default())
        .fetch()
        .await
        .unwrap();

    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_revenue.to_string(), "₹77500.50");
    assert_eq!(stats.orders_by_status["pending"], 1);
}

#[tokio::test]
async fn test_logout_drops_cached_data() {
    let backend = MockBackend::start().await;
    let console = signed_in(&backend).await;
    let key = console.artworks(&ArtworkQuery::default()).key().clone();

    console.artworks(&ArtworkQuery::default()).fetch().await.unwrap();
    assert!(
        console
            .cache()
            .get_data::<serde_json::Value>(&key)
            .await
            .is_some()
    );

    console.logout().await;

    assert!(
        console
            .cache()
            .get_data::<serde_json::Value>(&key)
            .await
            .is_none()
    );
}
