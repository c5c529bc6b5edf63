//! Resource services: domain operations translated into REST calls.
//!
//! [`ResourceService`] implements the CRUD surface shared by every entity;
//! each entity module adds its extra endpoints as inherent methods on its own
//! instantiation. Services hold no state beyond the shared transport and
//! never cache.

mod artists;
mod artworks;
mod auth;
mod banners;
mod collections;
mod orders;

pub use auth::AuthService;

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::ApiError;
use crate::models::{Artist, Artwork, Banner, Collection, Order, Page};
use crate::transport::{HttpTransport, segment};

/// An entity served under a REST collection path.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Server-assigned identifier.
    type Id: AsRef<str> + fmt::Display + Send + Sync;
    /// Partial body accepted by create and update.
    type Draft: Serialize + Send + Sync;
    /// List filters.
    type Query: Serialize + Send + Sync;

    /// Collection path, e.g. `/artworks`.
    const PATH: &'static str;
}

/// CRUD operations for one entity type.
pub struct ResourceService<T> {
    transport: HttpTransport,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> ResourceService<T> {
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }

    pub(crate) const fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Path of a single entity, `{PATH}/{id}`.
    #[must_use]
    pub fn item_path(id: &str) -> String {
        format!("{}/{}", T::PATH, segment(id))
    }

    /// Path below a single entity, `{PATH}/{id}/{suffix}`.
    #[must_use]
    pub fn item_subpath(id: &str, suffix: &str) -> String {
        format!("{}/{}/{suffix}", T::PATH, segment(id))
    }

    /// List entities matching `params`.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, params), fields(resource = T::PATH))]
    pub async fn get_all(&self, params: &T::Query) -> Result<Page<T>, ApiError> {
        self.transport.get_with(T::PATH, params).await
    }

    /// Fetch one entity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the id is unknown.
    #[instrument(skip(self), fields(resource = T::PATH, id = %id))]
    pub async fn get_by_id(&self, id: &T::Id) -> Result<T, ApiError> {
        self.transport.get(&Self::item_path(id.as_ref())).await
    }

    /// Create an entity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the draft.
    #[instrument(skip(self, draft), fields(resource = T::PATH))]
    pub async fn create(&self, draft: &T::Draft) -> Result<T, ApiError> {
        self.transport.post(T::PATH, draft).await
    }

    /// Replace the fields present in `draft`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    #[instrument(skip(self, draft), fields(resource = T::PATH, id = %id))]
    pub async fn update(&self, id: &T::Id, draft: &T::Draft) -> Result<T, ApiError> {
        self.transport
            .put(&Self::item_path(id.as_ref()), draft)
            .await
    }

    /// Delete an entity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the id is unknown.
    #[instrument(skip(self), fields(resource = T::PATH, id = %id))]
    pub async fn delete(&self, id: &T::Id) -> Result<(), ApiError> {
        self.transport.delete(&Self::item_path(id.as_ref())).await
    }
}

/// One shared service instance per entity, built from a single transport.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub artists: ResourceService<Artist>,
    pub artworks: ResourceService<Artwork>,
    pub orders: ResourceService<Order>,
    pub banners: ResourceService<Banner>,
    pub collections: ResourceService<Collection>,
}

impl Services {
    #[must_use]
    pub fn new(transport: &HttpTransport) -> Self {
        Self {
            auth: AuthService::new(transport.clone()),
            artists: ResourceService::new(transport.clone()),
            artworks: ResourceService::new(transport.clone()),
            orders: ResourceService::new(transport.clone()),
            banners: ResourceService::new(transport.clone()),
            collections: ResourceService::new(transport.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_paths_escape_ids() {
        assert_eq!(ResourceService::<Artwork>::item_path("aw-1"), "/artworks/aw-1");
        assert_eq!(
            ResourceService::<Collection>::item_subpath("c 1", "artworks/reorder"),
            "/collections/c%201/artworks/reorder"
        );
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(Artist::PATH, "/artists");
        assert_eq!(Order::PATH, "/orders");
        assert_eq!(Banner::PATH, "/banners");
    }
}
