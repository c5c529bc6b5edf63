use serde_json::json;
use tracing::instrument;

use miraki_core::{OrderId, OrderStatus, PaymentStatus, SalesPeriod, UserId};

use crate::error::ApiError;
use crate::models::{
    DateRange, Order, OrderDraft, OrderQuery, OrderStats, SalesByPeriod, SalesByStatus,
    TrackingInfo,
};
use crate::transport::segment;

use super::{Resource, ResourceService};

impl Resource for Order {
    type Id = OrderId;
    type Draft = OrderDraft;
    type Query = OrderQuery;

    const PATH: &'static str = "/orders";
}

impl ResourceService<Order> {
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the transition is rejected.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "status"),
                &json!({ "status": status }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_payment_status(
        &self,
        id: &OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "payment"),
                &json!({ "paymentStatus": payment_status }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self, tracking), fields(id = %id))]
    pub async fn update_tracking(
        &self,
        id: &OrderId,
        tracking: &TrackingInfo,
    ) -> Result<Order, ApiError> {
        self.transport()
            .patch(
                &Self::item_subpath(id.as_str(), "tracking"),
                &json!({ "trackingInfo": tracking }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn by_user(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        self.transport()
            .get(&format!("/orders/user/{}", segment(user_id.as_str())))
            .await
    }

    /// Revenue and order counts, optionally bounded by date.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn stats(&self, range: &DateRange) -> Result<OrderStats, ApiError> {
        self.transport().get_with("/orders/stats", range).await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn sales_by_period(&self, period: SalesPeriod) -> Result<Vec<SalesByPeriod>, ApiError> {
        self.transport()
            .get(&format!("/orders/sales/{}", period.as_str()))
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn sales_by_status(&self) -> Result<Vec<SalesByStatus>, ApiError> {
        self.transport().get("/orders/sales/by-status").await
    }

    /// Most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32) -> Result<Vec<Order>, ApiError> {
        self.transport()
            .get_with("/orders/recent", &[("limit", limit)])
            .await
    }
}
