use miraki_core::{OrderId, OrderStatus, PaymentStatus, SalesPeriod, UserId};

use crate::error::ApiError;
use crate::models::{
    DateRange, Order, OrderDraft, OrderQuery, OrderStats, Page, SalesByPeriod, SalesByStatus,
    TrackingInfo,
};
use crate::query::{Mutation, Query, QueryKey, scope};

use super::Console;

impl Console {
    #[must_use]
    pub fn orders(&self, params: &OrderQuery) -> Query<Page<Order>> {
        let key = QueryKey::scope(scope::ORDERS)
            .with("list")
            .with_params(params);
        let params = params.clone();
        self.read(key, self.services.orders.clone(), move |service| {
            let params = params.clone();
            async move { service.get_all(&params).await }
        })
    }

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Query<Order> {
        let key = QueryKey::scope(scope::ORDER).with(id);
        let id = id.clone();
        self.read(key, self.services.orders.clone(), move |service| {
            let id = id.clone();
            async move { service.get_by_id(&id).await }
        })
    }

    #[must_use]
    pub fn orders_by_user(&self, user_id: &UserId) -> Query<Vec<Order>> {
        let key = QueryKey::scope(scope::ORDERS).with("user").with(user_id);
        let user_id = user_id.clone();
        self.read(key, self.services.orders.clone(), move |service| {
            let user_id = user_id.clone();
            async move { service.by_user(&user_id).await }
        })
    }

    #[must_use]
    pub fn recent_orders(&self, limit: u32) -> Query<Vec<Order>> {
        let key = QueryKey::scope(scope::ORDERS).with("recent").with(limit);
        self.read(key, self.services.orders.clone(), move |service| async move {
            service.recent(limit).await
        })
    }

    /// Dashboard statistics; an empty range covers all time.
    #[must_use]
    pub fn order_stats(&self, range: DateRange) -> Query<OrderStats> {
        let key = QueryKey::scope(scope::ORDER_STATS).with_params(&range);
        self.read(key, self.services.orders.clone(), move |service| async move {
            service.stats(&range).await
        })
    }

    #[must_use]
    pub fn sales_by_period(&self, period: SalesPeriod) -> Query<Vec<SalesByPeriod>> {
        let key = QueryKey::scope(scope::ORDER_STATS)
            .with("sales")
            .with(period.as_str());
        self.read(key, self.services.orders.clone(), move |service| async move {
            service.sales_by_period(period).await
        })
    }

    #[must_use]
    pub fn sales_by_status(&self) -> Query<Vec<SalesByStatus>> {
        let key = QueryKey::scope(scope::ORDER_STATS).with("by-status");
        self.read(key, self.services.orders.clone(), |service| async move {
            service.sales_by_status().await
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` on rejection.
    pub async fn update_order(&self, id: &OrderId, draft: &OrderDraft) -> Result<Order, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateOrder(id.clone()),
                self.services.orders.update(id, draft),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the transition is rejected.
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateOrderStatus(id.clone()),
                self.services.orders.update_status(id, status),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the transition is rejected.
    pub async fn update_payment_status(
        &self,
        id: &OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateOrderPayment(id.clone()),
                self.services.orders.update_payment_status(id, payment_status),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the transport's [`ApiError`] on failure.
    pub async fn update_order_tracking(
        &self,
        id: &OrderId,
        tracking: &TrackingInfo,
    ) -> Result<Order, ApiError> {
        self.cache
            .mutate(
                Mutation::UpdateOrderTracking(id.clone()),
                self.services.orders.update_tracking(id, tracking),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    pub async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        self.cache
            .mutate(
                Mutation::DeleteOrder(id.clone()),
                self.services.orders.delete(id),
            )
            .await
    }
}
