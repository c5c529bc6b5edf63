use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use miraki_core::{
    AddressId, ArtworkId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId,
};

/// A placed order as returned by `/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_info: Option<TrackingInfo>,
    pub summary: OrderSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub artwork: OrderedArtwork,
    pub quantity: u32,
    pub price: Money,
}

/// Artwork snapshot embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedArtwork {
    #[serde(rename = "_id")]
    pub id: ArtworkId,
    pub title: String,
    pub artist: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Home,
    Office,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// Filters for `GET /orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

/// Orders are created by the storefront checkout; the console only edits
/// fulfilment fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_info: Option<TrackingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Optional bounds for `/orders/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

/// Dashboard order statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_revenue: Money,
    pub total_orders: u64,
    #[serde(default)]
    pub revenue_trend: f64,
    #[serde(default)]
    pub orders_trend: f64,
    #[serde(default)]
    pub sales_by_month: Vec<MonthlySales>,
    #[serde(default)]
    pub orders_by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub month: String,
    pub sales: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesByPeriod {
    pub period: String,
    pub count: u64,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesByStatus {
    pub status: OrderStatus,
    pub count: u64,
    pub total: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_backend_json() {
        let json = serde_json::json!({
            "_id": "ord-1",
            "userId": "u-9",
            "items": [{
                "artwork": {"_id": "aw-1", "title": "Monsoon", "artist": "R. Iyer", "image": "m.jpg"},
                "quantity": 1,
                "price": 15000.0
            }],
            "shippingAddress": {
                "_id": "addr-1", "type": "home", "name": "Asha", "line1": "12 MG Road",
                "city": "Pune", "state": "MH", "postalCode": "411001", "country": "IN",
                "isDefault": true
            },
            "paymentMethod": "upi",
            "paymentStatus": "paid",
            "status": "shipped",
            "trackingInfo": {"carrier": "BlueDart", "trackingNumber": "BD123"},
            "summary": {"subtotal": 15000, "shipping": 0, "tax": 2700, "total": 17700},
            "createdAt": "2024-03-01T10:00:00Z"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.id.as_str(), "ord-1");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method, PaymentMethod::Upi);
        assert_eq!(order.shipping_address.kind, AddressKind::Home);
        assert_eq!(order.summary.total, Money::from_paise(1_770_000));
        assert_eq!(
            order.tracking_info.unwrap().tracking_number,
            "BD123".to_string()
        );
    }

    #[test]
    fn test_date_range_omits_unset_bounds() {
        let range = DateRange {
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: None,
        };
        assert_eq!(
            serde_json::to_value(range).unwrap(),
            serde_json::json!({"fromDate": "2024-01-01"})
        );
    }
}
