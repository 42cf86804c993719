//! Records exchanged with the store backend and the `{success, message, ...}`
//! envelope every endpoint answers with.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Dates arrive either as epoch milliseconds or as an ISO-8601 string.
mod timestamp {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_i64(dt.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => None,
            Some(Raw::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
            Some(Raw::Float(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
            Some(Raw::Text(s)) => parse_text(&s),
        })
    }

    fn parse_text(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ms) = s.parse::<i64>() {
            return Utc.timestamp_millis_opt(ms).single();
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(
        default,
        rename = "subCategory",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub bestseller: bool,
}

/// Fulfilment stages, in the order an order moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[serde(rename = "Packing")]
    Packing,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
    /// Any status this client does not know; never sent back.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::OrderPlaced,
        OrderStatus::Packing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "Order Placed",
            OrderStatus::Packing => "Packing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    /// Case-insensitive; `-`/`_` are accepted in place of spaces.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().to_lowercase() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown order status {:?}, expected one of {:?}", s, names)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, with = "timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(
        default,
        rename = "paymentMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment: bool,
}

impl Order {
    /// Sum of price x quantity over the line items.
    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.price * f64::from(i.quantity))
            .sum()
    }

    /// True when the order was placed on `day` (UTC calendar day).
    pub fn placed_on(&self, day: NaiveDate) -> bool {
        self.date.map(|d| d.date_naive() == day).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewProduct {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ReviewUser>,
    #[serde(default, with = "timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "productName",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ReviewProduct>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub image: Option<String>,
}

const REVIEW_PREVIEW_CHARS: usize = 100;

impl Review {
    /// Reviewer's first name: user name, then review name, else "Anonymous".
    pub fn reviewer_first_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|n| !n.trim().is_empty()))
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("Anonymous")
    }

    pub fn product_display_name(&self) -> &str {
        self.product
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .or_else(|| self.product_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Unknown Product")
    }

    /// Review text cut to 100 characters with a trailing `...`.
    pub fn preview(&self) -> String {
        truncate(&self.review, REVIEW_PREVIEW_CHARS)
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Every backend answer: `success` flag, optional `message`, payload fields
/// flattened next to them.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// `Ok(data)` when the backend reported success, else an `Api` error
    /// carrying its message (or `fallback`).
    pub fn into_result(self, fallback: &str) -> Result<T> {
        if self.success {
            Ok(self.data)
        } else {
            Err(Error::api(self.message, fallback))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewList {
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
}

/// Payload of endpoints that only acknowledge.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_parses_backend_shape() {
        let raw = json!({
            "_id": "64f1",
            "userId": "u1",
            "date": 1697328000000i64,
            "status": "Out for delivery",
            "address": { "name": "John Doe", "street": "123 Main St", "city": "New York",
                         "state": "NY", "pin": "10001", "phone": "+1 123-456-7890",
                         "email": "john@example.com" },
            "items": [ { "name": "Classic T-Shirt", "quantity": 2, "size": "M", "price": 25 },
                       { "name": "Cap", "quantity": 1, "size": "L", "price": 10.5 } ],
            "amount": 60.5,
            "paymentMethod": "COD",
            "payment": false
        });
        let order: Order = serde_json::from_value(raw).unwrap();
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.total(), 60.5);
        assert!(order.placed_on(NaiveDate::from_ymd_opt(2023, 10, 15).unwrap()));
        assert_eq!(order.payment_method.as_deref(), Some("COD"));
    }

    #[test]
    fn dates_accept_iso_strings() {
        let order: Order = serde_json::from_value(json!({
            "_id": "1", "status": "Packing", "date": "2023-10-10T00:00:00.000Z"
        }))
        .unwrap();
        assert!(order.placed_on(NaiveDate::from_ymd_opt(2023, 10, 10).unwrap()));
        assert!(!order.placed_on(NaiveDate::from_ymd_opt(2023, 10, 11).unwrap()));
    }

    #[test]
    fn status_serializes_to_display_names() {
        let v = serde_json::to_value(OrderStatus::OrderPlaced).unwrap();
        assert_eq!(v, json!("Order Placed"));
        assert_eq!("out-for-delivery".parse::<OrderStatus>(), Ok(OrderStatus::OutForDelivery));
        assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn unrecognised_status_still_parses() {
        let order: Order = serde_json::from_value(json!({ "_id": "7", "status": "Returned" })).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.status.to_string(), "Unknown");
        assert!(!OrderStatus::ALL.contains(&OrderStatus::Unknown));
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn envelope_success_and_failure() {
        let ok: ApiResponse<ProductList> = serde_json::from_value(json!({
            "success": true,
            "products": [ { "_id": "9", "name": "Hat", "category": "Men", "price": 12 } ]
        }))
        .unwrap();
        let list = ok.into_result("Failed to load products").unwrap();
        assert_eq!(list.products.len(), 1);
        assert_eq!(list.products[0].price, 12.0);

        let failed: ApiResponse<ProductList> =
            serde_json::from_value(json!({ "success": false, "message": "Not Authorized" })).unwrap();
        let err = failed.into_result("Failed to load products").unwrap_err();
        assert_eq!(err.to_string(), "Not Authorized");

        let ack: ApiResponse<Ack> =
            serde_json::from_value(json!({ "success": true, "message": "Status Updated" })).unwrap();
        assert!(ack.into_result("x").is_ok());
    }

    #[test]
    fn review_display_helpers() {
        let review: Review = serde_json::from_value(json!({
            "_id": "r1",
            "name": "Jane Smith",
            "productName": "Summer Dress",
            "rating": 4,
            "review": "x".repeat(120)
        }))
        .unwrap();
        assert_eq!(review.reviewer_first_name(), "Jane");
        assert_eq!(review.product_display_name(), "Summer Dress");
        assert_eq!(review.preview().len(), 103);

        let anon: Review = serde_json::from_value(json!({ "_id": "r2" })).unwrap();
        assert_eq!(anon.reviewer_first_name(), "Anonymous");
        assert_eq!(anon.product_display_name(), "Unknown Product");
    }
}
