//! Embedded datasets shown while no backend is reachable.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Address, Order, OrderItem, OrderStatus, Product, Review, ReviewProduct, ReviewUser,
};

fn day(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn product(id: &str, name: &str, category: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        sub_category: None,
        price,
        image: Vec::new(),
        description: None,
        sizes: Vec::new(),
        bestseller: false,
    }
}

pub fn products() -> Vec<Product> {
    vec![
        product("1", "Classic T-Shirt", "Men", 25.0),
        product("2", "Summer Dress", "Women", 45.0),
        product("3", "Kids Hoodie", "Kids", 30.0),
    ]
}

fn item(name: &str, quantity: u32, size: &str, price: f64) -> OrderItem {
    OrderItem {
        name: name.to_string(),
        quantity,
        size: size.to_string(),
        price,
    }
}

pub fn orders() -> Vec<Order> {
    vec![
        Order {
            id: "1001".to_string(),
            date: day(2023, 10, 15),
            status: OrderStatus::OrderPlaced,
            address: Address {
                name: "John Doe".to_string(),
                street: "123 Main St".to_string(),
                city: "New York".to_string(),
                state: "NY".to_string(),
                pin: "10001".to_string(),
                phone: "+1 123-456-7890".to_string(),
            },
            items: vec![item("Classic T-Shirt", 2, "M", 25.0)],
            amount: None,
            payment_method: None,
            payment: false,
        },
        Order {
            id: "1002".to_string(),
            date: day(2023, 10, 10),
            status: OrderStatus::Packing,
            address: Address {
                name: "Jane Smith".to_string(),
                street: "456 Oak Ave".to_string(),
                city: "Los Angeles".to_string(),
                state: "CA".to_string(),
                pin: "90001".to_string(),
                phone: "+1 987-654-3210".to_string(),
            },
            items: vec![
                item("Summer Dress", 1, "S", 45.0),
                item("Denim Jacket", 1, "M", 60.0),
            ],
            amount: None,
            payment_method: None,
            payment: false,
        },
    ]
}

fn review(
    id: &str,
    name: &str,
    email: &str,
    date: Option<DateTime<Utc>>,
    product: &str,
    rating: u8,
    text: &str,
) -> Review {
    Review {
        id: id.to_string(),
        name: Some(name.to_string()),
        user: Some(ReviewUser {
            name: name.to_string(),
            email: email.to_string(),
        }),
        date,
        product_name: Some(product.to_string()),
        product: Some(ReviewProduct {
            name: product.to_string(),
        }),
        rating,
        review: text.to_string(),
        image: None,
    }
}

pub fn reviews() -> Vec<Review> {
    vec![
        review(
            "101",
            "John Doe",
            "john@example.com",
            day(2023, 10, 5),
            "Classic T-Shirt",
            5,
            "Great quality and comfortable fit. Would definitely buy again! The fabric is soft \
             and the sizing is perfect. I ordered my usual size and it fits just right. The color \
             is exactly as shown in the photos. Highly recommended for anyone looking for a \
             reliable everyday t-shirt.",
        ),
        review(
            "102",
            "Jane Smith",
            "jane@example.com",
            day(2023, 9, 28),
            "Summer Dress",
            4,
            "Beautiful dress but runs a bit small. Otherwise very happy with it. The material is \
             lightweight and perfect for summer.",
        ),
        review(
            "103",
            "Mike Johnson",
            "mike@example.com",
            day(2023, 9, 15),
            "Denim Jacket",
            3,
            "Average quality. The color is slightly different from the photos. It is still \
             wearable, but I expected better quality for the price.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_sets_have_unique_ids() {
        let ids: std::collections::HashSet<_> = products().into_iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(orders()[1].total(), 105.0);
        assert!(reviews().iter().all(|r| (1..=5).contains(&r.rating)));
    }
}
