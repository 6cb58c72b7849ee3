//! Demo orders.
//!
//! Orders 1-4 belong to other shoppers and fill the admin panel; orders 5-7
//! are the order history of the demo customer account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use lumiere_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{CustomerContact, Order, OrderItem, ShippingAddress, default_country};

fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn address(street: &str, city: &str, postal_code: &str) -> ShippingAddress {
    ShippingAddress {
        street: street.to_string(),
        city: city.to_string(),
        postal_code: postal_code.to_string(),
        country: default_country(),
    }
}

fn contact(first_name: &str, last_name: &str, email: &str) -> CustomerContact {
    CustomerContact {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
    }
}

fn murmures() -> OrderItem {
    OrderItem {
        product_id: ProductId::new(1),
        title: "Les Murmures du Temps".to_string(),
        author: "Marie Dubois".to_string(),
        quantity: 1,
        unit_price: Decimal::new(2490, 2),
    }
}

fn jardin() -> OrderItem {
    OrderItem {
        product_id: ProductId::new(2),
        title: "Le Jardin des Secrets".to_string(),
        author: "Pierre Martin".to_string(),
        quantity: 1,
        unit_price: Decimal::new(1990, 2),
    }
}

fn histoire() -> OrderItem {
    OrderItem {
        product_id: ProductId::new(3),
        title: "Histoire de France".to_string(),
        author: "Jean Leclerc".to_string(),
        quantity: 1,
        unit_price: Decimal::new(3500, 2),
    }
}

struct Seed {
    id: i32,
    number: &'static str,
    user: &'static str,
    customer: CustomerContact,
    status: OrderStatus,
    items: Vec<OrderItem>,
    address: ShippingAddress,
    created_at: &'static str,
    updated_at: &'static str,
}

impl From<Seed> for Order {
    fn from(seed: Seed) -> Self {
        let total_amount = seed.items.iter().map(OrderItem::line_total).sum();
        Self {
            id: OrderId::new(seed.id),
            order_number: seed.number.to_string(),
            user_id: UserId::new(seed.user),
            customer: seed.customer,
            status: seed.status,
            items: seed.items,
            shipping_address: seed.address,
            shipping_cost: Decimal::ZERO,
            total_amount,
            created_at: at(seed.created_at),
            updated_at: at(seed.updated_at),
        }
    }
}

pub(super) fn orders() -> Vec<Order> {
    let demo_customer = || contact("Client", "Demo", "client@email.com");

    [
        Seed {
            id: 1,
            number: "CMD-2024-001",
            user: "user1",
            customer: contact("Marie", "Dupont", "marie.dupont@email.com"),
            status: OrderStatus::Pending,
            items: vec![murmures()],
            address: address("123 Rue de la Paix", "Paris", "75001"),
            created_at: "2024-09-16T10:30:00Z",
            updated_at: "2024-09-16T10:30:00Z",
        },
        Seed {
            id: 2,
            number: "CMD-2024-002",
            user: "user2",
            customer: contact("Pierre", "Martin", "pierre.martin@email.com"),
            status: OrderStatus::Processing,
            items: vec![murmures(), jardin()],
            address: address("456 Avenue des Champs", "Lyon", "69001"),
            created_at: "2024-09-16T09:15:00Z",
            updated_at: "2024-09-16T11:00:00Z",
        },
        Seed {
            id: 3,
            number: "CMD-2024-003",
            user: "user3",
            customer: contact("Sophie", "Leroy", "sophie.leroy@email.com"),
            status: OrderStatus::Shipped,
            items: vec![histoire()],
            address: address("789 Boulevard Saint-Germain", "Marseille", "13001"),
            created_at: "2024-09-15T14:20:00Z",
            updated_at: "2024-09-16T08:30:00Z",
        },
        Seed {
            id: 4,
            number: "CMD-2024-004",
            user: "user4",
            customer: contact("Jean", "Dubois", "jean.dubois@email.com"),
            status: OrderStatus::Delivered,
            items: vec![murmures()],
            address: address("321 Rue de Rivoli", "Paris", "75004"),
            created_at: "2024-09-14T16:45:00Z",
            updated_at: "2024-09-15T10:15:00Z",
        },
        Seed {
            id: 5,
            number: "CMD-2024-005",
            user: "customer-demo",
            customer: demo_customer(),
            status: OrderStatus::Delivered,
            items: vec![murmures()],
            address: address("123 Rue de la Paix", "Paris", "75001"),
            created_at: "2024-09-10T10:30:00Z",
            updated_at: "2024-09-12T14:20:00Z",
        },
        Seed {
            id: 6,
            number: "CMD-2024-006",
            user: "customer-demo",
            customer: demo_customer(),
            status: OrderStatus::Shipped,
            items: vec![murmures(), jardin()],
            address: address("456 Avenue des Champs", "Lyon", "69001"),
            created_at: "2024-09-14T16:45:00Z",
            updated_at: "2024-09-15T09:30:00Z",
        },
        Seed {
            id: 7,
            number: "CMD-2024-007",
            user: "customer-demo",
            customer: demo_customer(),
            status: OrderStatus::Processing,
            items: vec![histoire()],
            address: address("789 Boulevard Saint-Germain", "Marseille", "13001"),
            created_at: "2024-09-16T08:15:00Z",
            updated_at: "2024-09-16T08:15:00Z",
        },
    ]
    .into_iter()
    .map(Order::from)
    .collect()
}
