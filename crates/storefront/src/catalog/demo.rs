//! Built-in demo catalog.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use lumiere_core::ProductId;

use super::{Inventory, Product};

struct Book {
    id: i32,
    title: &'static str,
    author: &'static str,
    cents: i64,
    original_cents: Option<i64>,
    rating: f32,
    review_count: u32,
    category: &'static str,
    description: &'static str,
    stock: i32,
    reserved: i32,
    tags: &'static [&'static str],
    added: (u32, u32),
}

fn added_on((month, day): (u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

impl From<Book> for Product {
    fn from(book: Book) -> Self {
        Self {
            id: ProductId::new(book.id),
            title: book.title.to_string(),
            author: book.author.to_string(),
            description: book.description.to_string(),
            price: Decimal::new(book.cents, 2),
            original_price: book.original_cents.map(|cents| Decimal::new(cents, 2)),
            rating: book.rating,
            review_count: book.review_count,
            category: book.category.to_string(),
            tags: book.tags.iter().map(ToString::to_string).collect(),
            is_active: true,
            inventory: Inventory {
                quantity: book.stock,
                reserved_quantity: book.reserved,
            },
            created_at: added_on(book.added),
        }
    }
}

pub(super) fn products() -> Vec<Product> {
    [
        Book {
            id: 1,
            title: "Les Murmures du Temps",
            author: "Marie Dubois",
            cents: 2490,
            original_cents: Some(2990),
            rating: 4.5,
            review_count: 127,
            category: "Fiction",
            description: "Une odyssée littéraire captivante qui explore les mystères du temps.",
            stock: 47,
            reserved: 3,
            tags: &["Bestseller", "Nouveau"],
            added: (1, 15),
        },
        Book {
            id: 2,
            title: "Le Jardin des Secrets",
            author: "Pierre Martin",
            cents: 1990,
            original_cents: None,
            rating: 4.2,
            review_count: 89,
            category: "Romance",
            description: "Un roman touchant sur l'amour et les secrets de famille.",
            stock: 23,
            reserved: 1,
            tags: &["Romance"],
            added: (2, 1),
        },
        Book {
            id: 3,
            title: "Histoire de France",
            author: "Jean Leclerc",
            cents: 3500,
            original_cents: None,
            rating: 4.8,
            review_count: 203,
            category: "Histoire",
            description: "Une histoire complète et accessible de la France.",
            stock: 15,
            reserved: 0,
            tags: &["Éducation", "Référence"],
            added: (1, 20),
        },
        Book {
            id: 4,
            title: "Cuisine du Monde",
            author: "Sophie Chen",
            cents: 2850,
            original_cents: None,
            rating: 4.6,
            review_count: 156,
            category: "Cuisine",
            description: "Découvrez les saveurs du monde entier avec ces recettes authentiques.",
            stock: 0,
            reserved: 0,
            tags: &["Cuisine", "Voyage"],
            added: (3, 5),
        },
        Book {
            id: 5,
            title: "Guide du Développeur",
            author: "Alex Johnson",
            cents: 4200,
            original_cents: None,
            rating: 4.7,
            review_count: 94,
            category: "Informatique",
            description: "Le guide complet pour devenir un développeur web moderne.",
            stock: 31,
            reserved: 0,
            tags: &["Technique", "Programmation"],
            added: (4, 12),
        },
        Book {
            id: 6,
            title: "Méditation et Bien-être",
            author: "Luna Wellness",
            cents: 1690,
            original_cents: None,
            rating: 4.3,
            review_count: 78,
            category: "Bien-être",
            description: "Techniques de méditation pour une vie plus sereine.",
            stock: 42,
            reserved: 0,
            tags: &["Bien-être", "Spiritualité"],
            added: (5, 2),
        },
    ]
    .into_iter()
    .map(Product::from)
    .collect()
}
