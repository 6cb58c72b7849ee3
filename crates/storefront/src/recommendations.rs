//! Book recommendations.
//!
//! Recommendations are static editorial data grouped in four tabs. Titles
//! that are not part of the catalog use ids from 101 up so they never clash
//! with catalog ids, and [`find_book`] resolves them for the cart and the
//! wishlist.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lumiere_core::ProductId;

use crate::catalog::{Inventory, Product};

/// Confidence above which a personalized pick is a top match.
const TOP_MATCH_CONFIDENCE: u8 = 90;
/// Trend score above which a trending title is hot.
const HOT_TREND_SCORE: u8 = 95;
/// Stock given to recommendation-only titles.
const RECOMMENDATION_STOCK: i32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationTab {
    #[default]
    Personalized,
    Trending,
    Similar,
    NewReleases,
}

impl RecommendationTab {
    pub const ALL: [Self; 4] = [
        Self::Personalized,
        Self::Trending,
        Self::Similar,
        Self::NewReleases,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personalized => "personalized",
            Self::Trending => "trending",
            Self::Similar => "similar",
            Self::NewReleases => "new-releases",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personalized => "Pour vous",
            Self::Trending => "Tendances",
            Self::Similar => "Similaires",
            Self::NewReleases => "Nouveautés",
        }
    }
}

impl FromStr for RecommendationTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| format!("unknown recommendation tab: {s}"))
    }
}

/// Why a title is recommended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Reason {
    Personalized { reason: &'static str, confidence: u8 },
    Trending { trend_score: u8 },
    Similar { similar_to: &'static str },
    NewRelease { release_date: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    TopMatch,
    Hot,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: ProductId,
    pub title: &'static str,
    pub author: &'static str,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub rating: f32,
    pub review_count: u32,
    pub category: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    #[serde(flatten)]
    pub reason: Reason,
}

impl Recommendation {
    #[must_use]
    pub fn badges(&self) -> Vec<Badge> {
        match self.reason {
            Reason::Personalized { confidence, .. } if confidence > TOP_MATCH_CONFIDENCE => {
                vec![Badge::TopMatch]
            }
            Reason::Trending { trend_score } if trend_score > HOT_TREND_SCORE => vec![Badge::Hot],
            Reason::NewRelease { .. } => vec![Badge::New],
            _ => Vec::new(),
        }
    }

    /// The explanation line shown under the title.
    #[must_use]
    pub fn explanation(&self) -> Option<String> {
        match &self.reason {
            Reason::Personalized { reason, .. } => Some((*reason).to_string()),
            Reason::Similar { similar_to } => Some(format!("Similaire à \"{similar_to}\"")),
            Reason::Trending { .. } | Reason::NewRelease { .. } => None,
        }
    }

    fn as_product(&self) -> Product {
        let created_at = match self.reason {
            Reason::NewRelease { release_date } => release_date
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .unwrap_or_default(),
            _ => DateTime::<Utc>::default(),
        };

        Product {
            id: self.id,
            title: self.title.to_string(),
            author: self.author.to_string(),
            description: self.description.to_string(),
            price: self.price,
            original_price: self.original_price,
            rating: self.rating,
            review_count: self.review_count,
            category: self.category.to_string(),
            tags: self.tags.iter().map(ToString::to_string).collect(),
            is_active: true,
            inventory: Inventory {
                quantity: RECOMMENDATION_STOCK,
                reserved_quantity: 0,
            },
            created_at,
        }
    }
}

/// A recommendation with its computed badges, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationView {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub badges: Vec<Badge>,
    pub explanation: Option<String>,
}

impl From<Recommendation> for RecommendationView {
    fn from(recommendation: Recommendation) -> Self {
        Self {
            badges: recommendation.badges(),
            explanation: recommendation.explanation(),
            recommendation,
        }
    }
}

/// Recommendations of one tab.
#[must_use]
pub fn for_tab(tab: RecommendationTab) -> Vec<Recommendation> {
    all().into_iter().filter(|r| tab_of(&r.reason) == tab).collect()
}

/// Resolve a recommendation-only title by id.
#[must_use]
pub fn find_book(id: ProductId) -> Option<Product> {
    all()
        .iter()
        .find(|r| r.id == id && id.as_i32() > 100)
        .map(Recommendation::as_product)
}

const fn tab_of(reason: &Reason) -> RecommendationTab {
    match reason {
        Reason::Personalized { .. } => RecommendationTab::Personalized,
        Reason::Trending { .. } => RecommendationTab::Trending,
        Reason::Similar { .. } => RecommendationTab::Similar,
        Reason::NewRelease { .. } => RecommendationTab::NewReleases,
    }
}

fn release(month: u32, day: u32) -> Reason {
    Reason::NewRelease {
        release_date: NaiveDate::from_ymd_opt(2024, month, day).unwrap_or_default(),
    }
}

#[allow(clippy::too_many_lines)]
fn all() -> Vec<Recommendation> {
    vec![
        Recommendation {
            id: ProductId::new(1),
            title: "Les Murmures du Temps",
            author: "Marie Dubois",
            price: Decimal::new(2490, 2),
            original_price: Some(Decimal::new(2990, 2)),
            rating: 4.5,
            review_count: 127,
            category: "Fiction",
            description: "Une odyssée littéraire captivante qui explore les mystères du temps.",
            tags: &["Bestseller", "Nouveau"],
            reason: Reason::Personalized {
                reason: "Basé sur vos lectures de fiction contemporaine",
                confidence: 95,
            },
        },
        Recommendation {
            id: ProductId::new(102),
            title: "L'Art de la Méditation",
            author: "Zen Master",
            price: Decimal::new(1890, 2),
            original_price: None,
            rating: 4.7,
            review_count: 89,
            category: "Bien-être",
            description: "Guide pratique pour débuter la méditation au quotidien.",
            tags: &["Bien-être"],
            reason: Reason::Personalized {
                reason: "Recommandé pour votre intérêt pour le développement personnel",
                confidence: 87,
            },
        },
        Recommendation {
            id: ProductId::new(103),
            title: "Cuisine Végétarienne Moderne",
            author: "Chef Verde",
            price: Decimal::new(3200, 2),
            original_price: None,
            rating: 4.4,
            review_count: 156,
            category: "Cuisine",
            description: "Recettes innovantes pour une cuisine végétarienne savoureuse.",
            tags: &["Cuisine", "Végétarien"],
            reason: Reason::Personalized {
                reason: "Basé sur vos achats récents en cuisine",
                confidence: 78,
            },
        },
        Recommendation {
            id: ProductId::new(104),
            title: "Le Phénomène TikTok",
            author: "Digital Expert",
            price: Decimal::new(2250, 2),
            original_price: None,
            rating: 4.2,
            review_count: 234,
            category: "Technologie",
            description: "Analyse du succès des réseaux sociaux modernes.",
            tags: &["Tendance", "Réseaux sociaux"],
            reason: Reason::Trending { trend_score: 98 },
        },
        Recommendation {
            id: ProductId::new(105),
            title: "Investir en 2024",
            author: "Finance Pro",
            price: Decimal::new(2890, 2),
            original_price: None,
            rating: 4.6,
            review_count: 178,
            category: "Finance",
            description: "Stratégies d'investissement pour l'année en cours.",
            tags: &["Finance", "Investissement"],
            reason: Reason::Trending { trend_score: 94 },
        },
        Recommendation {
            id: ProductId::new(106),
            title: "Chroniques Temporelles",
            author: "Time Writer",
            price: Decimal::new(2650, 2),
            original_price: None,
            rating: 4.3,
            review_count: 92,
            category: "Fiction",
            description: "Une saga épique à travers les époques.",
            tags: &["Fiction", "Saga"],
            reason: Reason::Similar {
                similar_to: "Les Murmures du Temps",
            },
        },
        Recommendation {
            id: ProductId::new(107),
            title: "Secrets du Temps",
            author: "Mystery Author",
            price: Decimal::new(2190, 2),
            original_price: None,
            rating: 4.1,
            review_count: 67,
            category: "Mystère",
            description: "Un thriller captivant mêlant science et mystère.",
            tags: &["Mystère", "Thriller"],
            reason: Reason::Similar {
                similar_to: "Les Murmures du Temps",
            },
        },
        Recommendation {
            id: ProductId::new(108),
            title: "IA et Créativité",
            author: "Tech Visionary",
            price: Decimal::new(3500, 2),
            original_price: None,
            rating: 4.8,
            review_count: 45,
            category: "Technologie",
            description: "L'impact de l'intelligence artificielle sur la créativité humaine.",
            tags: &["IA", "Créativité", "Nouveau"],
            reason: release(9, 15),
        },
        Recommendation {
            id: ProductId::new(109),
            title: "Recettes d'Automne",
            author: "Seasonal Chef",
            price: Decimal::new(2450, 2),
            original_price: None,
            rating: 4.5,
            review_count: 23,
            category: "Cuisine",
            description: "Saveurs et couleurs de la saison automnale.",
            tags: &["Cuisine", "Saisonnier", "Nouveau"],
            reason: release(9, 10),
        },
    ]
}
