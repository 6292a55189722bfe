//! Wardrobe domain types.
//!
//! Items are owned by the persistence collaborator; the inference path only
//! reads the summarized projection (`category(color, style)`) and produces
//! new [`Classification`]s that the caller turns into [`WardrobeItem`]s.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Clothing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Shoes,
    Outerwear,
    Accessory,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Top,
        Category::Bottom,
        Category::Shoes,
        Category::Outerwear,
        Category::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Shoes => "shoes",
            Self::Outerwear => "outerwear",
            Self::Accessory => "accessory",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// Accepts the canonical names plus the common synonyms models reply with,
    /// including Chinese labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let category = match normalized.as_str() {
            "top" | "tops" | "shirt" | "t-shirt" | "blouse" | "sweater" | "hoodie" | "上装"
            | "上衣" => Self::Top,
            "bottom" | "bottoms" | "pants" | "trousers" | "jeans" | "skirt" | "shorts"
            | "下装" | "裤子" => Self::Bottom,
            "shoes" | "shoe" | "footwear" | "sneakers" | "boots" | "鞋" | "鞋子" => Self::Shoes,
            "outerwear" | "jacket" | "coat" | "外套" => Self::Outerwear,
            "accessory" | "accessories" | "hat" | "bag" | "scarf" | "belt" | "配饰" => {
                Self::Accessory
            }
            _ => return Err(format!("unknown clothing category: {s:?}")),
        };
        Ok(category)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One per-image classification produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub color: String,
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// The model's stated rationale, when it gives one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A stored clothing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: String,
    pub category: Category,
    pub color: String,
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// URL or data URI of the photo.
    pub image_ref: String,
    pub created_at: DateTime<Utc>,
}

impl WardrobeItem {
    /// Build the record persisted after a scan.
    pub fn from_classification(classification: Classification, image_ref: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: classification.category,
            color: classification.color,
            style: classification.style,
            material: classification.material,
            image_ref: image_ref.into(),
            created_at: Utc::now(),
        }
    }

    /// Prompt projection: `category(color, style)`.
    pub fn summary(&self) -> String {
        format!(
            "{}({}, {})",
            self.category,
            or_unspecified(&self.color),
            or_unspecified(&self.style)
        )
    }
}

fn or_unspecified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { "unspecified" } else { trimmed }
}

/// Recommended outfit returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitPlan {
    pub outfit: Vec<OutfitPick>,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitPick {
    pub item: String,
    pub reason: String,
}

/// User feedback on a past recommendation. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub score: u8,
    pub comment: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

impl FeedbackRecord {
    pub const MIN_SCORE: u8 = 1;
    pub const MAX_SCORE: u8 = 5;

    /// Create a record dated today (UTC).
    pub fn new(score: u8, comment: impl Into<String>) -> Result<Self, StoreError> {
        if !(Self::MIN_SCORE..=Self::MAX_SCORE).contains(&score) {
            return Err(StoreError::InvalidRecord(format!(
                "feedback score must be between {} and {}, got {score}",
                Self::MIN_SCORE,
                Self::MAX_SCORE
            )));
        }
        Ok(Self {
            score,
            comment: comment.into(),
            date: Utc::now().format("%Y-%m-%d").to_string(),
        })
    }
}
