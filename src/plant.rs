//! The plant record and its creation draft.
//!
//! The serde shape (camelCase) is shared verbatim by both store backends:
//! it is the remote table's column layout and the local file's JSON layout,
//! so a record round-trips identically through either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: String,
    /// User-facing nickname; may be empty, display falls back to species.
    pub name: String,
    pub species: String,
    /// Days between waterings, always >= 1.
    pub water_frequency_days: i64,
    /// Set to creation time on insert, to "now" on each successful watering.
    pub last_watered_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Partition key: the owning user's email, or the demo sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Plant {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.species
        } else {
            &self.name
        }
    }
}

/// A plant as submitted for creation — everything but the store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDraft {
    pub name: String,
    pub species: String,
    pub water_frequency_days: i64,
    pub last_watered_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl PlantDraft {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.species.trim().is_empty() {
            anyhow::bail!("Species is required");
        }
        if self.water_frequency_days < 1 {
            anyhow::bail!("Watering frequency must be at least 1 day");
        }
        Ok(())
    }

    pub fn into_plant(self, id: String) -> Plant {
        Plant {
            id,
            name: self.name,
            species: self.species,
            water_frequency_days: self.water_frequency_days,
            last_watered_date: self.last_watered_date,
            image_url: self.image_url,
            light_needs: self.light_needs,
            notes: self.notes,
            user_id: self.user_id,
        }
    }
}

/// Stock photos used when a plant is added without an image.
pub const PLACEHOLDER_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1485955900006-10f4d324d411?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1509423355108-138903112362?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1520412099551-62b6bafeb5bb?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1463936575829-25148e1db1b8?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1501004318641-b39e6451bec6?auto=format&fit=crop&q=80&w=600",
];

pub fn random_placeholder_image() -> String {
    let idx = rand::random_range(0..PLACEHOLDER_IMAGES.len());
    PLACEHOLDER_IMAGES[idx].to_string()
}
