//! The recipe record serialized into archive entries.

use serde::{Deserialize, Serialize};

/// One recipe in the import schema the recipe manager expects. Only populated
/// fields appear in the JSON output; the importer treats absent keys as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cook_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_large: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_data: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub total_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prep_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub servings: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rating: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub directions: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nutritional_info: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ingredients: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
}

fn is_zero(rating: &i64) -> bool {
    *rating == 0
}
