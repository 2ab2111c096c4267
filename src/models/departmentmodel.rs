use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Category embedded in a department. Duplicate names within one department
/// are permitted; tickets snapshot the category name as free text, so there is
/// no referential link back to this list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub categories: Json<Vec<Category>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Department {
    /// One-letter code embedded in ticket numbers.
    pub fn number_code(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('G')
    }
}
