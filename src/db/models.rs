use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbAdmin {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub fullname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbPrompt {
    pub id: i64,
    pub model: String,
    pub prompt: String,
    pub updated_at: DateTime<Utc>,
}
