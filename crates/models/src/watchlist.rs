use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistAddItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistItem {
    pub id: i64,
    pub user_symbol: String,
    pub normalized_symbol: String,
    pub email: Option<String>,
}
