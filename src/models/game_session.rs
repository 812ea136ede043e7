use crate::db::collection::{CollectionName, Document};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A played game session, as recorded by its master.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub master: String,
    pub title: String,
    pub date: NaiveDate,
    /// Days that pass in the game world during the session.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub characters: Vec<String>,
}

impl Document for GameSession {
    const COLLECTION: CollectionName = CollectionName::Sessions;

    fn id(&self) -> &str {
        &self.id
    }
}
