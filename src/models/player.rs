use crate::db::collection::{CollectionName, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub active_character: Option<String>,
}

impl Player {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            active_character: None,
        }
    }
}

impl Document for Player {
    const COLLECTION: CollectionName = CollectionName::Players;

    fn id(&self) -> &str {
        &self.player_id
    }
}
