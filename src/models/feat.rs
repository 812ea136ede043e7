use crate::db::collection::{CollectionName, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feat {
    pub name: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub link: String,
}

impl Document for Feat {
    const COLLECTION: CollectionName = CollectionName::Feats;

    fn id(&self) -> &str {
        &self.name
    }
}
