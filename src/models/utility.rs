use crate::db::collection::{CollectionName, Document};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::character::ProficiencyStub;

/// Experience thresholds: minimum exp for each level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpTable {
    pub util_type: String,
    /// Exp threshold mapped to the level reached at it.
    pub table: BTreeMap<i64, String>,
}

impl ExpTable {
    pub const UTIL_TYPE: &'static str = "msTable";

    pub fn new(table: BTreeMap<i64, String>) -> Self {
        Self {
            util_type: Self::UTIL_TYPE.to_string(),
            table,
        }
    }

    /// Lowest exp at which `level` is reached.
    pub fn level_to_exp(&self, level: &str) -> Result<i64, StoreError> {
        self.table
            .iter()
            .find(|(_, l)| l.as_str() == level)
            .map(|(exp, _)| *exp)
            .ok_or_else(|| StoreError::InvalidLevel(level.to_string()))
    }
}

impl Document for ExpTable {
    const COLLECTION: CollectionName = CollectionName::Utils;

    fn id(&self) -> &str {
        &self.util_type
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyList {
    pub util_type: String,
    #[serde(default)]
    pub values: Vec<ProficiencyStub>,
}

impl ProficiencyList {
    pub const UTIL_TYPE: &'static str = "proficiencies";

    pub fn new(values: Vec<ProficiencyStub>) -> Self {
        Self {
            util_type: Self::UTIL_TYPE.to_string(),
            values,
        }
    }
}

impl Document for ProficiencyList {
    const COLLECTION: CollectionName = CollectionName::Utils;

    fn id(&self) -> &str {
        &self.util_type
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: String,
    pub message: String,
}

/// A named group of announcement templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementBatch {
    pub id: String,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

impl Document for AnnouncementBatch {
    const COLLECTION: CollectionName = CollectionName::Announcements;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Bookkeeping for the message listing one player's buildings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildingMessage {
    pub id: String,
    pub channel_id: String,
    pub message_id: String,
}

impl Document for BuildingMessage {
    const COLLECTION: CollectionName = CollectionName::BuildingMessages;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ExpTable {
        ExpTable::new(BTreeMap::from([
            (0, "1".to_string()),
            (300, "2".to_string()),
            (900, "3".to_string()),
        ]))
    }

    #[test]
    fn level_to_exp_returns_the_threshold() {
        let t = table();
        assert_eq!(t.level_to_exp("1").unwrap(), 0);
        assert_eq!(t.level_to_exp("3").unwrap(), 900);
        assert!(matches!(t.level_to_exp("20"), Err(StoreError::InvalidLevel(_))));
    }

    #[test]
    fn exp_table_keys_round_trip_through_json() {
        let json = serde_json::to_string(&table()).unwrap();
        assert!(json.contains(r#""utilType":"msTable""#));
        let back: ExpTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table());
    }
}
