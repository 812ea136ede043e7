use crate::db::collection::{CollectionName, Document};
use crate::models::Player;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    #[default]
    Active,
    Retired,
    Dead,
    Npc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProficiencyStub {
    pub id: String,
    pub name: String,
}

impl ProficiencyStub {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A manual experience adjustment, optionally changing the character status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Errata {
    pub ms: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status_change: Option<CharacterStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Building {
    pub name: String,
    pub zone: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Building template a character's building belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaseBuilding {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tier: String,
}

impl BaseBuilding {
    /// Key under which a character's buildings of this type are grouped.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.name, self.kind, self.tier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub player: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(rename = "class", default)]
    pub character_class: Vec<String>,
    #[serde(default)]
    pub status: CharacterStatus,
    #[serde(rename = "masterMS", default)]
    pub master_ms: i64,
    #[serde(rename = "PBCMS", default)]
    pub pbc_ms: i64,
    #[serde(rename = "errataMS", default)]
    pub errata_ms: i64,
    #[serde(rename = "sessionMS", default)]
    pub session_ms: i64,
    #[serde(default)]
    pub errata: Vec<Errata>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_mastered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub reputation: BTreeMap<String, i32>,
    #[serde(default)]
    pub buildings: BTreeMap<String, Vec<Building>>,
    #[serde(default)]
    pub inventory: BTreeMap<String, i64>,
    #[serde(default)]
    pub languages: BTreeSet<ProficiencyStub>,
    #[serde(default)]
    pub money: f64,
    #[serde(default)]
    pub proficiencies: BTreeSet<ProficiencyStub>,
}

impl Character {
    /// Character id: the owning player and the character name.
    pub fn compose_id(player_id: &str, name: &str) -> String {
        format!("{player_id}:{name}")
    }

    pub fn new(player_id: &str, name: &str) -> Self {
        Self {
            id: Self::compose_id(player_id, name),
            name: name.to_string(),
            player: player_id.to_string(),
            race: None,
            territory: None,
            character_class: Vec::new(),
            status: CharacterStatus::Active,
            master_ms: 0,
            pbc_ms: 0,
            errata_ms: 0,
            session_ms: 0,
            errata: Vec::new(),
            created: None,
            last_played: None,
            last_mastered: None,
            age: None,
            reputation: BTreeMap::new(),
            buildings: BTreeMap::new(),
            inventory: BTreeMap::new(),
            languages: BTreeSet::new(),
            money: 0.0,
            proficiencies: BTreeSet::new(),
        }
    }

    /// Total experience from every source.
    pub fn ms(&self) -> i64 {
        self.master_ms + self.pbc_ms + self.errata_ms + self.session_ms
    }
}

impl Document for Character {
    const COLLECTION: CollectionName = CollectionName::Characters;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for character creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterCreationData {
    pub name: String,
    pub starting_level: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub character_class: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

/// The player's selected active character, or every active one when the
/// choice is ambiguous.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveCharacterOrAllActive {
    Current(Character),
    AllActive(Vec<Character>),
}

/// A character joined with the record of the player owning it.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterWithPlayer {
    pub character: Character,
    pub player: Option<Player>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_sums_every_source() {
        let mut c = Character::new("p1", "Aria");
        c.master_ms = 10;
        c.pbc_ms = 5;
        c.errata_ms = -3;
        c.session_ms = 100;
        assert_eq!(c.ms(), 112);
        assert_eq!(c.id, "p1:Aria");
    }

    #[test]
    fn sparse_documents_fill_defaults() {
        let c: Character =
            serde_json::from_str(r#"{"id":"p:x","name":"x","player":"p","PBCMS":7}"#).unwrap();
        assert_eq!(c.pbc_ms, 7);
        assert_eq!(c.status, CharacterStatus::Active);
        assert!(c.inventory.is_empty());
    }
}
