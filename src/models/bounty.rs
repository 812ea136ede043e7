use crate::db::collection::{CollectionName, Document};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnnouncementType {
    CriticalFail,
    Fail,
    Success,
    Jackpot,
}

/// One possible reward of a bounty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub probability: f32,
    #[serde(default)]
    pub mo_delta: i32,
    #[serde(default)]
    pub guaranteed_object_id: Option<String>,
    #[serde(default)]
    pub guaranteed_object_delta: i32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub announce_id: Option<AnnouncementType>,
}

/// Older documents store a missing announcement as `""`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<AnnouncementType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Kind(AnnouncementType),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Kind(kind)) => Ok(Some(kind)),
        Some(Raw::Text(text)) if text.is_empty() => Ok(None),
        Some(Raw::Text(text)) => Err(serde::de::Error::custom(format!(
            "unknown announcement type: {text}"
        ))),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bounty {
    pub id: String,
    #[serde(default)]
    pub prizes: Vec<Prize>,
}

impl Document for Bounty {
    const COLLECTION: CollectionName = CollectionName::Bounties;

    fn id(&self) -> &str {
        &self.id
    }
}
