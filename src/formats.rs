use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type EntryId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Public,
    Private,
}

impl PublishStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishStatus {
    type Err = anyhow::Error;

    // Case-sensitive: the store rejects `Draft` or `PUBLIC`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "draft" => Ok(Self::Draft),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => anyhow::bail!("unsupported publish status: {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRecord {
    pub title: String,
    pub country: String,
    pub region: Option<String>,
    pub city: Option<String>,
    pub tags: Vec<EntryId>,
    pub price: Option<f64>,
    pub currency: String,
    pub is_free: bool,
    pub highlights: Option<String>,
    pub publish_status: PublishStatus,
    #[serde(rename = "Day")]
    pub days: Vec<DayEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day_type: String,
    pub day_number: u32,
    pub subtitle: String,
    pub recommendation: Option<String>,
    pub google_maps_link: Option<String>,
    pub show_distance_from_last_stop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: EntryId,
    #[serde(default)]
    pub document_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<serde_json::Value>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRef {
    #[serde(default)]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl ItineraryRef {
    pub fn path_id(&self) -> Option<String> {
        self.document_id
            .clone()
            .or_else(|| self.id.map(|id| id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}
