use serde::{Deserialize, Deserializer, Serialize};

/// A bootcamp as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Human readable, e.g. "12 semaines"
    pub duration: String,
    /// Whole amount in FCFA, sent as a decimal string
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    /// ISO 8601 start of the next session
    pub next_session: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBootcamp {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub price: u64,
    pub next_session: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBootcamp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateBootcamp {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Some deployments send `price` as a JSON number; keep it as the string form either way.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
