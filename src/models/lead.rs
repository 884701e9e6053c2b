use serde::{Deserialize, Serialize};

use super::Bootcamp;

/// Where a prospect is in the enrollment funnel.
///
/// Any status may move to any other; the API does not enforce transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadStatus {
    Nouveau,
    Contacte,
    Interesse,
    Inscrit,
    Perdu,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::Nouveau,
        LeadStatus::Contacte,
        LeadStatus::Interesse,
        LeadStatus::Inscrit,
        LeadStatus::Perdu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Nouveau => "NOUVEAU",
            LeadStatus::Contacte => "CONTACTE",
            LeadStatus::Interesse => "INTERESSE",
            LeadStatus::Inscrit => "INSCRIT",
            LeadStatus::Perdu => "PERDU",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NOUVEAU" => Ok(Self::Nouveau),
            "CONTACTE" => Ok(Self::Contacte),
            "INTERESSE" => Ok(Self::Interesse),
            "INSCRIT" => Ok(Self::Inscrit),
            "PERDU" => Ok(Self::Perdu),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

/// A prospect who filled in the contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: String,
    pub status: LeadStatus,
    pub bootcamp_id: String,
    pub created_at: String,
    pub updated_at: String,
    /// Denormalized copy of the referenced bootcamp, when the API embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootcamp: Option<Bootcamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub bootcamp_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateLeadStatus {
    pub status: LeadStatus,
}
