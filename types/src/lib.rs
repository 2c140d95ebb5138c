use serde::{Deserialize, Serialize};

/// `died` value recorded for family members who are still alive.
pub const LIVING_SENTINEL: i32 = 9999;

/// External id of the family's progenitor.
pub const ROOT_MARKER: &str = "0";

// ── Person ───────────────────────────────────────────────────────────────

/// One member of the lineage, as stored in the record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Dot-notation id: "0", "0.1", "0.1.3" …
    pub external_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub died: Option<i32>,
    /// Father's external id, or his name in older records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_at_death: Option<i32>,
    #[serde(default)]
    pub monarch_ids: Vec<String>,
    /// Free-text monarch references predating `monarch_ids`,
    /// e.g. "Gustav Vasa (1523–1560)".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monarch_names: Vec<String>,
    /// Carried succession significance.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notable: bool,
}

impl Person {
    pub fn new(external_id: &str, name: &str) -> Self {
        Self {
            external_id: external_id.to_string(),
            name: name.to_string(),
            born: None,
            died: None,
            father: None,
            age_at_death: None,
            monarch_ids: Vec::new(),
            monarch_names: Vec::new(),
            notable: false,
        }
    }

    pub fn with_years(mut self, born: Option<i32>, died: Option<i32>) -> Self {
        self.born = born;
        self.died = died;
        self
    }

    pub fn with_father(mut self, father: &str) -> Self {
        self.father = Some(father.to_string());
        self
    }

    /// The father reference, with blank strings treated as absent.
    pub fn father_ref(&self) -> Option<&str> {
        self.father.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }

    /// Death year, or `None` when unknown or still living.
    pub fn death_year(&self) -> Option<i32> {
        self.died.filter(|&d| d != LIVING_SENTINEL)
    }

    pub fn is_living(&self) -> bool {
        self.died == Some(LIVING_SENTINEL)
    }

    pub fn is_migrated(&self) -> bool {
        !self.monarch_ids.is_empty()
    }
}

// ── Monarch ──────────────────────────────────────────────────────────────

/// A reign record from the canonical monarch registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monarch {
    /// Stable id, e.g. "gustav-i-vasa".
    pub id: String,
    pub name: String,
    /// "YYYY", "YYYY-MM" or "YYYY-MM-DD".
    pub reign_from: String,
    /// Absent for an ongoing reign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reign_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub died: Option<String>,
}

impl Monarch {
    pub fn new(id: &str, name: &str, reign_from: &str, reign_to: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reign_from: reign_from.to_string(),
            reign_to: Some(reign_to.to_string()),
            born: None,
            died: None,
        }
    }

    /// Year part of `reign_from`.
    pub fn reign_start_year(&self) -> Option<i32> {
        leading_year(&self.reign_from)
    }

    /// Year part of `reign_to`.
    pub fn reign_end_year(&self) -> Option<i32> {
        self.reign_to.as_deref().and_then(leading_year)
    }
}

/// Parse the leading year of a date string ("1523", "1523-06-06").
pub fn leading_year(date: &str) -> Option<i32> {
    let date = date.trim();
    let end = date
        .char_indices()
        .skip(1)
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(date.len(), |(i, _)| i);
    date[..end].parse().ok()
}
