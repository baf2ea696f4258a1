use serde::Serialize;

use super::selector::Field;

/// Placeholder for a field no strategy could resolve.
pub const UNKNOWN: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Result of resolving one field, kept for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Resolved {
        value: FieldValue,
        strategy: &'static str,
    },
    Unresolved,
}

impl ExtractionOutcome {
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            ExtractionOutcome::Resolved { strategy, .. } => Some(strategy),
            ExtractionOutcome::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    ExternalId(String),
    DetailLink(String),
}

/// One job posting. Unresolved text fields hold [`UNKNOWN`], unresolved
/// skills are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience: String,
    pub rating: String,
    pub skills: Vec<String>,
    pub posted_date: String,
    pub detail_link: String,
    pub external_id: String,
    pub description: String,
}

impl Listing {
    pub fn is_known(value: &str) -> bool {
        value != UNKNOWN
    }

    pub fn has_title(&self) -> bool {
        Self::is_known(&self.title)
    }

    /// External id when present, else the detail link, else nothing.
    pub fn identity(&self) -> Option<IdentityKey> {
        if Self::is_known(&self.external_id) {
            Some(IdentityKey::ExternalId(self.external_id.clone()))
        } else if Self::is_known(&self.detail_link) {
            Some(IdentityKey::DetailLink(self.detail_link.clone()))
        } else {
            None
        }
    }

    pub fn skills_line(&self) -> String {
        match self.skills.is_empty() {
            true => UNKNOWN.to_string(),
            false => self.skills.join(", "),
        }
    }
}

/// Collects resolved fields for one container before freezing them.
#[derive(Debug, Default)]
pub struct ListingDraft {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    experience: Option<String>,
    rating: Option<String>,
    skills: Vec<String>,
    posted_date: Option<String>,
    detail_link: Option<String>,
    external_id: Option<String>,
    description: Option<String>,
}

impl ListingDraft {
    pub fn apply(&mut self, field: Field, outcome: ExtractionOutcome) {
        let value = match outcome {
            ExtractionOutcome::Resolved { value, .. } => value,
            ExtractionOutcome::Unresolved => return,
        };

        let text = match value {
            FieldValue::List(items) => {
                if field.is_multi_valued() {
                    self.skills = items;
                    return;
                }
                items.join(", ")
            }
            FieldValue::Text(text) if field.is_multi_valued() => {
                self.skills = vec![text];
                return;
            }
            FieldValue::Text(text) => text,
        };

        let slot = match field {
            Field::Title => &mut self.title,
            Field::Company => &mut self.company,
            Field::Location => &mut self.location,
            Field::Experience => &mut self.experience,
            Field::Rating => &mut self.rating,
            Field::PostedDate => &mut self.posted_date,
            Field::DetailLink => &mut self.detail_link,
            Field::ExternalId => &mut self.external_id,
            Field::Description => &mut self.description,
            Field::Skills => return,
        };
        *slot = Some(text);
    }

    pub fn finish(self) -> Listing {
        fn or_unknown(value: Option<String>) -> String {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        }

        Listing {
            title: or_unknown(self.title),
            company: or_unknown(self.company),
            location: or_unknown(self.location),
            experience: or_unknown(self.experience),
            rating: or_unknown(self.rating),
            skills: self
                .skills
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
            posted_date: or_unknown(self.posted_date),
            detail_link: or_unknown(self.detail_link),
            external_id: or_unknown(self.external_id),
            description: or_unknown(self.description),
        }
    }
}
