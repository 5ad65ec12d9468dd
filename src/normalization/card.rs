use crate::extraction::{CardAttributes, Stage};

use super::extension::extension_from_url;

/// Canonical card row, keyed by its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub url: String,
    pub name: Option<String>,
    pub element_type: Option<String>,
    pub hp: Option<i64>,
    pub stage: Option<Stage>,
    pub evolves_from: Option<String>,
    pub weakness: Option<String>,
    pub retreat: Option<String>,
    pub extension: Option<String>,
}

impl CardRecord {
    pub fn from_attributes(url: &str, attrs: CardAttributes) -> Self {
        Self {
            url: url.to_string(),
            hp: attrs.hp.as_deref().and_then(coerce_hp),
            name: attrs.name,
            element_type: attrs.element_type,
            stage: attrs.stage,
            evolves_from: attrs.evolves_from,
            weakness: attrs.weakness,
            retreat: attrs.retreat,
            extension: extension_from_url(url),
        }
    }
}

/// HP only counts when the text is purely ASCII digits and fits an i64.
pub fn coerce_hp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
