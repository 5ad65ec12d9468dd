//! Canonical records derived from raw extraction and corpus rows.

pub mod card;
pub mod deck;
pub mod extension;
pub mod matches;

pub use card::CardRecord;
pub use deck::DeckSignature;
pub use extension::{extension_from_url, ExtensionTable};
pub use matches::{resolve_winner, MatchRecord, MatchSide, ParticipantOutcome};
