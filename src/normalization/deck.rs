use std::fmt;

use itertools::Itertools;

/// Separator between card entries inside a signature.
pub const SIGNATURE_SEPARATOR: &str = ", ";

/// Canonical identity of "what a player played": `<name> x<count>` entries
/// sorted by card name and joined. Two identical card multisets always give
/// the same signature whatever order the decklist rows came in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeckSignature(String);

impl DeckSignature {
    pub fn from_cards<I, S>(cards: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let signature = cards
            .into_iter()
            .map(|(name, count)| (name.as_ref().to_string(), count))
            // count breaks ties between same-named rows so the output stays total
            .sorted()
            .map(|(name, count)| format!("{name} x{count}"))
            .join(SIGNATURE_SEPARATOR);
        Self(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DeckSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_order_does_not_matter() {
        let a = DeckSignature::from_cards([("Pikachu", 2), ("Charmander", 1)]);
        let b = DeckSignature::from_cards([("Charmander", 1), ("Pikachu", 2)]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Charmander x1, Pikachu x2");
    }

    #[test]
    fn every_permutation_agrees() {
        let cards = [("Mew", 1), ("Pikachu ex", 2), ("Zapdos", 2), ("Poké Ball", 2)];
        let expected = DeckSignature::from_cards(cards);
        for perm in cards.iter().copied().permutations(cards.len()) {
            assert_eq!(DeckSignature::from_cards(perm), expected);
        }
    }

    #[test]
    fn counts_distinguish_decks() {
        let a = DeckSignature::from_cards([("Pikachu", 2)]);
        let b = DeckSignature::from_cards([("Pikachu", 1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_decklist_gives_empty_signature() {
        let sig = DeckSignature::from_cards(Vec::<(String, i64)>::new());
        assert_eq!(sig.to_string(), "");
    }
}
