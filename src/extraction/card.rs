use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use super::{joined_text, select_text, selector, ExtractError};

const TITLE_BLOCK: &str = "p.card-text-title";
const STAGE_BLOCK: &str = "p.card-text-type";
const WRR_BLOCK: &str = "p.card-text-wrr";

const WEAKNESS_LABEL: &str = "Weakness:";
const RETREAT_LABEL: &str = "Retreat:";

/// "- Lightning - 60 HP" inside the title block.
static TYPE_HP_RE: OnceLock<Regex> = OnceLock::new();

fn type_hp_re() -> &'static Regex {
    TYPE_HP_RE
        .get_or_init(|| Regex::new(r"-\s*(\w+)\s*-\s*(\d+)\s*HP").unwrap_or_else(|_| unreachable!()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Basic,
    Stage1,
    Stage2,
}

impl Stage {
    /// Probe order matters: the first label found in the stage text wins.
    const PROBES: [(&'static str, Stage); 3] = [
        ("Basic", Stage::Basic),
        ("Stage 1", Stage::Stage1),
        ("Stage 2", Stage::Stage2),
    ];

    pub fn detect(text: &str) -> Option<Stage> {
        Self::PROBES
            .iter()
            .find(|(label, _)| text.contains(label))
            .map(|(_, stage)| *stage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Basic => "Basic",
            Stage::Stage1 => "Stage 1",
            Stage::Stage2 => "Stage 2",
        }
    }
}

/// Raw attributes read off one card page. `hp` is kept as the matched text;
/// numeric coercion belongs to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardAttributes {
    pub name: Option<String>,
    pub element_type: Option<String>,
    pub hp: Option<String>,
    pub stage: Option<Stage>,
    pub evolves_from: Option<String>,
    pub weakness: Option<String>,
    pub retreat: Option<String>,
}

/// Parse a card page. Only the title block is mandatory.
pub fn extract_card(html: &str) -> Result<CardAttributes, ExtractError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = root
        .select(&selector(TITLE_BLOCK))
        .next()
        .ok_or(ExtractError::BlockAbsent { block: TITLE_BLOCK })?;

    let mut attrs = CardAttributes {
        name: select_text(&title, &selector("a")),
        ..CardAttributes::default()
    };

    let title_text = joined_text(&title, " ");
    if let Some(caps) = type_hp_re().captures(&title_text) {
        attrs.element_type = caps.get(1).map(|m| m.as_str().to_string());
        attrs.hp = caps.get(2).map(|m| m.as_str().to_string());
    }

    if let Some(stage_block) = root.select(&selector(STAGE_BLOCK)).next() {
        attrs.stage = Stage::detect(&joined_text(&stage_block, " "));
        attrs.evolves_from = select_text(&stage_block, &selector("a"));
    }

    if let Some(wrr_block) = root.select(&selector(WRR_BLOCK)).next() {
        let (weakness, retreat) = weakness_and_retreat(&joined_text(&wrr_block, "\n"));
        attrs.weakness = weakness;
        attrs.retreat = retreat;
    }

    Ok(attrs)
}

/// Line-by-line scan of the weakness/retreat block. A line carrying the
/// weakness label is never read as a retreat line.
fn weakness_and_retreat(text: &str) -> (Option<String>, Option<String>) {
    let mut weakness = None;
    let mut retreat = None;
    for line in text.lines() {
        if let Some((_, value)) = line.split_once(WEAKNESS_LABEL) {
            weakness = non_empty(value);
        } else if let Some((_, value)) = line.split_once(RETREAT_LABEL) {
            retreat = non_empty(value);
        }
    }
    (weakness, retreat)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: &str = r#"
        <html><body><div class="card-text">
          <p class="card-text-title">
            <a href="/cards/A1/94">Pikachu</a> - Lightning - 60 HP
          </p>
          <p class="card-text-type">Pokémon - Basic</p>
          <p class="card-text-wrr">
            Weakness: Fighting<br>
            Retreat: 1
          </p>
        </div></body></html>
    "#;

    #[test]
    fn parses_full_card_page() {
        let card = extract_card(PIKACHU).unwrap();
        assert_eq!(card.name.as_deref(), Some("Pikachu"));
        assert_eq!(card.element_type.as_deref(), Some("Lightning"));
        assert_eq!(card.hp.as_deref(), Some("60"));
        assert_eq!(card.stage, Some(Stage::Basic));
        assert_eq!(card.evolves_from, None);
        assert_eq!(card.weakness.as_deref(), Some("Fighting"));
        assert_eq!(card.retreat.as_deref(), Some("1"));
    }

    #[test]
    fn reads_evolution_link_from_stage_block() {
        let html = r#"
            <p class="card-text-title"><a>Raichu</a> - Lightning - 100 HP</p>
            <p class="card-text-type">Pokémon - Stage 1 - Evolves from <a href="/x">Pikachu</a></p>
        "#;
        let card = extract_card(html).unwrap();
        assert_eq!(card.stage, Some(Stage::Stage1));
        assert_eq!(card.evolves_from.as_deref(), Some("Pikachu"));
        assert_eq!(card.weakness, None);
        assert_eq!(card.retreat, None);
    }

    #[test]
    fn missing_title_block_is_typed() {
        let html = r#"<p class="card-text-type">Pokémon - Basic</p>"#;
        assert_eq!(
            extract_card(html),
            Err(ExtractError::BlockAbsent { block: TITLE_BLOCK })
        );
    }

    #[test]
    fn title_without_hp_pattern_keeps_name() {
        let html = r#"<p class="card-text-title"><a>Mystery</a> - ??? HP</p>"#;
        let card = extract_card(html).unwrap();
        assert_eq!(card.name.as_deref(), Some("Mystery"));
        assert_eq!(card.element_type, None);
        assert_eq!(card.hp, None);
        assert_eq!(card.stage, None);
    }

    #[test]
    fn stage_detection_takes_first_probe() {
        assert_eq!(Stage::detect("Pokémon - Stage 2"), Some(Stage::Stage2));
        assert_eq!(Stage::detect("Trainer - Item"), None);
        assert_eq!(Stage::Stage1.as_str(), "Stage 1");
    }
}
