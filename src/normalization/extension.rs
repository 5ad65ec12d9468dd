use url::Url;

/// Release order of the card sets, oldest first. The ordinal of a tag is its
/// 1-based position; new sets are appended at the end.
pub const BUILTIN_EXTENSIONS: [&str; 7] = ["P-A", "A1", "A1a", "A2", "A2a", "A2b", "A3"];

const CARDS_SEGMENT: &str = "cards";

/// Extension tag of a card URL: the path segment right after `/cards/`, as long
/// as another segment follows it (`.../cards/A1/94` -> `A1`). Relative URLs are
/// accepted.
pub fn extension_from_url(card_url: &str) -> Option<String> {
    let base = Url::parse("https://cards.invalid/").ok()?;
    let parsed = Url::options().base_url(Some(&base)).parse(card_url.trim()).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();

    segments
        .windows(3)
        .find(|w| w[0] == CARDS_SEGMENT && !w[1].is_empty())
        .map(|w| w[1].to_string())
}

/// Closed enumeration mapping extension tags to their release ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    ranked: Vec<String>,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            ranked: BUILTIN_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtensionTable {
    /// Builtin table followed by `extra` in order; tags already ranked are ignored.
    pub fn with_additional<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for tag in extra {
            let tag = tag.as_ref().trim();
            if !tag.is_empty() && table.ordinal(tag).is_none() {
                table.ranked.push(tag.to_string());
            }
        }
        table
    }

    pub fn ordinal(&self, tag: &str) -> Option<u32> {
        self.ranked
            .iter()
            .position(|t| t == tag)
            .map(|idx| idx as u32 + 1)
    }

    /// The most advanced recognized tag among `tags`, with its ordinal.
    /// Unknown tags do not take part.
    pub fn highest<'a, I>(&self, tags: I) -> Option<(u32, &'a str)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tags.into_iter()
            .filter_map(|tag| self.ordinal(tag).map(|ord| (ord, tag)))
            .max_by_key(|(ord, _)| *ord)
    }
}
