use crate::feed::Item;

/// Drops items whose categories or titles mention a configured keyword
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    /// Matched exactly against category tags
    keywords: Vec<String>,
    /// Lower-cased copies, matched as substrings of the lower-cased title
    lowered: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k| !k.trim().is_empty())
            .collect();
        let lowered = keywords.iter().map(|k| k.to_lowercase()).collect();

        Self { keywords, lowered }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Whether the item must not be stored.
    ///
    /// Categories match case-sensitively and exactly; titles match
    /// case-insensitively as substrings. One hit on either is enough.
    pub fn should_skip(&self, item: &Item) -> bool {
        if self.is_empty() {
            return false;
        }

        if self.keywords.iter().any(|k| item.categories.contains(k)) {
            return true;
        }

        let title = item.title.to_lowercase();
        self.lowered.iter().any(|k| title.contains(k.as_str()))
    }
}
