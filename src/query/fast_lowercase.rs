//! Case-insensitive substring matching for search queries.
//! ASCII input takes a byte-wise path; anything else falls back to full Unicode lowercasing.

use std::borrow::Cow;

/// Lowercase `text`, borrowing when it is already lowercase ASCII.
#[inline]
pub fn fold_case(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        if text.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(text.to_ascii_lowercase())
        } else {
            Cow::Borrowed(text)
        }
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

/// A query lowered once and matched against many haystacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Needle {
    folded: String,
}

impl Needle {
    pub fn new(query: &str) -> Self {
        Self {
            folded: fold_case(query).into_owned(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Whether `haystack`, lowercased, contains this needle.
    #[inline]
    pub fn matches(&self, haystack: &str) -> bool {
        if self.folded.is_empty() {
            return true;
        }

        if haystack.is_ascii() && self.folded.is_ascii() {
            let hay = haystack.as_bytes();
            let pat = self.folded.as_bytes();

            if hay.len() < pat.len() {
                return false;
            }

            // the needle is already lowercase, so only the haystack side needs folding
            hay.windows(pat.len()).any(|window| {
                window
                    .iter()
                    .zip(pat)
                    .all(|(a, b)| a.to_ascii_lowercase() == *b)
            })
        } else {
            haystack.to_lowercase().contains(self.folded.as_str())
        }
    }
}
