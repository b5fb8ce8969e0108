use serde::Serialize;

/// Number of characters kept in [`OccupationEntry::display_text`].
pub const DISPLAY_CHAR_LIMIT: usize = 150;

const ELLIPSIS: &str = "...";

/// One occupation of the taxonomy.
///
/// `id` is the ordinal position in the store and doubles as the tie-break key when two
/// occupations score the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupationEntry {
    pub id: usize,
    pub full_text: String,
    pub display_text: String,
}

impl OccupationEntry {
    pub fn new(id: usize, full_text: impl Into<String>) -> Self {
        let full_text = full_text.into();
        let display_text = display_text(&full_text);
        Self {
            id,
            full_text,
            display_text,
        }
    }
}

/// First [`DISPLAY_CHAR_LIMIT`] characters plus `"..."`, or the text itself when it is short
/// enough. Counts `char`s, so multi-byte text is never split mid-codepoint.
pub fn display_text(full_text: &str) -> String {
    match full_text.char_indices().nth(DISPLAY_CHAR_LIMIT) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len());
            out.push_str(&full_text[..cut]);
            out.push_str(ELLIPSIS);
            out
        }
        None => full_text.to_string(),
    }
}
