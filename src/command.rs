use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSuggestion {
    pub token: String,
    #[serde(default, rename = "name", alias = "display_name")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

impl CommandSuggestion {
    pub fn new(
        token: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            display_name: display_name.into(),
            description: description.into(),
        }
    }

    pub fn slash_token(&self) -> String {
        format!("/{}", self.token)
    }
}

/// The slash query currently under the caret. Offsets are byte indices into
/// the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashQuery {
    pub slash: usize,
    pub end: usize,
    pub query: String,
    /// False when the query was found through a leading slash while the
    /// caret sits elsewhere in the buffer.
    pub at_caret: bool,
}

/// Buffer contents after a suggestion was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub buffer: String,
    pub caret: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    catalog: Vec<CommandSuggestion>,
    active: Option<SlashQuery>,
    dismissed_at: Option<usize>,
    highlighted: usize,
}

impl CommandParser {
    pub fn new(catalog: Vec<CommandSuggestion>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn active_query(&self) -> Option<&SlashQuery> {
        self.active.as_ref()
    }

    /// Re-inspects the buffer after a keystroke. `caret` is a byte offset.
    pub fn evaluate(&mut self, buffer: &str, caret: usize) {
        let next = find_slash_query(buffer, caret);
        let query_changed = match (&self.active, &next) {
            (Some(prev), Some(next)) => prev.query != next.query || prev.slash != next.slash,
            (None, None) => false,
            _ => true,
        };
        if next.as_ref().map(|q| q.slash) != self.dismissed_at {
            self.dismissed_at = None;
        }
        self.active = next;
        if query_changed {
            self.highlighted = 0;
        }
        self.highlighted = self
            .highlighted
            .min(self.suggestions().len().saturating_sub(1));
    }

    /// Catalog entries matching the active query, in catalog order.
    pub fn suggestions(&self) -> Vec<&CommandSuggestion> {
        let Some(active) = &self.active else {
            return Vec::new();
        };
        let query = active.query.to_ascii_lowercase();
        self.catalog
            .iter()
            .filter(|entry| entry.token.to_ascii_lowercase().starts_with(&query))
            .collect()
    }

    pub fn is_visible(&self) -> bool {
        match &self.active {
            Some(active) => {
                self.dismissed_at != Some(active.slash) && !self.suggestions().is_empty()
            }
            None => false,
        }
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted_suggestion(&self) -> Option<&CommandSuggestion> {
        if !self.is_visible() {
            return None;
        }
        self.suggestions().get(self.highlighted).copied()
    }

    /// Whether Enter should accept the highlighted workflow instead of
    /// sending: the caret is in the slash word and it is not already complete.
    pub fn accepts_enter(&self) -> bool {
        let (Some(active), Some(entry)) = (&self.active, self.highlighted_suggestion()) else {
            return false;
        };
        active.at_caret && !entry.token.eq_ignore_ascii_case(&active.query)
    }

    pub fn move_highlight_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    pub fn move_highlight_down(&mut self) {
        let last = self.suggestions().len().saturating_sub(1);
        self.highlighted = (self.highlighted + 1).min(last);
    }

    /// Hides the panel for the current slash. Typing a new slash shows it
    /// again.
    pub fn dismiss(&mut self) {
        if let Some(active) = &self.active {
            debug!(slash = active.slash, "command panel dismissed");
            self.dismissed_at = Some(active.slash);
        }
    }

    /// Replaces the active slash query with `/<token> `, keeping the text
    /// before the slash and after the query. Closes the panel.
    pub fn select(&mut self, buffer: &str, token: &str) -> Option<Selection> {
        let active = self.active.take()?;
        let token = token.trim_start_matches('/');
        let before = &buffer[..active.slash];
        let after = buffer[active.end..].strip_prefix(' ').unwrap_or(&buffer[active.end..]);
        let inserted = format!("/{token} ");
        let caret = before.len() + inserted.len();
        let mut next = String::with_capacity(caret + after.len());
        next.push_str(before);
        next.push_str(&inserted);
        next.push_str(after);
        self.dismissed_at = None;
        self.highlighted = 0;
        Some(Selection {
            buffer: next,
            caret,
        })
    }

    pub fn select_highlighted(&mut self, buffer: &str) -> Option<Selection> {
        let token = self.highlighted_suggestion()?.token.clone();
        self.select(buffer, &token)
    }
}

/// Locates the slash query the caret is in.
///
/// The word under the caret wins when it starts with `/`; the query is the
/// part before the caret and the replaced span runs to the end of the word.
/// A `/` right before the caret opens an empty query even mid-word.
/// Otherwise a buffer whose trimmed text starts with `/` exposes its first
/// word.
pub fn find_slash_query(buffer: &str, caret: usize) -> Option<SlashQuery> {
    let caret = floor_char_boundary(buffer, caret.min(buffer.len()));
    let head = &buffer[..caret];
    let word_start = head
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    if let Some(query) = head[word_start..].strip_prefix('/')
        && !query.contains('/')
    {
        let word_end = buffer[caret..]
            .find(char::is_whitespace)
            .map_or(buffer.len(), |offset| caret + offset);
        return Some(SlashQuery {
            slash: word_start,
            end: word_end,
            query: query.to_string(),
            at_caret: true,
        });
    }
    if head.ends_with('/') {
        return Some(SlashQuery {
            slash: caret - 1,
            end: caret,
            query: String::new(),
            at_caret: true,
        });
    }

    let slash = buffer.len() - buffer.trim_start().len();
    let rest = buffer[slash..].strip_prefix('/')?;
    let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(SlashQuery {
        slash,
        end: slash + 1 + word_len,
        query: rest[..word_len].to_string(),
        at_caret: false,
    })
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
#[path = "../tests/unit/command_tests.rs"]
mod tests;
