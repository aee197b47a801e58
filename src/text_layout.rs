use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone)]
pub struct WrappedText {
    pub rendered: String,
    /// Caret position `(line, column)` before each char, plus one past the end.
    pub positions: Vec<(u16, u16)>,
    pub line_count: u16,
}

impl WrappedText {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.rendered.split('\n')
    }
}

/// Word-wraps `text` to `width` display columns. Words wider than a line are
/// broken; wide glyphs never straddle the edge.
pub fn wrap_word_with_positions(text: &str, width: u16) -> WrappedText {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut rendered = String::with_capacity(text.len());
    let mut positions = Vec::with_capacity(chars.len() + 1);
    let mut line = 0u16;
    let mut col = 0u16;

    positions.push((line, col));

    for (idx, ch) in chars.iter().copied().enumerate() {
        if ch == '\n' {
            rendered.push('\n');
            line = line.saturating_add(1);
            col = 0;
            positions.push((line, col));
            continue;
        }

        let ch_width = char_width(ch);
        if should_wrap_before_word(&chars, idx, col, width)
            || (col > 0 && col.saturating_add(ch_width) > width)
        {
            rendered.push('\n');
            line = line.saturating_add(1);
            col = 0;
        }

        rendered.push(ch);
        col = col.saturating_add(ch_width);
        if col >= width {
            rendered.push('\n');
            line = line.saturating_add(1);
            col = 0;
        }

        positions.push((line, col));
    }

    let line_count = positions
        .iter()
        .map(|(l, _)| *l)
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    WrappedText {
        rendered,
        positions,
        line_count,
    }
}

/// Wrapped lines of `text`, for read-only panes.
pub fn wrap_lines(text: &str, width: u16) -> Vec<String> {
    let wrapped = wrap_word_with_positions(text, width);
    let mut lines: Vec<String> = wrapped.lines().map(str::to_string).collect();
    // A char that exactly fills the last line leaves a trailing break.
    if lines.len() > 1 && lines.last().is_some_and(String::is_empty) && !text.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Truncates to `width` display columns, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn char_width(ch: char) -> u16 {
    ch.width().unwrap_or(0) as u16
}

fn should_wrap_before_word(chars: &[char], idx: usize, col: u16, width: u16) -> bool {
    if col == 0 {
        return false;
    }
    let ch = chars[idx];
    if ch.is_whitespace() {
        return false;
    }
    if idx > 0 {
        let prev = chars[idx - 1];
        if !prev.is_whitespace() && prev != '\n' {
            return false;
        }
    }

    let word_width: u16 = chars[idx..]
        .iter()
        .take_while(|c| !c.is_whitespace() && **c != '\n')
        .map(|c| char_width(*c))
        .sum();

    word_width <= width && col.saturating_add(word_width) > width
}
