//! Fixed text metrics. Widths come from a per-character table rather than
//! installed fonts, so the same document measures the same everywhere.

pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.30,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' => 0.26,
        '(' | ')' | '[' | ']' | '{' | '}' | 'f' | 't' | 'r' => 0.36,
        '-' | '_' | '/' | '\\' => 0.40,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '@' | '#' | '%' | '&' => 0.92,
        '0'..='9' => 0.60,
        'A'..='Z' => 0.67,
        'a'..='z' => 0.56,
        _ if ch.is_ascii() => 0.56,
        // CJK and other wide glyphs
        _ => 1.0,
    }
}

pub(crate) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Shorten `text` with an ellipsis so it fits in `max_width`.
pub(crate) fn truncate_to_width(text: &str, max_width: f32, font_size: f32) -> String {
    if text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let budget = max_width - text_width(ellipsis, font_size);
    let mut out = String::new();
    let mut used = 0.0f32;
    for ch in text.chars() {
        let w = char_width_factor(ch) * font_size;
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}
