//! Measured, possibly truncated text labels

use crate::config::LayoutConfig;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// A label with its measured size
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Text actually drawn, truncated to the configured maximum
    pub content: String,
    /// Untruncated text, for tooltips
    pub full: String,
    pub width: f64,
    pub height: f64,
}

impl Text {
    pub fn new(full: impl Into<String>, config: &LayoutConfig) -> Self {
        let full = full.into();
        let content = truncate(&full, config.max_text_chars);
        Text {
            width: measure(&content, config),
            height: config.line_height,
            content,
            full,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.content != self.full
    }
}

/// Pixel width of a single line of text
pub fn measure(text: &str, config: &LayoutConfig) -> f64 {
    UnicodeWidthStr::width(text) as f64 * config.char_width
}

/// Cut `text` to at most `max_cols` display columns, ending with an ellipsis
pub fn truncate(text: &str, max_cols: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_cols {
        return text.to_string();
    }
    let budget = max_cols.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_uses_char_width() {
        let config = LayoutConfig::default();
        assert_eq!(measure("abc", &config), 3.0 * config.char_width);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(UnicodeWidthStr::width(truncate("hello world", 6).as_str()), 6);
    }

    #[test]
    fn test_text_keeps_full() {
        let config = LayoutConfig {
            max_text_chars: 4,
            ..LayoutConfig::default()
        };
        let text = Text::new("abcdefgh", &config);
        assert!(text.is_truncated());
        assert_eq!(text.full, "abcdefgh");
        assert_eq!(text.width, 4.0 * config.char_width);
    }
}
