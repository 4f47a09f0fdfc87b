// src/types/rich_text.rs
//! Styled runs: the inline content of every text-bearing block.

use super::{BackgroundColor, TextColor, ValidatedUrl};
use serde::{Deserialize, Serialize};

/// Style bundle carried by a span.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub inline_code: bool,
    pub link: Option<ValidatedUrl>,
    pub text_color: TextColor,
    pub background_color: BackgroundColor,
}

impl TextStyle {
    pub fn is_plain(&self) -> bool {
        *self == TextStyle::default()
    }
}

/// One typed span of a run sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextElement {
    Text {
        content: String,
        style: TextStyle,
    },
    MentionUser {
        user_id: String,
        style: TextStyle,
    },
    MentionDocument {
        token: String,
        title: String,
        url: Option<String>,
        style: TextStyle,
    },
    Equation {
        expression: String,
        style: TextStyle,
    },
}

impl TextElement {
    pub fn plain(content: impl Into<String>) -> Self {
        TextElement::Text {
            content: content.into(),
            style: TextStyle::default(),
        }
    }

    pub fn styled(content: impl Into<String>, style: TextStyle) -> Self {
        TextElement::Text {
            content: content.into(),
            style,
        }
    }

    pub fn equation(expression: impl Into<String>) -> Self {
        TextElement::Equation {
            expression: expression.into(),
            style: TextStyle::default(),
        }
    }

    pub fn style(&self) -> &TextStyle {
        match self {
            TextElement::Text { style, .. }
            | TextElement::MentionUser { style, .. }
            | TextElement::MentionDocument { style, .. }
            | TextElement::Equation { style, .. } => style,
        }
    }

    /// The text a reader would see, without any markup.
    pub fn plain_text(&self) -> &str {
        match self {
            TextElement::Text { content, .. } => content,
            TextElement::MentionUser { user_id, .. } => user_id,
            TextElement::MentionDocument { title, .. } => title,
            TextElement::Equation { expression, .. } => expression,
        }
    }
}

/// Ordered run sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyledText {
    pub elements: Vec<TextElement>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            elements: vec![TextElement::plain(content)],
        }
    }

    pub fn from_elements(elements: Vec<TextElement>) -> Self {
        let mut text = Self::new();
        for element in elements {
            text.push(element);
        }
        text
    }

    /// Appends a span, merging it into the previous one when both are plain
    /// text with the same style.
    pub fn push(&mut self, element: TextElement) {
        if let TextElement::Text { content, style } = &element {
            if content.is_empty() {
                return;
            }
            if let Some(TextElement::Text {
                content: last_content,
                style: last_style,
            }) = self.elements.last_mut()
            {
                if last_style == style {
                    last_content.push_str(content);
                    return;
                }
            }
        }
        self.elements.push(element);
    }

    pub fn to_plain_text(&self) -> String {
        self.elements.iter().map(TextElement::plain_text).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.elements.iter().all(|e| match e {
            TextElement::Text { content, .. } => content.trim().is_empty(),
            _ => false,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drops the first `count` characters of visible text, across spans.
    pub fn strip_prefix_chars(&mut self, mut count: usize) {
        let mut kept = Vec::with_capacity(self.elements.len());
        for element in self.elements.drain(..) {
            if count == 0 {
                kept.push(element);
                continue;
            }
            match element {
                TextElement::Text { content, style } => {
                    let len = content.chars().count();
                    if len <= count {
                        count -= len;
                    } else {
                        let rest: String = content.chars().skip(count).collect();
                        count = 0;
                        kept.push(TextElement::Text {
                            content: rest,
                            style,
                        });
                    }
                }
                other => {
                    count = 0;
                    kept.push(other);
                }
            }
        }
        self.elements = kept;
    }

    /// Trims leading whitespace of the first span and trailing whitespace of
    /// the last one.
    pub fn trim(&mut self) {
        if let Some(TextElement::Text { content, .. }) = self.elements.first_mut() {
            *content = content.trim_start().to_string();
        }
        if let Some(TextElement::Text { content, .. }) = self.elements.last_mut() {
            *content = content.trim_end().to_string();
        }
        self.elements
            .retain(|e| !matches!(e, TextElement::Text { content, .. } if content.is_empty()));
    }
}

impl From<&str> for StyledText {
    fn from(value: &str) -> Self {
        StyledText::plain(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> TextStyle {
        TextStyle {
            bold: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_push_merges_same_style() {
        let mut text = StyledText::new();
        text.push(TextElement::plain("Hello "));
        text.push(TextElement::plain("World"));
        text.push(TextElement::styled("!", bold()));
        assert_eq!(text.elements.len(), 2);
        assert_eq!(text.to_plain_text(), "Hello World!");
    }

    #[test]
    fn test_strip_prefix_across_spans() {
        let mut text = StyledText::from_elements(vec![
            TextElement::plain("[!"),
            TextElement::plain("NOTE] body"),
            TextElement::styled(" bold", bold()),
        ]);
        text.strip_prefix_chars(8);
        assert_eq!(text.to_plain_text(), "body bold");
    }
}
