// src/formatting/rich_text/mod.rs
//! Formatting of styled runs into inline Markdown.

mod styles;

pub use styles::{escape_inline, MarkdownStyleRenderer};

use crate::types::{StyledText, TextElement, TextStyle};

/// Formats a run sequence into inline Markdown.
pub fn styled_text_to_markdown(text: &StyledText) -> String {
    let mut output = String::new();
    for element in &text.elements {
        output.push_str(&render_element(element));
    }
    output
}

/// Formats the text of a paragraph-like block, escaping any line start
/// Markdown would read as a block marker.
pub fn paragraph_to_markdown(text: &StyledText) -> String {
    styled_text_to_markdown(text)
        .split('\n')
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes a heading, list, quote or rule marker at the start of `line`.
fn escape_line_start(line: &str) -> String {
    let body = line.trim_start_matches(' ');
    let indent = line.len() - body.len();
    if indent > 3 {
        return line.to_string();
    }
    format!("{}{}", &line[..indent], escape_marker(body))
}

fn escape_marker(line: &str) -> String {
    let Some(first) = line.chars().next() else {
        return String::new();
    };
    let ends_marker = |rest: &str| rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t');

    match first {
        '#' if ends_marker(line.trim_start_matches('#')) => format!("\\{}", line),
        '>' => format!("\\{}", line),
        '-' | '+' | '*' | '=' => {
            let is_rule = line.chars().filter(|c| *c == first).count() >= 3
                && line.chars().all(|c| c == first || c == ' ');
            if ends_marker(&line[1..]) || is_rule {
                format!("\\{}", line)
            } else {
                line.to_string()
            }
        }
        '0'..='9' => {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            let rest = &line[digits..];
            let ordered = digits <= 9
                && (rest.starts_with('.') || rest.starts_with(')'))
                && ends_marker(&rest[1..]);
            if ordered {
                format!("{}\\{}", &line[..digits], rest)
            } else {
                line.to_string()
            }
        }
        _ => line.to_string(),
    }
}

/// Renders a single span to Markdown.
fn render_element(element: &TextElement) -> String {
    match element {
        TextElement::Text { content, style } => MarkdownStyleRenderer::apply_styles(content, style),
        // Equations ignore styling
        TextElement::Equation { expression, .. } => format!("${}$", expression.trim()),
        TextElement::MentionUser { user_id, style } => {
            MarkdownStyleRenderer::apply_styles(&format!("@{}", user_id), &without_link(style))
        }
        TextElement::MentionDocument {
            title, url, token, ..
        } => {
            let title = if title.is_empty() { token } else { title };
            match url {
                Some(url) => format!("[{}]({})", escape_inline(title), url),
                None => escape_inline(title),
            }
        }
    }
}

fn without_link(style: &TextStyle) -> TextStyle {
    TextStyle {
        link: None,
        ..style.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidatedUrl;

    #[test]
    fn test_plain_text_formatting() {
        assert_eq!(styled_text_to_markdown(&StyledText::plain("Hello World")), "Hello World");
    }

    #[test]
    fn test_bold_link_formatting() {
        let bold = TextStyle {
            bold: true,
            ..Default::default()
        };
        let bold_link = TextStyle {
            link: Some(ValidatedUrl::parse("https://example.com/docs").unwrap()),
            ..bold.clone()
        };
        let text = StyledText::from_elements(vec![
            TextElement::styled("see ", bold),
            TextElement::styled("docs", bold_link),
        ]);
        assert_eq!(
            styled_text_to_markdown(&text),
            "**see** [**docs**](https://example.com/docs)"
        );
    }

    #[test]
    fn test_mentions_and_equations() {
        let text = StyledText::from_elements(vec![
            TextElement::MentionUser {
                user_id: "ou_123".into(),
                style: TextStyle::default(),
            },
            TextElement::plain(" wrote "),
            TextElement::equation("E = mc^2"),
        ]);
        assert_eq!(styled_text_to_markdown(&text), "@ou\\_123 wrote $E = mc^2$");
    }

    #[test]
    fn test_block_markers_are_escaped_at_line_start() {
        let cases = [
            ("- not a list", "\\- not a list"),
            ("1. Revenue grew", "1\\. Revenue grew"),
            ("2) second", "2\\) second"),
            ("# not heading", "\\# not heading"),
            ("####### seven", "\\####### seven"),
            ("> not quote", "\\> not quote"),
            ("---", "\\---"),
            ("-dash and #tag", "-dash and #tag"),
            ("2024. was a year", "2024\\. was a year"),
            ("3.14 is pi", "3.14 is pi"),
        ];
        for (input, expected) in cases {
            assert_eq!(paragraph_to_markdown(&StyledText::plain(input)), expected, "{}", input);
        }
    }
}
