// src/formatting/rich_text/styles.rs
//! Application of run styles as Markdown markers.

use crate::types::TextStyle;

/// Renderer for text styles to Markdown.
pub struct MarkdownStyleRenderer;

impl MarkdownStyleRenderer {
    /// Applies styles to text content for Markdown output.
    ///
    /// Wrapping goes innermost to outermost: inline code, bold, italic,
    /// strikethrough, underline, then the link. Inline code suppresses the
    /// four emphasis styles. Leading and trailing whitespace stays outside
    /// every marker, since CommonMark won't close `** x **`. Outside code
    /// spans, characters Markdown would read as inline syntax are escaped.
    pub fn apply_styles(content: &str, style: &TextStyle) -> String {
        if content.is_empty() {
            return String::new();
        }
        if style.is_plain() {
            return escape_inline(content);
        }

        let core = content.trim();
        if core.is_empty() {
            return content.to_string();
        }
        let leading = &content[..content.len() - content.trim_start().len()];
        let trailing = &content[content.trim_end().len()..];

        let mut result = if style.inline_code {
            Self::inline_code(core)
        } else {
            let mut wrapped = escape_inline(core);
            if style.bold {
                wrapped = format!("**{}**", wrapped);
            }
            if style.italic {
                wrapped = format!("*{}*", wrapped);
            }
            if style.strikethrough {
                wrapped = format!("~~{}~~", wrapped);
            }
            if style.underline {
                wrapped = format!("<u>{}</u>", wrapped);
            }
            wrapped
        };

        if let Some(url) = &style.link {
            result = format!("[{}]({})", result, url.as_str());
        }

        format!("{}{}{}", leading, result, trailing)
    }

    /// Wraps `content` in a code span one backtick longer than its longest
    /// backtick run.
    fn inline_code(content: &str) -> String {
        let longest_run = content
            .split(|c| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest_run + 1);
        if longest_run > 0 {
            format!("{} {} {}", fence, content, fence)
        } else {
            format!("{}{}{}", fence, content, fence)
        }
    }
}

/// Backslash-escapes the characters that open inline syntax.
pub fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '<' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
