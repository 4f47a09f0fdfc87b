// src/parsing/segments.rs
//! Splits a Markdown file into ordered segments before parsing.
//!
//! Fenced diagrams and top-level `$$` equations have no block that can carry
//! them, so they are lifted out here and take their own creation path. The
//! scan tracks ordinary code fences so fence-like text inside an example
//! code block stays Markdown.

use crate::model::DiagramSyntax;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Markdown,
    Diagram(DiagramSyntax),
    Equation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Markdown text, diagram source without its fence, or the bare
    /// equation expression.
    pub content: String,
}

impl Segment {
    fn new(kind: SegmentKind, content: String) -> Self {
        Self { kind, content }
    }
}

/// An open code fence: marker character and run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Reads a fence opener, returning it with the info string.
    fn open(line: &str) -> Option<(Fence, &str)> {
        let trimmed = strip_indent(line)?;
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        // A backtick fence's info string may not contain backticks
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some((Fence { marker, len }, info))
    }

    fn closes(&self, line: &str) -> bool {
        let Some(trimmed) = strip_indent(line) else {
            return false;
        };
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && trimmed[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Strips up to three spaces of indentation; `None` when the line is
/// indented further and so cannot open or close a fence.
fn strip_indent(line: &str) -> Option<&str> {
    let spaces = line.chars().take_while(|c| *c == ' ').count();
    if spaces > 3 {
        None
    } else {
        Some(&line[spaces..])
    }
}

/// Splits `markdown` into ordered segments.
///
/// An unclosed diagram fence or equation span is kept as Markdown. Segments
/// of blank Markdown are dropped.
pub fn split_segments(markdown: &str) -> Vec<Segment> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut segments = Vec::new();
    let mut pending = String::new();
    let mut code_fence: Option<Fence> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(fence) = code_fence {
            if fence.closes(line) {
                code_fence = None;
            }
            push_line(&mut pending, line);
            i += 1;
            continue;
        }

        if let Some((fence, info)) = Fence::open(line) {
            if let Some(syntax) = DiagramSyntax::from_info_string(info) {
                if let Some(end) = (i + 1..lines.len()).find(|&j| fence.closes(lines[j])) {
                    flush_markdown(&mut segments, &mut pending);
                    let source = lines[i + 1..end].join("\n");
                    segments.push(Segment::new(SegmentKind::Diagram(syntax), source));
                    i = end + 1;
                    continue;
                }
                log::debug!("Unclosed {} fence at line {}, keeping it as text", syntax, i + 1);
            }
            code_fence = Some(fence);
            push_line(&mut pending, line);
            i += 1;
            continue;
        }

        if let Some((expression, end)) = equation_span(&lines, i) {
            flush_markdown(&mut segments, &mut pending);
            segments.push(Segment::new(SegmentKind::Equation, expression));
            i = end + 1;
            continue;
        }

        push_line(&mut pending, line);
        i += 1;
    }

    flush_markdown(&mut segments, &mut pending);
    segments
}

/// Reads a `$$` span opening at line `start`, which must not be indented.
/// Returns the expression and the index of the closing line.
fn equation_span(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let opener = lines[start].trim_end();
    let rest = opener.strip_prefix("$$")?;

    // Single line: `$$ x^2 $$`
    if let Some(inner) = rest.trim_end().strip_suffix("$$") {
        if !inner.trim().is_empty() {
            return Some((inner.trim().to_string(), start));
        }
    }

    // Inline math at the start of a paragraph, e.g. `$$x$$ is small`
    if rest.contains("$$") {
        return None;
    }

    let mut body = Vec::new();
    if !rest.trim().is_empty() {
        body.push(rest.trim());
    }
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        let trimmed = line.trim();
        if let Some(last) = trimmed.strip_suffix("$$") {
            if !last.trim().is_empty() {
                body.push(last.trim());
            }
            let expression = body.join("\n");
            if expression.is_empty() {
                return None;
            }
            return Some((expression, start + 1 + offset));
        }
        body.push(line.trim_end());
    }
    None
}

fn push_line(buffer: &mut String, line: &str) {
    buffer.push_str(line);
    buffer.push('\n');
}

fn flush_markdown(segments: &mut Vec<Segment>, pending: &mut String) {
    if !pending.trim().is_empty() {
        segments.push(Segment::new(SegmentKind::Markdown, std::mem::take(pending)));
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diagram_is_lifted_out() {
        let source = "# Title\n\n```mermaid\ngraph TD\n  A --> B\n```\n\nAfter\n";
        let segments = split_segments(source);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].kind, SegmentKind::Markdown);
        assert_eq!(segments[1].kind, SegmentKind::Diagram(DiagramSyntax::Mermaid));
        assert_eq!(segments[1].content, "graph TD\n  A --> B");
        assert_eq!(segments[2].content, "\nAfter\n");
    }

    #[test]
    fn test_fence_text_inside_code_block_is_not_a_diagram() {
        let source = "````markdown\n```mermaid\ngraph TD\n```\n````\n";
        let segments = split_segments(source);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Markdown);
        assert_eq!(segments[0].content, source);
    }

    #[test]
    fn test_plantuml_aliases() {
        let segments = split_segments("```puml\n@startuml\nA -> B\n@enduml\n```\n");
        assert_eq!(segments[0].kind, SegmentKind::Diagram(DiagramSyntax::PlantUml));
    }

    #[test]
    fn test_equation_spans() {
        let segments = split_segments("Intro\n\n$$\nE = mc^2\n$$\n\n$$ a + b $$\n");
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Markdown, SegmentKind::Equation, SegmentKind::Equation]
        );
        assert_eq!(segments[1].content, "E = mc^2");
        assert_eq!(segments[2].content, "a + b");
    }

    #[test]
    fn test_unclosed_spans_stay_markdown() {
        let segments = split_segments("```mermaid\ngraph TD\n");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Markdown);

        let segments = split_segments("$$\nx\n");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Markdown);
    }
}
