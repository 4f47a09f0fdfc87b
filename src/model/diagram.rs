use serde::Serialize;
use std::fmt;

/// Source language of a fenced diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramSyntax {
    Mermaid,
    PlantUml,
}

impl DiagramSyntax {
    /// Recognises a fence info-string naming a diagram language.
    pub fn from_info_string(info: &str) -> Option<Self> {
        let name = info.split_whitespace().next().unwrap_or("");
        match name.to_ascii_lowercase().as_str() {
            "mermaid" => Some(DiagramSyntax::Mermaid),
            "plantuml" | "puml" => Some(DiagramSyntax::PlantUml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramSyntax::Mermaid => "mermaid",
            DiagramSyntax::PlantUml => "plantuml",
        }
    }

    /// Numeric syntax type of the whiteboard import call.
    pub fn wire_code(&self) -> u8 {
        match self {
            DiagramSyntax::PlantUml => 1,
            DiagramSyntax::Mermaid => 2,
        }
    }

    /// Line-comment marker of the diagram language.
    pub fn comment_prefix(&self) -> &'static str {
        match self {
            DiagramSyntax::Mermaid => "%%",
            DiagramSyntax::PlantUml => "'",
        }
    }
}

impl fmt::Display for DiagramSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
