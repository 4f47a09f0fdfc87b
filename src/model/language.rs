//! Numeric code-language table of the document service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages keyed by the service's numeric code, with the Markdown
/// info-string each one is written as.
const LANGUAGES: &[(u32, &str)] = &[
    (1, ""),
    (2, "abap"),
    (3, "ada"),
    (4, "apache"),
    (5, "apex"),
    (6, "assembly"),
    (7, "bash"),
    (8, "csharp"),
    (9, "cpp"),
    (10, "c"),
    (11, "cobol"),
    (12, "css"),
    (13, "coffeescript"),
    (14, "d"),
    (15, "dart"),
    (16, "delphi"),
    (17, "django"),
    (18, "dockerfile"),
    (19, "erlang"),
    (20, "fortran"),
    (21, "foxpro"),
    (22, "go"),
    (23, "groovy"),
    (24, "html"),
    (25, "htmlbars"),
    (26, "http"),
    (27, "haskell"),
    (28, "json"),
    (29, "java"),
    (30, "javascript"),
    (31, "julia"),
    (32, "kotlin"),
    (33, "latex"),
    (34, "lisp"),
    (35, "logo"),
    (36, "lua"),
    (37, "matlab"),
    (38, "makefile"),
    (39, "markdown"),
    (40, "nginx"),
    (41, "objectivec"),
    (42, "openedgeabl"),
    (43, "php"),
    (44, "perl"),
    (45, "postscript"),
    (46, "powershell"),
    (47, "prolog"),
    (48, "protobuf"),
    (49, "python"),
    (50, "r"),
    (51, "rpg"),
    (52, "ruby"),
    (53, "rust"),
    (54, "sas"),
    (55, "scss"),
    (56, "sql"),
    (57, "scala"),
    (58, "scheme"),
    (59, "scratch"),
    (60, "shell"),
    (61, "swift"),
    (62, "thrift"),
    (63, "typescript"),
    (64, "vbscript"),
    (65, "vb"),
    (66, "xml"),
    (67, "yaml"),
    (68, "cmake"),
    (69, "diff"),
    (70, "gherkin"),
    (71, "graphql"),
    (72, "glsl"),
    (73, "properties"),
    (74, "solidity"),
    (75, "toml"),
];

/// Common info-string spellings that differ from the canonical names.
const ALIASES: &[(&str, &str)] = &[
    ("sh", "bash"),
    ("zsh", "shell"),
    ("console", "shell"),
    ("c++", "cpp"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("golang", "go"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("objc", "objectivec"),
    ("objective-c", "objectivec"),
    ("ps1", "powershell"),
    ("docker", "dockerfile"),
    ("proto", "protobuf"),
    ("tex", "latex"),
    ("make", "makefile"),
    ("kt", "kotlin"),
    ("text", ""),
    ("plaintext", ""),
    ("txt", ""),
];

/// Language of a code block, stored as the service's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeLanguage(u32);

impl CodeLanguage {
    pub const PLAIN_TEXT: CodeLanguage = CodeLanguage(1);

    pub fn from_code(code: u32) -> Self {
        Self(code)
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    /// Resolves a fenced-code info string; unknown languages become plain text.
    pub fn from_info_string(info: &str) -> Self {
        let name = info
            .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name.as_str());

        LANGUAGES
            .iter()
            .find(|(_, lang)| *lang == canonical)
            .map(|(code, _)| Self(*code))
            .unwrap_or(Self::PLAIN_TEXT)
    }

    /// Info-string for a Markdown fence; empty for plain text and unknown codes.
    pub fn name(&self) -> &'static str {
        LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

impl Default for CodeLanguage {
    fn default() -> Self {
        Self::PLAIN_TEXT
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
