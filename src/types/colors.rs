use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Font color of a styled run, as the remote service numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

impl TextColor {
    /// Decode the remote numeric code; unknown codes fall back to default.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TextColor::Red,
            2 => TextColor::Orange,
            3 => TextColor::Yellow,
            4 => TextColor::Green,
            5 => TextColor::Blue,
            6 => TextColor::Purple,
            7 => TextColor::Gray,
            _ => TextColor::Default,
        }
    }

    /// Remote numeric code, `None` for the default color.
    pub fn code(&self) -> Option<u8> {
        match self {
            TextColor::Default => None,
            TextColor::Red => Some(1),
            TextColor::Orange => Some(2),
            TextColor::Yellow => Some(3),
            TextColor::Green => Some(4),
            TextColor::Blue => Some(5),
            TextColor::Purple => Some(6),
            TextColor::Gray => Some(7),
        }
    }
}

/// Background color used by callouts and highlighted runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundColor {
    #[default]
    Default,
    LightRed,
    LightOrange,
    LightYellow,
    LightGreen,
    LightBlue,
    LightPurple,
    LightGray,
    DarkRed,
    DarkOrange,
    DarkYellow,
    DarkGreen,
    DarkBlue,
    DarkPurple,
    DarkGray,
}

impl BackgroundColor {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => BackgroundColor::LightRed,
            2 => BackgroundColor::LightOrange,
            3 => BackgroundColor::LightYellow,
            4 => BackgroundColor::LightGreen,
            5 => BackgroundColor::LightBlue,
            6 => BackgroundColor::LightPurple,
            7 => BackgroundColor::LightGray,
            8 => BackgroundColor::DarkRed,
            9 => BackgroundColor::DarkOrange,
            10 => BackgroundColor::DarkYellow,
            11 => BackgroundColor::DarkGreen,
            12 => BackgroundColor::DarkBlue,
            13 => BackgroundColor::DarkPurple,
            14 => BackgroundColor::DarkGray,
            _ => BackgroundColor::Default,
        }
    }

    pub fn code(&self) -> Option<u8> {
        match self {
            BackgroundColor::Default => None,
            BackgroundColor::LightRed => Some(1),
            BackgroundColor::LightOrange => Some(2),
            BackgroundColor::LightYellow => Some(3),
            BackgroundColor::LightGreen => Some(4),
            BackgroundColor::LightBlue => Some(5),
            BackgroundColor::LightPurple => Some(6),
            BackgroundColor::LightGray => Some(7),
            BackgroundColor::DarkRed => Some(8),
            BackgroundColor::DarkOrange => Some(9),
            BackgroundColor::DarkYellow => Some(10),
            BackgroundColor::DarkGreen => Some(11),
            BackgroundColor::DarkBlue => Some(12),
            BackgroundColor::DarkPurple => Some(13),
            BackgroundColor::DarkGray => Some(14),
        }
    }
}

/// Admonition tag of a callout, written as `> [!TAG]` in Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Admonition {
    Note,
    Warning,
    Caution,
    Tip,
    Success,
}

impl Admonition {
    /// Picks the admonition for a callout background.
    ///
    /// Colors outside the table read as a plain note.
    pub fn from_background(color: BackgroundColor) -> Self {
        match color {
            BackgroundColor::LightRed | BackgroundColor::DarkRed => Admonition::Caution,
            BackgroundColor::LightOrange
            | BackgroundColor::LightYellow
            | BackgroundColor::DarkOrange
            | BackgroundColor::DarkYellow => Admonition::Warning,
            BackgroundColor::LightGreen | BackgroundColor::DarkGreen => Admonition::Success,
            BackgroundColor::LightPurple | BackgroundColor::DarkPurple => Admonition::Tip,
            _ => Admonition::Note,
        }
    }

    /// The canonical background written when creating a callout.
    pub fn background(&self) -> BackgroundColor {
        match self {
            Admonition::Note => BackgroundColor::LightBlue,
            Admonition::Warning => BackgroundColor::LightYellow,
            Admonition::Caution => BackgroundColor::LightRed,
            Admonition::Tip => BackgroundColor::LightPurple,
            Admonition::Success => BackgroundColor::LightGreen,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Admonition::Note => "NOTE",
            Admonition::Warning => "WARNING",
            Admonition::Caution => "CAUTION",
            Admonition::Tip => "TIP",
            Admonition::Success => "SUCCESS",
        }
    }
}

impl std::str::FromStr for Admonition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTE" | "INFO" | "IMPORTANT" => Ok(Admonition::Note),
            "WARNING" => Ok(Admonition::Warning),
            "CAUTION" | "DANGER" => Ok(Admonition::Caution),
            "TIP" => Ok(Admonition::Tip),
            "SUCCESS" => Ok(Admonition::Success),
            _ => Err(ValidationError::InvalidColor(s.to_string())),
        }
    }
}

impl fmt::Display for Admonition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
