// src/api/wire.rs
//! JSON shape of blocks as the document service sends and accepts them.
//!
//! The service encodes a block as `block_type` plus one optional payload
//! field named after the kind (`text`, `heading3`, `table`, ...). These
//! types map that shape to and from [`Block`]; a kind this crate doesn't
//! model, or a payload that fails to parse, becomes [`Block::Unknown`].

use crate::error::AppError;
use crate::model::*;
use crate::types::{
    BackgroundColor, BlockId, StyledText, TextColor, TextElement, TextStyle, ValidatedUrl,
    WhiteboardId,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Characters left alone when encoding link targets, the same set
/// `encodeURIComponent` keeps.
const LINK_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One block as the service serialises it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    pub block_type: u32,
    /// The kind-named payload field(s).
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireTextBody {
    #[serde(default)]
    elements: Vec<WireTextElement>,
    #[serde(default)]
    style: WireBodyStyle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireBodyStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wrap: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireTextElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_run: Option<WireTextRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mention_user: Option<WireMentionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mention_doc: Option<WireMentionDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equation: Option<WireTextRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireTextRun {
    #[serde(default)]
    content: String,
    #[serde(default)]
    text_element_style: WireElementStyle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireMentionUser {
    user_id: String,
    #[serde(default)]
    text_element_style: WireElementStyle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireMentionDoc {
    token: String,
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default)]
    text_element_style: WireElementStyle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireElementStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    inline_code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<WireLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_color: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireLink {
    url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireCallout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emoji_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireTable {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cells: Vec<String>,
    property: WireTableProperty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireTableProperty {
    row_size: usize,
    column_size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    column_width: Vec<u32>,
    #[serde(default)]
    header_row: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireToken {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireImage {
    #[serde(default)]
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireFile {
    #[serde(default)]
    token: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireGrid {
    #[serde(default)]
    column_size: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireGridColumn {
    #[serde(default)]
    width_ratio: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireDiagram {
    #[serde(default)]
    diagram_type: u32,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Name of the payload field carrying the given kind.
fn payload_key(block_type: u32) -> Option<&'static str> {
    const HEADINGS: [&str; 9] = [
        "heading1", "heading2", "heading3", "heading4", "heading5", "heading6", "heading7",
        "heading8", "heading9",
    ];
    let key = match block_type {
        1 => "page",
        2 => "text",
        3..=11 => HEADINGS[(block_type - 3) as usize],
        12 => "bullet",
        13 => "ordered",
        14 => "code",
        15 => "quote",
        16 => "equation",
        17 => "todo",
        18 => "bitable",
        19 => "callout",
        21 => "diagram",
        22 => "divider",
        23 => "file",
        24 => "grid",
        25 => "grid_column",
        27 => "image",
        30 => "sheet",
        31 => "table",
        32 => "table_cell",
        34 => "quote_container",
        43 => "board",
        _ => return None,
    };
    Some(key)
}

// --- Styled text ---

fn style_from_wire(style: &WireElementStyle) -> TextStyle {
    let link = style.link.as_ref().and_then(|link| {
        let decoded = percent_decode_str(&link.url).decode_utf8_lossy();
        ValidatedUrl::parse(&decoded).ok()
    });
    TextStyle {
        bold: style.bold,
        italic: style.italic,
        strikethrough: style.strikethrough,
        underline: style.underline,
        inline_code: style.inline_code,
        link,
        text_color: style.text_color.map(TextColor::from_code).unwrap_or_default(),
        background_color: style
            .background_color
            .map(BackgroundColor::from_code)
            .unwrap_or_default(),
    }
}

fn style_to_wire(style: &TextStyle) -> WireElementStyle {
    WireElementStyle {
        bold: style.bold,
        italic: style.italic,
        strikethrough: style.strikethrough,
        underline: style.underline,
        inline_code: style.inline_code,
        link: style.link.as_ref().map(|url| WireLink {
            url: utf8_percent_encode(url.as_str(), LINK_ENCODE_SET).to_string(),
        }),
        text_color: style.text_color.code(),
        background_color: style.background_color.code(),
    }
}

fn text_from_wire(body: &WireTextBody) -> StyledText {
    let mut text = StyledText::new();
    for element in &body.elements {
        if let Some(run) = &element.text_run {
            text.push(TextElement::styled(
                run.content.clone(),
                style_from_wire(&run.text_element_style),
            ));
        } else if let Some(mention) = &element.mention_user {
            text.push(TextElement::MentionUser {
                user_id: mention.user_id.clone(),
                style: style_from_wire(&mention.text_element_style),
            });
        } else if let Some(mention) = &element.mention_doc {
            text.push(TextElement::MentionDocument {
                token: mention.token.clone(),
                title: mention.title.clone(),
                url: mention
                    .url
                    .as_ref()
                    .map(|url| percent_decode_str(url).decode_utf8_lossy().into_owned()),
                style: style_from_wire(&mention.text_element_style),
            });
        } else if let Some(equation) = &element.equation {
            text.push(TextElement::Equation {
                expression: equation.content.trim_end_matches('\n').to_string(),
                style: style_from_wire(&equation.text_element_style),
            });
        }
    }
    text
}

fn text_to_wire(text: &StyledText) -> WireTextBody {
    let elements = text
        .elements
        .iter()
        .map(|element| match element {
            TextElement::Text { content, style } => WireTextElement {
                text_run: Some(WireTextRun {
                    content: content.clone(),
                    text_element_style: style_to_wire(style),
                }),
                ..Default::default()
            },
            TextElement::MentionUser { user_id, style } => WireTextElement {
                mention_user: Some(WireMentionUser {
                    user_id: user_id.clone(),
                    text_element_style: style_to_wire(style),
                }),
                ..Default::default()
            },
            TextElement::MentionDocument {
                token,
                title,
                url,
                style,
            } => WireTextElement {
                mention_doc: Some(WireMentionDoc {
                    token: token.clone(),
                    title: title.clone(),
                    url: url
                        .as_ref()
                        .map(|u| utf8_percent_encode(u, LINK_ENCODE_SET).to_string()),
                    text_element_style: style_to_wire(style),
                }),
                ..Default::default()
            },
            TextElement::Equation { expression, style } => WireTextElement {
                equation: Some(WireTextRun {
                    content: expression.clone(),
                    text_element_style: style_to_wire(style),
                }),
                ..Default::default()
            },
        })
        .collect();
    WireTextBody {
        elements,
        style: WireBodyStyle::default(),
    }
}

// --- Blocks ---

fn parse_payload<T: serde::de::DeserializeOwned>(wire: &WireBlock, key: &str) -> Option<T> {
    let value = wire.payload.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::debug!(
                "Payload '{}' of block {:?} did not parse: {}",
                key,
                wire.block_id,
                e
            );
            None
        }
    }
}

/// Converts a service block into the domain model.
pub fn block_from_wire(wire: WireBlock) -> Block {
    let common = BlockCommon {
        id: wire
            .block_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(BlockId::from_remote)
            .unwrap_or_else(BlockId::new_v4),
        parent_id: wire
            .parent_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(BlockId::from_remote),
        children: wire.children.iter().map(BlockId::from_remote).collect(),
    };
    let unknown = |common: BlockCommon| {
        Block::Unknown(UnknownBlock {
            common,
            block_type: wire.block_type,
        })
    };
    let Some(key) = payload_key(wire.block_type) else {
        return unknown(common);
    };

    let text_content = |body: &WireTextBody| TextBlockContent::new(text_from_wire(body));

    match wire.block_type {
        1 | 2 | 3..=11 | 12 | 13 | 14 | 15 | 16 | 17 => {
            let Some(body) = parse_payload::<WireTextBody>(&wire, key) else {
                return unknown(common);
            };
            match wire.block_type {
                1 => Block::Page(PageBlock {
                    common,
                    content: text_content(&body),
                }),
                2 => Block::Text(TextBlock {
                    common,
                    content: text_content(&body),
                }),
                12 => Block::Bullet(ListItemBlock {
                    common,
                    content: text_content(&body),
                }),
                13 => Block::Ordered(ListItemBlock {
                    common,
                    content: text_content(&body),
                }),
                14 => Block::Code(CodeBlock {
                    common,
                    language: body
                        .style
                        .language
                        .map(CodeLanguage::from_code)
                        .unwrap_or_default(),
                    wrap: body.style.wrap.unwrap_or(false),
                    content: text_content(&body),
                }),
                15 => Block::Quote(QuoteBlock {
                    common,
                    content: text_content(&body),
                }),
                16 => Block::Equation(EquationBlock {
                    common,
                    expression: text_from_wire(&body).to_plain_text().trim().to_string(),
                }),
                17 => Block::ToDo(ToDoBlock {
                    common,
                    content: text_content(&body),
                    done: body.style.done.unwrap_or(false),
                }),
                level => Block::Heading(HeadingBlock {
                    common,
                    level: (level - 2) as u8,
                    content: text_content(&body),
                }),
            }
        }
        19 => match parse_payload::<WireCallout>(&wire, key) {
            Some(callout) => Block::Callout(CalloutBlock {
                common,
                background: callout
                    .background_color
                    .map(BackgroundColor::from_code)
                    .unwrap_or_default(),
                emoji: callout.emoji_id,
            }),
            None => unknown(common),
        },
        31 => match parse_payload::<WireTable>(&wire, key) {
            Some(table) => Block::Table(TableBlock {
                common,
                property: TableProperty {
                    rows: table.property.row_size,
                    columns: table.property.column_size,
                    column_widths: table.property.column_width,
                    header_row: table.property.header_row,
                },
                cells: table.cells.iter().map(BlockId::from_remote).collect(),
            }),
            None => unknown(common),
        },
        32 => Block::TableCell(ContainerBlock { common }),
        34 => Block::QuoteContainer(ContainerBlock { common }),
        22 => Block::Divider(DividerBlock { common }),
        27 => {
            let image = parse_payload::<WireImage>(&wire, key).unwrap_or_default();
            Block::Image(ImageBlock {
                common,
                token: image.token,
                width: image.width,
                height: image.height,
            })
        }
        43 => {
            let board = parse_payload::<WireToken>(&wire, key).unwrap_or_default();
            Block::Board(BoardBlock {
                common,
                token: Some(board.token)
                    .filter(|t| !t.is_empty())
                    .map(WhiteboardId::from_remote),
            })
        }
        24 => {
            let grid = parse_payload::<WireGrid>(&wire, key).unwrap_or_default();
            Block::Grid(GridBlock {
                common,
                column_size: grid.column_size,
            })
        }
        25 => {
            let column = parse_payload::<WireGridColumn>(&wire, key).unwrap_or_default();
            Block::GridColumn(GridColumnBlock {
                common,
                width_ratio: column.width_ratio,
            })
        }
        23 => {
            let file = parse_payload::<WireFile>(&wire, key).unwrap_or_default();
            Block::File(FileBlock {
                common,
                token: file.token,
                name: file.name,
            })
        }
        30 => {
            let sheet = parse_payload::<WireToken>(&wire, key).unwrap_or_default();
            Block::Sheet(EmbedBlock {
                common,
                token: sheet.token,
            })
        }
        18 => {
            let bitable = parse_payload::<WireToken>(&wire, key).unwrap_or_default();
            Block::Bitable(EmbedBlock {
                common,
                token: bitable.token,
            })
        }
        21 => {
            let diagram = parse_payload::<WireDiagram>(&wire, key).unwrap_or_default();
            Block::Diagram(DiagramBlock {
                common,
                diagram_type: diagram.diagram_type,
            })
        }
        _ => unknown(common),
    }
}

/// Converts a locally built block into the body of a create call.
///
/// Ids and children are left out: the service assigns ids and children are
/// created by separate calls under the returned parent id.
pub fn block_to_wire(block: &Block) -> Result<WireBlock, AppError> {
    let block_type = block.kind_code();
    let key = payload_key(block_type).ok_or_else(|| {
        AppError::MalformedResponse(format!(
            "Block kind {} cannot be created remotely",
            block_type
        ))
    })?;

    let payload = match block {
        Block::Page(b) => serde_json::to_value(text_to_wire(&b.content.text))?,
        Block::Text(b) => serde_json::to_value(text_to_wire(&b.content.text))?,
        Block::Heading(b) => serde_json::to_value(text_to_wire(&b.content.text))?,
        Block::Bullet(b) | Block::Ordered(b) => {
            serde_json::to_value(text_to_wire(&b.content.text))?
        }
        Block::Quote(b) => serde_json::to_value(text_to_wire(&b.content.text))?,
        Block::ToDo(b) => {
            let mut body = text_to_wire(&b.content.text);
            body.style.done = Some(b.done);
            serde_json::to_value(body)?
        }
        Block::Code(b) => {
            let mut body = text_to_wire(&b.content.text);
            body.style.language = Some(b.language.code());
            body.style.wrap = Some(b.wrap);
            serde_json::to_value(body)?
        }
        Block::Equation(b) => serde_json::to_value(text_to_wire(&StyledText::from_elements(
            vec![TextElement::equation(b.expression.clone())],
        )))?,
        Block::Callout(b) => serde_json::to_value(WireCallout {
            background_color: b.background.code(),
            emoji_id: b.emoji.clone(),
        })?,
        Block::Table(b) => serde_json::to_value(WireTable {
            cells: Vec::new(),
            property: WireTableProperty {
                row_size: b.property.rows,
                column_size: b.property.columns,
                column_width: b.property.column_widths.clone(),
                header_row: b.property.header_row,
            },
        })?,
        Block::Image(b) => serde_json::to_value(WireImage {
            token: b.token.clone(),
            width: b.width,
            height: b.height,
        })?,
        Block::Board(_)
        | Block::Divider(_)
        | Block::QuoteContainer(_)
        | Block::TableCell(_) => Value::Object(Map::new()),
        Block::Grid(b) => serde_json::to_value(WireGrid {
            column_size: b.column_size,
        })?,
        Block::GridColumn(b) => serde_json::to_value(WireGridColumn {
            width_ratio: b.width_ratio,
        })?,
        Block::File(b) => serde_json::to_value(WireFile {
            token: b.token.clone(),
            name: b.name.clone(),
        })?,
        Block::Sheet(b) | Block::Bitable(b) => serde_json::to_value(WireToken {
            token: b.token.clone(),
        })?,
        Block::Diagram(b) => serde_json::to_value(WireDiagram {
            diagram_type: b.diagram_type,
        })?,
        Block::Unknown(_) => Value::Object(Map::new()),
    };

    let mut map = Map::new();
    map.insert(key.to_string(), payload);
    Ok(WireBlock {
        block_id: None,
        parent_id: None,
        children: Vec::new(),
        block_type,
        payload: map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_block_from_wire() {
        let wire: WireBlock = serde_json::from_value(json!({
            "block_id": "blk1",
            "parent_id": "doc",
            "block_type": 4,
            "heading2": {
                "elements": [
                    { "text_run": { "content": "Hello ", "text_element_style": {} } },
                    { "text_run": {
                        "content": "site",
                        "text_element_style": {
                            "bold": true,
                            "link": { "url": "https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc" }
                        }
                    } }
                ],
                "style": {}
            }
        }))
        .unwrap();

        let block = block_from_wire(wire);
        let Block::Heading(heading) = &block else {
            panic!("expected heading, got {:?}", block);
        };
        assert_eq!(heading.level, 2);
        let elements = &heading.content.text.elements;
        assert_eq!(elements.len(), 2);
        let style = elements[1].style();
        assert!(style.bold);
        assert_eq!(
            style.link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn test_unknown_kind_and_missing_payload_degrade() {
        let odd: WireBlock =
            serde_json::from_value(json!({ "block_id": "x", "block_type": 999 })).unwrap();
        assert!(matches!(block_from_wire(odd), Block::Unknown(UnknownBlock { block_type: 999, .. })));

        let bare: WireBlock =
            serde_json::from_value(json!({ "block_id": "y", "block_type": 2 })).unwrap();
        assert!(matches!(block_from_wire(bare), Block::Unknown(UnknownBlock { block_type: 2, .. })));
    }

    #[test]
    fn test_links_are_percent_encoded_on_the_wire() {
        let style = TextStyle {
            link: Some(ValidatedUrl::parse("https://example.com/a b").unwrap()),
            ..Default::default()
        };
        let block = Block::text_block(StyledText::from_elements(vec![TextElement::styled(
            "x", style,
        )]));
        let wire = block_to_wire(&block).unwrap();
        let body = serde_json::to_string(&wire).unwrap();
        assert!(body.contains("https%3A%2F%2Fexample.com%2Fa%2520b"));
        assert!(body.contains("\"block_type\":2"));
    }

    #[test]
    fn test_table_and_board_parse() {
        let table: WireBlock = serde_json::from_value(json!({
            "block_id": "t",
            "block_type": 31,
            "children": ["c1", "c2"],
            "table": {
                "cells": ["c1", "c2"],
                "property": { "row_size": 1, "column_size": 2, "header_row": false }
            }
        }))
        .unwrap();
        let Block::Table(table) = block_from_wire(table) else {
            panic!("expected table");
        };
        assert_eq!(table.cells.len(), 2);
        assert_eq!(table.property.columns, 2);

        let board: WireBlock = serde_json::from_value(json!({
            "block_id": "b",
            "block_type": 43,
            "board": { "token": "wb123" }
        }))
        .unwrap();
        let Block::Board(board) = block_from_wire(board) else {
            panic!("expected board");
        };
        assert_eq!(board.token.map(|t| t.to_string()), Some("wb123".to_string()));
    }
}
