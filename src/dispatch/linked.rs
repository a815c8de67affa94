//! Linked multi-image descriptors
//!
//! A descriptor names a system and lists asset slots, each pointing at a file
//! next to the descriptor:
//!
//! ```xml
//! <BizHawk-XMLGame System="DGB" Name="Link Battle">
//!   <LoadAssets>
//!     <LeftRom FileName="red.gb"/>
//!     <RightRom FileName="blue.gb"/>
//!   </LoadAssets>
//! </BizHawk-XMLGame>
//! ```

use crate::error::{Result, RomError};

/// Root element name
pub const ROOT_ELEMENT: &str = "BizHawk-XMLGame";

/// Element whose children are asset slots
pub const ASSETS_ELEMENT: &str = "LoadAssets";

/// One asset slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSlot {
    /// Slot name (the element name)
    pub slot: String,
    /// File name relative to the descriptor
    pub file_name: String,
}

/// A parsed descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDescriptor {
    /// Declared system id
    pub system_id: String,
    /// Display name
    pub name: String,
    /// Asset slots in document order
    pub assets: Vec<AssetSlot>,
}

/// A start or end tag
#[derive(Debug)]
struct Tag {
    line: usize,
    name: String,
    attributes: Vec<(String, String)>,
    closing: bool,
    self_closing: bool,
}

impl Tag {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl LinkedDescriptor {
    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self> {
        let tags = scan_tags(text)?;
        let mut iter = tags.iter();

        let root = iter
            .by_ref()
            .find(|t| !t.closing)
            .ok_or_else(|| RomError::invalid_format("Descriptor has no root element"))?;
        if root.name != ROOT_ELEMENT {
            return Err(RomError::parse(
                root.line,
                format!("Expected <{}>, found <{}>", ROOT_ELEMENT, root.name),
            ));
        }

        let system_id = root
            .attribute("System")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RomError::parse(root.line, "Missing System attribute"))?
            .to_string();
        let name = root.attribute("Name").unwrap_or_default().to_string();

        let mut assets = Vec::new();
        let mut in_assets = false;
        let mut depth = 0usize;

        for tag in iter {
            if tag.closing {
                if in_assets && depth == 0 && tag.name == ASSETS_ELEMENT {
                    in_assets = false;
                } else if depth > 0 {
                    depth -= 1;
                }
                continue;
            }

            if !in_assets {
                if tag.name == ASSETS_ELEMENT && !tag.self_closing {
                    in_assets = true;
                }
                continue;
            }

            if depth == 0 {
                let file_name = tag.attribute("FileName").ok_or_else(|| {
                    RomError::parse(tag.line, format!("Asset {} has no FileName", tag.name))
                })?;
                assets.push(AssetSlot {
                    slot: tag.name.clone(),
                    file_name: file_name.to_string(),
                });
            }
            if !tag.self_closing {
                depth += 1;
            }
        }

        if assets.is_empty() {
            return Err(RomError::invalid_format("Descriptor declares no assets"));
        }

        Ok(LinkedDescriptor {
            system_id,
            name,
            assets,
        })
    }

    /// Get the file name of a slot
    pub fn asset(&self, slot: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.slot == slot)
            .map(|a| a.file_name.as_str())
    }
}

fn line_at(text: &str, pos: usize) -> usize {
    text[..pos].matches('\n').count() + 1
}

/// Split text into tags, skipping declarations, comments and character data
fn scan_tags(text: &str) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        let rest = &text[start..];

        let (terminator, skip) = if rest.starts_with("<!--") {
            ("-->", true)
        } else if rest.starts_with("<?") {
            ("?>", true)
        } else if rest.starts_with("<!") {
            (">", true)
        } else {
            (">", false)
        };

        let end = if skip {
            rest.find(terminator)
        } else {
            tag_end(rest)
        }
        .ok_or_else(|| RomError::parse(line_at(text, start), "Unterminated tag"))?;
        pos = start + end + terminator.len();

        if !skip {
            tags.push(parse_tag(&rest[1..end], line_at(text, start))?);
        }
    }

    Ok(tags)
}

/// Find the `>` closing a tag, ignoring any inside quoted attribute values
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_tag(body: &str, line: usize) -> Result<Tag> {
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (self_closing, body) = match body.strip_suffix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let body = body.trim();
    let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
        return Err(RomError::parse(line, "Empty tag name"));
    }

    let mut attributes = Vec::new();
    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| RomError::parse(line, format!("Malformed attribute in <{}>", name)))?;
        let key = rest[..eq].trim();
        let value_part = rest[eq + 1..].trim_start();

        let quote = value_part
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| RomError::parse(line, format!("Unquoted attribute {}", key)))?;
        let close = value_part[1..]
            .find(quote)
            .ok_or_else(|| RomError::parse(line, format!("Unterminated attribute {}", key)))?;

        attributes.push((key.to_string(), unescape(&value_part[1..close + 1])));
        rest = value_part[close + 2..].trim_start();
    }

    Ok(Tag {
        line,
        name: name.to_string(),
        attributes,
        closing,
        self_closing,
    })
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DGB: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- two linked Game Boys -->
<BizHawk-XMLGame System="DGB" Name="Tetris &amp; Friends">
  <LoadAssets>
    <LeftRom FileName="tetris.gb"/>
    <RightRom FileName='tetris (copy).gb'></RightRom>
  </LoadAssets>
</BizHawk-XMLGame>
"#;

    #[test]
    fn test_parse_descriptor() {
        let descriptor = LinkedDescriptor::parse(DGB).unwrap();

        assert_eq!(descriptor.system_id, "DGB");
        assert_eq!(descriptor.name, "Tetris & Friends");
        assert_eq!(descriptor.assets.len(), 2);
        assert_eq!(descriptor.asset("LeftRom"), Some("tetris.gb"));
        assert_eq!(descriptor.asset("RightRom"), Some("tetris (copy).gb"));
    }

    #[test]
    fn test_wrong_root() {
        let err = LinkedDescriptor::parse("<snes><rom/></snes>").unwrap_err();
        assert!(matches!(err, RomError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_missing_system() {
        let err = LinkedDescriptor::parse("<BizHawk-XMLGame>\n<LoadAssets><A FileName=\"a\"/></LoadAssets></BizHawk-XMLGame>")
            .unwrap_err();
        assert!(err.to_string().contains("System"));
    }

    #[test]
    fn test_no_assets() {
        let err = LinkedDescriptor::parse("<BizHawk-XMLGame System=\"DGB\"><LoadAssets/></BizHawk-XMLGame>")
            .unwrap_err();
        assert!(matches!(err, RomError::InvalidFormat(_)));
    }

    #[test]
    fn test_asset_without_file_name() {
        let text = "<BizHawk-XMLGame System=\"DGB\">\n<LoadAssets>\n<LeftRom/>\n</LoadAssets>\n</BizHawk-XMLGame>";
        let err = LinkedDescriptor::parse(text).unwrap_err();
        assert!(matches!(err, RomError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_angle_brackets_in_values() {
        let text = r#"<BizHawk-XMLGame System="DGB" Name='a > b'>
<LoadAssets><LeftRom FileName="a>b.gb"/><RightRom FileName='c/>d.gb'/></LoadAssets>
</BizHawk-XMLGame>"#;
        let descriptor = LinkedDescriptor::parse(text).unwrap();

        assert_eq!(descriptor.name, "a > b");
        assert_eq!(descriptor.asset("LeftRom"), Some("a>b.gb"));
        assert_eq!(descriptor.asset("RightRom"), Some("c/>d.gb"));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = LinkedDescriptor::parse("<BizHawk-XMLGame System=\"DGB>").unwrap_err();
        assert!(matches!(err, RomError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_unterminated() {
        assert!(LinkedDescriptor::parse("<BizHawk-XMLGame System=\"DGB\"").is_err());
    }
}
