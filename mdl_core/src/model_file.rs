//! # Model File Framing
//!
//! An `.MDL` file is a sequence of blocks. A block starts at a `*NAME*` line
//! and runs until the next one. The free-text description between
//! `<DESCRIPTION>` and `<END>` is kept verbatim as its own block.
//!
//! Blocks the engine does not model are carried through untouched, so a
//! read-modify-write cycle only changes the blocks that were replaced.
//!
//! The line ending of the source (`\r\n` for files written on Windows) is
//! detected on parse and reused on write.
//!
//! Files are single-byte encoded (Windows-1252 in practice). Bytes are mapped
//! one-to-one onto `U+0000..=U+00FF`, which makes the byte round trip exact
//! whatever the code page.
//!
//! ```rust
//! use mdl_core::model_file::ModelFile;
//!
//! let text = "*NODEXY*\n   1  0 0  0\n\n*ELSET*\n   1   1   1  1  1\n";
//! let mut model = ModelFile::parse(text);
//! assert_eq!(model.body("NODEXY").unwrap().len(), 1);
//!
//! model.set_body("NODEXY", vec!["   1  0 0  0".into(), "   2  5 0  0".into()]);
//! assert!(model.to_text().contains("   2  5 0  0"));
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, ModelResult};

/// Header name used for the description block.
pub const DESCRIPTION: &str = "DESCRIPTION";

const DESCRIPTION_START: &str = "<DESCRIPTION>";
const DESCRIPTION_END: &str = "<END>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: String,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// `CrLf` as soon as one line ends in `\r\n`.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Non-blank lines before the first block
    pub preamble: Vec<String>,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub line_ending: LineEnding,
}

/// `*NAME*` -> `NAME`
fn block_header(line: &str) -> Option<&str> {
    let stripped = line.trim();
    if stripped.len() > 2 && stripped.starts_with('*') && stripped.ends_with('*') {
        Some(&stripped[1..stripped.len() - 1])
    } else {
        None
    }
}

impl ModelFile {
    pub fn parse(text: &str) -> Self {
        let mut model = ModelFile {
            line_ending: LineEnding::detect(text),
            ..ModelFile::default()
        };
        let mut current: Option<Block> = None;
        let mut in_description = false;

        for raw in text.lines() {
            let line = raw.trim_end();

            if in_description {
                if let Some(block) = current.as_mut() {
                    block.body.push(line.to_string());
                }
                if line.contains(DESCRIPTION_END) {
                    model.blocks.extend(current.take());
                    in_description = false;
                }
                continue;
            }

            if line.contains(DESCRIPTION_START) {
                model.blocks.extend(current.take());
                in_description = !line.contains(DESCRIPTION_END);
                let block = Block {
                    header: DESCRIPTION.to_string(),
                    body: vec![line.to_string()],
                };
                if in_description {
                    current = Some(block);
                } else {
                    model.blocks.push(block);
                }
                continue;
            }

            if let Some(header) = block_header(line) {
                model.blocks.extend(current.take());
                current = Some(Block {
                    header: header.to_string(),
                    body: Vec::new(),
                });
            } else if !line.trim().is_empty() {
                match current.as_mut() {
                    Some(block) => block.body.push(line.to_string()),
                    None => model.preamble.push(line.to_string()),
                }
            }
        }

        model.blocks.extend(current);
        model
    }

    /// Decode single-byte text.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text)
    }

    pub fn to_text(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.blocks.len() + 1);
        if !self.preamble.is_empty() {
            parts.push(self.preamble.join("\n"));
        }
        for block in &self.blocks {
            if block.header == DESCRIPTION {
                parts.push(format!("{}{}", "\n".repeat(5), block.body.join("\n")));
            } else if block.body.is_empty() {
                parts.push(format!("*{}*", block.header));
            } else {
                parts.push(format!("*{}*\n{}", block.header, block.body.join("\n")));
            }
        }
        let joined = parts.join("\n");
        let text = format!("{}\n", joined.trim());
        match self.line_ending {
            LineEnding::Lf => text,
            LineEnding::CrLf => text.replace('\n', LineEnding::CrLf.as_str()),
        }
    }

    /// Encode as single-byte text; characters above U+00FF cannot be written.
    pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
        self.to_text()
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| {
                    ModelError::invalid_input("text", c.to_string(), "character is outside the single-byte range")
                })
            })
            .collect()
    }

    pub fn block(&self, header: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.header == header)
    }

    pub fn body(&self, header: &str) -> Option<&[String]> {
        self.block(header).map(|b| b.body.as_slice())
    }

    pub fn has_block(&self, header: &str) -> bool {
        self.block(header).is_some()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.header.as_str())
    }

    /// Replace a block body in place, or append a new block at the end.
    pub fn set_body(&mut self, header: &str, body: Vec<String>) {
        match self.blocks.iter_mut().find(|b| b.header == header) {
            Some(block) => block.body = body,
            None => self.blocks.push(Block {
                header: header.to_string(),
                body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "SANSPRO MODEL\n*NODEXY*\n   1  0 0  0\n\n   2  5 0  0   \n*PARAMETER*\n  12 3\n\n\n\n\n\n<DESCRIPTION>\nOffice tower\n\n<END>\n*ELSET*\n";

    #[test]
    fn test_blocks_in_order() {
        let model = ModelFile::parse(SAMPLE);
        let headers: Vec<&str> = model.headers().collect();
        assert_eq!(headers, vec!["NODEXY", "PARAMETER", "DESCRIPTION", "ELSET"]);
        assert_eq!(model.preamble, vec!["SANSPRO MODEL".to_string()]);
        // blank lines dropped, trailing whitespace trimmed
        assert_eq!(model.body("NODEXY").unwrap(), &["   1  0 0  0".to_string(), "   2  5 0  0".to_string()]);
        assert!(model.body("ELSET").unwrap().is_empty());
    }

    #[test]
    fn test_description_kept_verbatim() {
        let model = ModelFile::parse(SAMPLE);
        let description = model.body(DESCRIPTION).unwrap();
        assert_eq!(description, &["<DESCRIPTION>", "Office tower", "", "<END>"]);
    }

    #[test]
    fn test_write_then_read_is_stable() {
        let model = ModelFile::parse(SAMPLE);
        let text = model.to_text();
        assert!(text.contains("  12 3\n\n\n\n\n\n<DESCRIPTION>"));
        assert!(text.ends_with("*ELSET*\n"));
        assert_eq!(ModelFile::parse(&text), model);
    }

    #[test]
    fn test_crlf_kept_on_write() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        let model = ModelFile::parse(&crlf);
        assert_eq!(model.line_ending, LineEnding::CrLf);
        assert_eq!(model.body("NODEXY").unwrap()[0], "   1  0 0  0");

        let text = model.to_text();
        assert_eq!(text.matches("\r\n").count(), text.matches('\n').count());
        assert_eq!(ModelFile::parse(&text), model);
        assert_eq!(ModelFile::parse(SAMPLE).line_ending, LineEnding::Lf);
    }

    #[test]
    fn test_set_body_replaces_or_appends() {
        let mut model = ModelFile::parse(SAMPLE);
        model.set_body("NODEXY", vec!["   9  1 1  1".to_string()]);
        model.set_body("REGION", vec![]);
        assert_eq!(model.body("NODEXY").unwrap().len(), 1);
        assert_eq!(model.headers().last(), Some("REGION"));
    }

    #[test]
    fn test_single_byte_roundtrip() {
        let bytes = b"*MATERIAL*\n   1  1 ISOTROPIC f\xe9c 0 0 0 0\n";
        let model = ModelFile::from_bytes(bytes);
        assert_eq!(model.to_bytes().unwrap(), bytes.to_vec());

        let mut wide = model.clone();
        wide.set_body("MATERIAL", vec!["\u{4e2d}".to_string()]);
        assert!(wide.to_bytes().is_err());
    }
}
