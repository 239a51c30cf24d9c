//! Line-preserving view of a G-code file and its header layout.

use std::ops::Range;

use crate::dialect::{self, MD5_PREFIX, SIGNATURE_PREFIX};
use crate::error::{Result, TranscodeError};

/// UTF-8 byte order mark some editors put in front of the first line.
pub const BOM: &str = "\u{feff}";

/// The input text split into lines.
///
/// Each line keeps its own terminator, so writing [`Document::bom`] and then
/// the raw lines back in order reproduces the input byte for byte.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    bom: &'static str,
    lines: Vec<&'a str>,
    newline: &'static str,
}

/// Where the header ends and the body begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// A stale `; MD5:` line at the very top, if any.
    pub checksum: Option<usize>,
    /// The header block to replace. Empty when the file has none, in which
    /// case the encoded header is inserted at `header.start`.
    pub header: Range<usize>,
    /// Index of the first G-code command.
    pub first_command: usize,
}

impl Layout {
    /// Index of the first line after the header block.
    pub fn body_start(&self) -> usize {
        self.header.end
    }
}

impl<'a> Document<'a> {
    /// Split text into lines. A leading byte order mark is set aside so it
    /// does not hide what the first line is.
    pub fn new(text: &'a str) -> Self {
        let (bom, text) = match text.strip_prefix(BOM) {
            Some(rest) => (BOM, rest),
            None => ("", text),
        };
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let newline = match lines.first() {
            Some(first) if first.ends_with("\r\n") => "\r\n",
            _ => "\n",
        };
        Self {
            bom,
            lines,
            newline,
        }
    }

    /// The byte order mark the input started with, or `""`.
    pub fn bom(&self) -> &'static str {
        self.bom
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line terminator used for lines the transcoder inserts.
    pub fn newline(&self) -> &'static str {
        self.newline
    }

    /// Raw line including its terminator.
    pub fn raw(&self, index: usize) -> &'a str {
        self.lines[index]
    }

    /// Line content without its terminator.
    pub fn line(&self, index: usize) -> &'a str {
        strip_newline(self.lines[index])
    }

    /// All line contents, in order.
    pub fn lines(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.lines.iter().map(|raw| strip_newline(raw))
    }

    /// Locate the header block and the first G-code command.
    pub fn layout(&self) -> Result<Layout> {
        let first_command = self
            .lines()
            .position(dialect::is_command)
            .ok_or_else(|| {
                TranscodeError::StructuralBoundary("no G-code command found in the file".into())
            })?;

        let checksum = match self.lines.first() {
            Some(first) if strip_newline(first).trim_start().starts_with(MD5_PREFIX) => Some(0),
            _ => None,
        };
        let preamble_start = checksum.map_or(0, |i| i + 1);

        let start = (preamble_start..first_command).find(|&i| dialect::is_header_start(self.line(i)));
        let header = match start {
            Some(start) => {
                let end = (start + 1..first_command)
                    .find(|&i| dialect::is_header_end(self.line(i)))
                    .ok_or_else(|| {
                        TranscodeError::StructuralBoundary(format!(
                            "HEADER_BLOCK_START on line {} is not closed before the first G-code command on line {}",
                            start + 1,
                            first_command + 1
                        ))
                    })?;
                start..end + 1
            }
            None => {
                if let Some(stray) =
                    (preamble_start..first_command).find(|&i| dialect::is_header_end(self.line(i)))
                {
                    return Err(TranscodeError::StructuralBoundary(format!(
                        "HEADER_BLOCK_END on line {} has no matching HEADER_BLOCK_START",
                        stray + 1
                    )));
                }
                preamble_start..preamble_start
            }
        };

        Ok(Layout {
            checksum,
            header,
            first_command,
        })
    }

    /// Whether the header block already carries the firmware dialect
    /// signature.
    pub fn is_converted(&self, layout: &Layout) -> bool {
        layout
            .header
            .clone()
            .any(|i| self.line(i).trim_start().starts_with(SIGNATURE_PREFIX))
    }
}

fn strip_newline(raw: &str) -> &str {
    raw.trim_end_matches(|c| c == '\n' || c == '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_terminators() {
        let text = "; a\r\nG1 X1\r\nG1 X2";
        let doc = Document::new(text);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.newline(), "\r\n");
        assert_eq!(doc.line(0), "; a");
        assert_eq!(doc.raw(0), "; a\r\n");
        assert_eq!(doc.raw(2), "G1 X2");
        let joined: String = (0..doc.len()).map(|i| doc.raw(i)).collect();
        assert_eq!(joined, text);
        assert_eq!(doc.bom(), "");
    }

    #[test]
    fn test_bom_does_not_hide_the_header() {
        let text = "\u{feff}; HEADER_BLOCK_START\n; total layer number: 1\n; HEADER_BLOCK_END\nG28\n";
        let doc = Document::new(text);
        assert_eq!(doc.bom(), BOM);
        assert_eq!(doc.line(0), "; HEADER_BLOCK_START");
        let layout = doc.layout().unwrap();
        assert_eq!(layout.header, 0..3);
        assert_eq!(layout.first_command, 3);

        let joined: String = std::iter::once(doc.bom())
            .chain((0..doc.len()).map(|i| doc.raw(i)))
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_bom_before_checksum() {
        let doc = Document::new("\u{feff}; MD5:0123\n; HEADER_BLOCK_START\n; HEADER_BLOCK_END\nG28\n");
        let layout = doc.layout().unwrap();
        assert_eq!(layout.checksum, Some(0));
        assert_eq!(layout.header, 1..3);
    }

    #[test]
    fn test_layout_with_header_block() {
        let text = "; HEADER_BLOCK_START\n; total layer number: 2\n; HEADER_BLOCK_END\n\n; THUMBNAIL_BLOCK_START\n; THUMBNAIL_BLOCK_END\nG28\n";
        let doc = Document::new(text);
        let layout = doc.layout().unwrap();
        assert_eq!(layout.header, 0..3);
        assert_eq!(layout.first_command, 6);
        assert_eq!(layout.checksum, None);
        assert_eq!(layout.body_start(), 3);
    }

    #[test]
    fn test_layout_without_header_block() {
        let doc = Document::new("; some comment\nG28\n");
        let layout = doc.layout().unwrap();
        assert_eq!(layout.header, 0..0);
        assert_eq!(layout.first_command, 1);
    }

    #[test]
    fn test_layout_with_checksum() {
        let doc = Document::new("; MD5:0123\n; HEADER_BLOCK_START\n; HEADER_BLOCK_END\nG28\n");
        let layout = doc.layout().unwrap();
        assert_eq!(layout.checksum, Some(0));
        assert_eq!(layout.header, 1..3);
    }

    #[test]
    fn test_header_block_after_first_command_is_body() {
        let doc = Document::new("G28\n; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n");
        let layout = doc.layout().unwrap();
        assert_eq!(layout.header, 0..0);
        assert_eq!(layout.first_command, 0);
    }

    #[test]
    fn test_boundary_errors() {
        let no_commands = Document::new("; only\n; comments\n");
        assert!(matches!(
            no_commands.layout(),
            Err(TranscodeError::StructuralBoundary(_))
        ));

        let unclosed = Document::new("; HEADER_BLOCK_START\n; x\nG28\n; HEADER_BLOCK_END\n");
        assert!(matches!(
            unclosed.layout(),
            Err(TranscodeError::StructuralBoundary(_))
        ));

        let stray_end = Document::new("; HEADER_BLOCK_END\nG28\n");
        assert!(matches!(
            stray_end.layout(),
            Err(TranscodeError::StructuralBoundary(_))
        ));

        assert!(Document::new("").layout().is_err());
    }

    #[test]
    fn test_is_converted() {
        let doc = Document::new(
            "; HEADER_BLOCK_START\n; postprocessed by orcaflash 0.1.0\n; HEADER_BLOCK_END\nG28\n",
        );
        let layout = doc.layout().unwrap();
        assert!(doc.is_converted(&layout));

        let doc = Document::new("; HEADER_BLOCK_START\n; HEADER_BLOCK_END\nG28\n");
        let layout = doc.layout().unwrap();
        assert!(!doc.is_converted(&layout));
    }
}
