//! Document transcoder: parse, calculate, encode, annotate, splice.

use tracing::{debug, info};

use crate::annotate::{annotate, check_layer_count, scan_layers, LayerCountMismatch};
use crate::dialect::MD5_PREFIX;
use crate::document::Document;
use crate::encoder::encode_header;
use crate::error::Result;
use crate::material::MaterialTable;
use crate::metrics::{layer_progress, Calculator};
use crate::parser;
use crate::settings::{SettingKey, SettingValue};

/// Conversion options.
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    /// Fallback densities, prices and filament diameter.
    pub materials: MaterialTable,
    /// Prepend a `; MD5:` line with the checksum of the rest of the output.
    pub add_md5: bool,
}

/// Result of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcoded {
    /// The output document.
    pub text: String,
    /// The input was already in the firmware dialect and was returned as is.
    pub already_converted: bool,
    /// Number of layer markers annotated.
    pub layers: usize,
    /// Declared layer count that did not match the markers, if any.
    pub layer_mismatch: Option<LayerCountMismatch>,
}

/// Converts OrcaSlicer G-code into the FlashForge dialect.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    options: TranscodeOptions,
}

impl Transcoder {
    /// Create a transcoder.
    pub fn new(options: TranscodeOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Convert a document.
    ///
    /// Lines outside the header block are copied unchanged, apart from the
    /// progress comments added after each layer marker. A document that
    /// already carries the firmware signature is returned unchanged.
    pub fn transcode(&self, raw: &str) -> Result<Transcoded> {
        let doc = Document::new(raw);
        let layout = doc.layout()?;

        if doc.is_converted(&layout) {
            info!("file is already in the firmware dialect, leaving it untouched");
            return Ok(Transcoded {
                text: raw.to_string(),
                already_converted: true,
                layers: 0,
                layer_mismatch: None,
            });
        }

        let raw_settings = parser::parse(&doc)?;
        let mut settings = Calculator::new(&self.options.materials).calculate(raw_settings)?;

        let body_start = layout.body_start();
        let events = scan_layers(&doc, body_start);
        let declared = settings.number(SettingKey::LayerCount).unwrap_or(0.0) as u32;
        let layer_mismatch = check_layer_count(declared, events.len());
        if layer_mismatch.is_some() && !events.is_empty() {
            settings.insert(
                SettingKey::LayerCount,
                SettingValue::Number(events.len() as f64),
            );
        }

        let total_secs = settings.duration(SettingKey::PrintTime).unwrap_or(0);
        let hints: Vec<Option<u64>> = events.iter().map(|e| e.remaining_hint).collect();
        let progress = layer_progress(total_secs, &hints);

        let header = encode_header(&settings)?;
        debug!(lines = header.len(), "encoded firmware header");

        let newline = doc.newline();
        let mut text = String::with_capacity(raw.len() + 64 * (header.len() + 2 * events.len()));
        let preamble_start = layout.checksum.map_or(0, |line| line + 1);
        for index in preamble_start..layout.header.start {
            text.push_str(doc.raw(index));
        }
        for line in &header {
            text.push_str(line);
            text.push_str(newline);
        }
        if body_start < doc.len() && !doc.line(body_start).trim().is_empty() {
            text.push_str(newline);
        }
        annotate(&doc, body_start, &events, &progress, &mut text);

        if self.options.add_md5 {
            text = with_checksum(&text, newline);
        }
        text.insert_str(0, doc.bom());

        Ok(Transcoded {
            text,
            already_converted: false,
            layers: events.len(),
            layer_mismatch,
        })
    }

    /// Convert a document, returning only the text.
    pub fn convert(&self, raw: &str) -> Result<String> {
        self.transcode(raw).map(|out| out.text)
    }
}

/// Convert a document with default options.
pub fn convert(raw: &str) -> Result<String> {
    Transcoder::default().convert(raw)
}

/// Prepend the `; MD5:` line. The checksum covers every byte after it.
pub fn with_checksum(text: &str, newline: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{MD5_PREFIX}{digest:x}{newline}{text}")
}
