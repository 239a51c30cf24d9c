//! Comment tokens of the slicer and firmware dialects.

/// First line of the header block.
pub const HEADER_BLOCK_START: &str = "; HEADER_BLOCK_START";
/// Last line of the header block.
pub const HEADER_BLOCK_END: &str = "; HEADER_BLOCK_END";
/// Prefix of the checksum line some firmwares expect at the top of the file.
pub const MD5_PREFIX: &str = "; MD5:";
/// Header line marking a file already in the firmware dialect.
pub const SIGNATURE_PREFIX: &str = "; postprocessed by orcaflash";

/// Prefix of the "current layer / total layers" annotation.
pub const LAYER_NUMBER_PREFIX: &str = "; layer num/total_layer_count:";
/// Prefix of the progress annotation that follows the layer number.
pub const LAYER_PROGRESS_PREFIX: &str = "; print progress:";

/// The signature line written into converted headers.
pub fn signature() -> String {
    format!("{} {}", SIGNATURE_PREFIX, env!("CARGO_PKG_VERSION"))
}

/// Layer change marker (slicer dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerMarker {
    /// `; CHANGE_LAYER`, written by OrcaSlicer.
    #[default]
    ChangeLayer,
    /// `;LAYER_CHANGE`, written in the classic (PrusaSlicer-derived) mode.
    LayerChange,
}

impl LayerMarker {
    /// Canonical text of this marker.
    pub fn token(&self) -> &'static str {
        match self {
            LayerMarker::ChangeLayer => "; CHANGE_LAYER",
            LayerMarker::LayerChange => ";LAYER_CHANGE",
        }
    }

    /// Recognize a marker line. Spacing after `;` and trailing whitespace
    /// are not significant.
    pub fn from_line(line: &str) -> Option<Self> {
        match comment_body(line)? {
            "CHANGE_LAYER" => Some(LayerMarker::ChangeLayer),
            "LAYER_CHANGE" => Some(LayerMarker::LayerChange),
            _ => None,
        }
    }
}

/// Text of a comment line after the `;` marker, trimmed.
///
/// Returns `None` for lines that are not pure comments.
pub fn comment_body(line: &str) -> Option<&str> {
    line.trim().strip_prefix(';').map(str::trim)
}

/// Whether the line is a G-code command (not blank, not a comment).
pub fn is_command(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with(';')
}

/// Whether the line is one of the annotations written after a layer marker.
pub fn is_layer_annotation(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(LAYER_NUMBER_PREFIX) || trimmed.starts_with(LAYER_PROGRESS_PREFIX)
}

/// Whether the line opens or closes the header block.
pub fn is_header_start(line: &str) -> bool {
    comment_body(line) == Some("HEADER_BLOCK_START")
}

/// See [`is_header_start`].
pub fn is_header_end(line: &str) -> bool {
    comment_body(line) == Some("HEADER_BLOCK_END")
}

/// Read the remaining-time parameter (`R`, minutes) of an `M73` progress
/// command, in seconds.
pub fn m73_remaining_seconds(line: &str) -> Option<u64> {
    let code = line.split(';').next()?.trim();
    let mut words = code.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("M73") {
        return None;
    }
    words
        .find_map(|w| w.strip_prefix('R').or_else(|| w.strip_prefix('r')))
        .and_then(|minutes| minutes.parse::<u64>().ok())
        .and_then(|minutes| minutes.checked_mul(60))
}
