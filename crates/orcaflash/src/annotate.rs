//! Layer marker annotator.

use tracing::{debug, warn};

use crate::dialect::{self, LayerMarker, LAYER_NUMBER_PREFIX, LAYER_PROGRESS_PREFIX};
use crate::document::Document;
use crate::duration::format_duration;
use crate::metrics::LayerProgress;

/// A layer change found in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerEvent {
    /// Line index of the marker.
    pub line: usize,
    /// 1-based layer number.
    pub layer: u32,
    /// Remaining time the slicer wrote inside this layer (`M73 R`), seconds.
    pub remaining_hint: Option<u64>,
}

/// Declared and scanned layer counts that disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerCountMismatch {
    /// Count stated in the header/footer.
    pub declared: u32,
    /// Markers actually found.
    pub scanned: u32,
}

/// Find every layer marker from `start` onwards, numbering them from 1.
///
/// Only the marker style seen first counts. Files that carry both styles
/// write one of each per layer, and the other style is copied as a plain
/// comment.
pub fn scan_layers(doc: &Document<'_>, start: usize) -> Vec<LayerEvent> {
    let mut events: Vec<LayerEvent> = Vec::new();
    let mut style: Option<LayerMarker> = None;
    let mut ignored = 0usize;
    for index in start..doc.len() {
        let line = doc.line(index);
        if let Some(marker) = LayerMarker::from_line(line) {
            if *style.get_or_insert(marker) != marker {
                ignored += 1;
                continue;
            }
            events.push(LayerEvent {
                line: index,
                layer: events.len() as u32 + 1,
                remaining_hint: None,
            });
        } else if let Some(event) = events.last_mut().filter(|e| e.remaining_hint.is_none()) {
            event.remaining_hint = dialect::m73_remaining_seconds(line);
        }
    }
    debug!(layers = events.len(), ignored, ?style, "scanned layer markers");
    events
}

/// Compare the declared layer count with the scanned one.
///
/// A mismatch is not fatal; it is logged and returned so the caller can
/// carry on with the scanned count.
pub fn check_layer_count(declared: u32, scanned: usize) -> Option<LayerCountMismatch> {
    let scanned = scanned as u32;
    if declared == scanned {
        return None;
    }
    warn!(
        declared,
        scanned,
        "declared layer count does not match the layer markers found, using the scanned count"
    );
    Some(LayerCountMismatch { declared, scanned })
}

/// The two comment lines written after a layer marker.
pub fn annotation_lines(progress: &LayerProgress) -> [String; 2] {
    [
        format!(
            "{} {}/{}",
            LAYER_NUMBER_PREFIX, progress.layer, progress.total_layers
        ),
        format!(
            "{} {}%, remaining time: {}",
            LAYER_PROGRESS_PREFIX,
            progress.percent,
            format_duration(progress.remaining_secs)
        ),
    ]
}

/// Copy the body from `start` into `out`, adding the progress annotation
/// after each marker.
///
/// Annotation lines already sitting right after a marker are replaced rather
/// than duplicated. Every other line is copied byte for byte.
pub fn annotate(
    doc: &Document<'_>,
    start: usize,
    events: &[LayerEvent],
    progress: &[LayerProgress],
    out: &mut String,
) {
    let newline = doc.newline();
    let mut pending = events.iter().zip(progress).peekable();
    let mut index = start;

    while index < doc.len() {
        let raw = doc.raw(index);
        out.push_str(raw);
        index += 1;

        let Some((_, layer)) = pending.next_if(|(event, _)| event.line == index - 1) else {
            continue;
        };
        if !raw.ends_with('\n') {
            out.push_str(newline);
        }
        for line in annotation_lines(layer) {
            out.push_str(&line);
            out.push_str(newline);
        }
        while index < doc.len() && dialect::is_layer_annotation(doc.line(index)) {
            index += 1;
        }
    }
}
