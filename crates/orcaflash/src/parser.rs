//! Comment grammar parser for OrcaSlicer metadata.
//!
//! The grammar is an allow-list: a line contributes a setting only if it
//! matches one of the rules in [`RULES`]. Everything else, including comments
//! that look similar, is ignored so format drift in the slicer cannot leak
//! garbage into the firmware header.

use tracing::debug;

use crate::dialect::comment_body;
use crate::document::Document;
use crate::error::{Result, TranscodeError};
use crate::settings::{SettingKey, SettingsMap};

/// One recognized line shape.
struct Rule {
    /// Text the comment body must start with.
    token: &'static str,
    key: SettingKey,
    /// Pulls the value out of whatever follows the token.
    extract: fn(&str) -> Option<&str>,
}

/// Keys that must be present for a conversion to go ahead.
const MANDATORY: [SettingKey; 2] = [SettingKey::PrintTime, SettingKey::LayerCount];

#[rustfmt::skip]
const RULES: &[Rule] = &[
    Rule { token: "generated by", key: SettingKey::Generator, extract: free_text },
    Rule { token: "total layer number", key: SettingKey::LayerCount, extract: assignment },
    Rule { token: "total layers count", key: SettingKey::LayerCount, extract: assignment },
    Rule { token: "estimated printing time (normal mode)", key: SettingKey::PrintTime, extract: assignment },
    Rule { token: "model printing time", key: SettingKey::PrintTime, extract: total_estimated_time },
    Rule { token: "filament used [mm]", key: SettingKey::FilamentLength, extract: assignment },
    Rule { token: "filament used [cm3]", key: SettingKey::FilamentVolume, extract: assignment },
    Rule { token: "filament used [g]", key: SettingKey::FilamentWeight, extract: assignment },
    Rule { token: "filament cost", key: SettingKey::FilamentCost, extract: assignment },
    Rule { token: "total filament used [g]", key: SettingKey::TotalFilamentWeight, extract: assignment },
    Rule { token: "total filament cost", key: SettingKey::TotalFilamentCost, extract: assignment },
    Rule { token: "filament_diameter", key: SettingKey::FilamentDiameter, extract: assignment },
    Rule { token: "filament_density", key: SettingKey::FilamentDensity, extract: assignment },
    Rule { token: "filament_cost", key: SettingKey::FilamentPrice, extract: assignment },
    Rule { token: "filament_type", key: SettingKey::FilamentType, extract: assignment },
    Rule { token: "layer_height", key: SettingKey::LayerHeight, extract: assignment },
    Rule { token: "sparse_infill_density", key: SettingKey::InfillDensity, extract: assignment },
    Rule { token: "fill_density", key: SettingKey::InfillDensity, extract: assignment },
    Rule { token: "outer_wall_speed", key: SettingKey::PrintSpeed, extract: assignment },
    Rule { token: "nozzle_temperature", key: SettingKey::NozzleTemperature, extract: assignment },
    Rule { token: "hot_plate_temp", key: SettingKey::BedTemperature, extract: assignment },
    Rule { token: "bed_temperature", key: SettingKey::BedTemperature, extract: assignment },
    Rule { token: "max_z_height", key: SettingKey::MaxZHeight, extract: assignment },
    Rule { token: "printer_model", key: SettingKey::PrinterModel, extract: assignment },
];

/// `= value` or `: value`.
fn assignment(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let value = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))?
        .trim();
    (!value.is_empty()).then_some(value)
}

/// Anything after at least one space.
fn free_text(rest: &str) -> Option<&str> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let value = rest.trim();
    (!value.is_empty()).then_some(value)
}

/// `: <model time>; total estimated time: <total>` keeps the total.
fn total_estimated_time(rest: &str) -> Option<&str> {
    let (_, total) = rest.split_once("total estimated time")?;
    assignment(total.split(';').next()?)
}

/// Match a single line against the grammar.
pub fn parse_line(line: &str) -> Option<(SettingKey, &str)> {
    let body = comment_body(line)?;
    RULES.iter().find_map(|rule| {
        let rest = body.strip_prefix(rule.token)?;
        (rule.extract)(rest).map(|value| (rule.key, value))
    })
}

/// Collect every recognized setting from the document.
///
/// Later occurrences replace earlier ones: the slicer restates several values
/// in the footer with their final figures.
pub fn parse(doc: &Document<'_>) -> Result<SettingsMap> {
    let mut settings = SettingsMap::new();
    for line in doc.lines() {
        if let Some((key, value)) = parse_line(line) {
            settings.insert_raw(key, value);
        }
    }
    debug!(count = settings.len(), "parsed slicer settings");

    for key in MANDATORY {
        if !settings.contains(key) {
            return Err(TranscodeError::MissingMetadata {
                key: key.source_token(),
            });
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_forms() {
        assert_eq!(
            parse_line("; total layer number: 50"),
            Some((SettingKey::LayerCount, "50"))
        );
        assert_eq!(
            parse_line("; total layers count = 50"),
            Some((SettingKey::LayerCount, "50"))
        );
        assert_eq!(
            parse_line("; estimated printing time (normal mode) = 1h 2m 3s"),
            Some((SettingKey::PrintTime, "1h 2m 3s"))
        );
        assert_eq!(
            parse_line("; filament used [mm] = 1000.00, 20.50"),
            Some((SettingKey::FilamentLength, "1000.00, 20.50"))
        );
        assert_eq!(
            parse_line(";filament_cost = 24.99"),
            Some((SettingKey::FilamentPrice, "24.99"))
        );
        assert_eq!(
            parse_line("; filament cost = 0.12"),
            Some((SettingKey::FilamentCost, "0.12"))
        );
    }

    #[test]
    fn test_special_forms() {
        assert_eq!(
            parse_line("; generated by OrcaSlicer 2.2.0 on 2024-11-20 at 10:15:30"),
            Some((SettingKey::Generator, "OrcaSlicer 2.2.0 on 2024-11-20 at 10:15:30"))
        );
        assert_eq!(
            parse_line("; model printing time: 58m 1s; total estimated time: 1h 2m 3s"),
            Some((SettingKey::PrintTime, "1h 2m 3s"))
        );
    }

    #[test]
    fn test_unrecognized_lines_ignored() {
        assert_eq!(parse_line("; nozzle_temperature_initial_layer = 220"), None);
        assert_eq!(parse_line("; LAYER_HEIGHT: 0.2"), None);
        assert_eq!(parse_line("; layer_height ="), None);
        assert_eq!(parse_line("G1 X10 ; layer_height = 0.2"), None);
        assert_eq!(parse_line("; generatedby nobody"), None);
        assert_eq!(parse_line("; FEATURE: Outer wall"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let doc = Document::new(
            "; HEADER_BLOCK_START\n; total layer number: 10\n; HEADER_BLOCK_END\nG28\n\
             ; estimated printing time (normal mode) = 1h\n\
             ; estimated printing time (normal mode) = 1h 2m 3s\n\
             ; total layers count = 12\n",
        );
        let settings = parse(&doc).unwrap();
        assert_eq!(settings.text(SettingKey::PrintTime), Some("1h 2m 3s"));
        assert_eq!(settings.text(SettingKey::LayerCount), Some("12"));
    }

    #[test]
    fn test_missing_duration() {
        let doc = Document::new("; total layer number: 10\nG28\n");
        assert_eq!(
            parse(&doc),
            Err(TranscodeError::MissingMetadata {
                key: "estimated printing time (normal mode)"
            })
        );
    }

    #[test]
    fn test_missing_layer_count() {
        let doc = Document::new("G28\n; estimated printing time (normal mode) = 5m\n");
        assert_eq!(
            parse(&doc),
            Err(TranscodeError::MissingMetadata {
                key: "total layer number"
            })
        );
    }
}
