//! Firmware header encoder.
//!
//! The firmware reads its header positionally, so the output order is fixed
//! by the static schedules below rather than by the order settings were
//! found. Supporting a new firmware field means adding one [`FieldSpec`].

use crate::dialect::{signature, HEADER_BLOCK_END, HEADER_BLOCK_START};
use crate::duration::format_duration;
use crate::error::{Result, TranscodeError};
use crate::settings::{SettingKey, SettingValue, SettingsMap};

/// How a value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Whole number.
    Count,
    /// Number with a fixed count of decimals.
    Fixed(usize),
    /// Per-extruder numbers with a fixed count of decimals, comma separated.
    List(usize),
    /// Whole percentage with a `%` suffix.
    Percent,
    /// Compound duration, `1h 2m 3s`.
    Duration,
    /// Duration as whole seconds.
    Seconds,
    /// Verbatim text.
    Text,
}

/// What to do when a field has no value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// Fail the conversion.
    Required,
    /// Write this value instead.
    Default(f64),
    /// Leave the line out.
    Optional,
}

/// One line of the firmware header.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Setting the value comes from.
    pub key: SettingKey,
    /// Firmware token, also used in error messages.
    pub token: &'static str,
    /// Text between the token and the value.
    pub separator: &'static str,
    /// Value format.
    pub format: Format,
    /// Behaviour when the value is absent.
    pub policy: Policy,
}

const fn field(
    key: SettingKey,
    token: &'static str,
    separator: &'static str,
    format: Format,
    policy: Policy,
) -> FieldSpec {
    FieldSpec {
        key,
        token,
        separator,
        format,
        policy,
    }
}

/// Fields inside `HEADER_BLOCK_START` / `HEADER_BLOCK_END`, in order.
#[rustfmt::skip]
pub const HEADER_FIELDS: &[FieldSpec] = &[
    field(SettingKey::Generator, "generated by", " ", Format::Text, Policy::Optional),
    field(SettingKey::LayerCount, "total layer number", ": ", Format::Count, Policy::Required),
    field(SettingKey::FilamentDiameter, "filament_diameter", ": ", Format::List(2), Policy::Required),
    field(SettingKey::FilamentDensity, "filament_density", ": ", Format::List(2), Policy::Required),
    field(SettingKey::MaxZHeight, "max_z_height", ": ", Format::Fixed(2), Policy::Optional),
];

/// Metadata fields written after the header block, in order.
#[rustfmt::skip]
pub const METADATA_FIELDS: &[FieldSpec] = &[
    field(SettingKey::FilamentLength, "filament used [mm]", " = ", Format::List(2), Policy::Required),
    field(SettingKey::FilamentVolume, "filament used [cm3]", " = ", Format::List(2), Policy::Required),
    field(SettingKey::FilamentWeight, "filament used [g]", " = ", Format::List(2), Policy::Required),
    field(SettingKey::FilamentCost, "filament cost", " = ", Format::List(2), Policy::Default(0.0)),
    field(SettingKey::TotalFilamentWeight, "total filament used [g]", " = ", Format::Fixed(2), Policy::Required),
    field(SettingKey::TotalFilamentCost, "total filament cost", " = ", Format::Fixed(2), Policy::Default(0.0)),
    field(SettingKey::LayerCount, "total layers count", " = ", Format::Count, Policy::Required),
    field(SettingKey::PrintTime, "estimated printing time (normal mode)", " = ", Format::Duration, Policy::Required),
    field(SettingKey::PrintTime, "estimated printing time (seconds)", " = ", Format::Seconds, Policy::Required),
    field(SettingKey::PrinterModel, "printer_model", " = ", Format::Text, Policy::Optional),
    field(SettingKey::FilamentType, "filament_type", " = ", Format::Text, Policy::Optional),
    field(SettingKey::LayerHeight, "layer_height", " = ", Format::Fixed(2), Policy::Optional),
    field(SettingKey::InfillDensity, "sparse_infill_density", " = ", Format::Percent, Policy::Optional),
    field(SettingKey::PrintSpeed, "outer_wall_speed", " = ", Format::Count, Policy::Optional),
    field(SettingKey::NozzleTemperature, "nozzle_temperature", " = ", Format::List(0), Policy::Optional),
    field(SettingKey::BedTemperature, "bed_temperature", " = ", Format::List(0), Policy::Optional),
];

/// Write a value, or `None` if it does not fit the format.
pub fn format_value(format: Format, value: &SettingValue) -> Option<String> {
    match format {
        Format::Count => value.as_number().map(|n| format!("{n:.0}")),
        Format::Fixed(decimals) => value.as_number().map(|n| format!("{n:.decimals$}")),
        Format::List(decimals) => value.as_list().map(|values| {
            values
                .iter()
                .map(|n| format!("{n:.decimals$}"))
                .collect::<Vec<_>>()
                .join(", ")
        }),
        Format::Percent => value.as_number().map(|n| format!("{n:.0}%")),
        Format::Duration => value.as_duration().map(format_duration),
        Format::Seconds => value.as_duration().map(|secs| secs.to_string()),
        Format::Text => value.as_text().map(str::to_string),
    }
}

impl FieldSpec {
    /// Render this field's line, `Ok(None)` when an optional field is absent.
    pub fn encode(&self, settings: &SettingsMap) -> Result<Option<String>> {
        let formatted = settings
            .get(self.key)
            .and_then(|value| format_value(self.format, value));

        let value = match (formatted, self.policy) {
            (Some(value), _) => value,
            (None, Policy::Default(default)) => {
                format_value(self.format, &SettingValue::Number(default)).unwrap_or_default()
            }
            (None, Policy::Optional) => return Ok(None),
            (None, Policy::Required) => return Err(TranscodeError::Encoding { field: self.token }),
        };
        Ok(Some(format!("; {}{}{}", self.token, self.separator, value)))
    }
}

fn encode_fields(fields: &[FieldSpec], settings: &SettingsMap, out: &mut Vec<String>) -> Result<()> {
    for spec in fields {
        if let Some(line) = spec.encode(settings)? {
            out.push(line);
        }
    }
    Ok(())
}

/// Encode the firmware header: the header block, a blank line, then the
/// metadata block. Lines carry no terminators.
pub fn encode_header(settings: &SettingsMap) -> Result<Vec<String>> {
    let mut lines = vec![HEADER_BLOCK_START.to_string()];
    encode_fields(HEADER_FIELDS, settings, &mut lines)?;
    lines.push(signature());
    lines.push(HEADER_BLOCK_END.to_string());
    lines.push(String::new());
    encode_fields(METADATA_FIELDS, settings, &mut lines)?;
    Ok(lines)
}
