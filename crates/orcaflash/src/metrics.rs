//! Derived metrics: typed settings, filament usage and layer progress.
//!
//! Values keep full precision here. Rounding to the firmware's decimal places
//! happens only when the header is encoded.

use std::f64::consts::PI;

use tracing::{debug, info, warn};

use crate::duration::parse_duration;
use crate::error::{Result, TranscodeError};
use crate::material::MaterialTable;
use crate::settings::{SettingKey, SettingValue, SettingsMap, ValueKind};

/// Filament volume (cm³) for a length of filament.
pub fn filament_volume_cm3(length_mm: f64, diameter_mm: f64) -> f64 {
    let radius = diameter_mm / 2.0;
    length_mm * PI * radius * radius / 1000.0
}

/// Filament mass (g) for a volume.
pub fn filament_mass_g(volume_cm3: f64, density: f64) -> f64 {
    volume_cm3 * density
}

/// Filament cost for a mass, given a price per kilogram.
pub fn filament_cost(mass_g: f64, price_per_kg: f64) -> f64 {
    mass_g * price_per_kg / 1000.0
}

/// Turns raw slicer settings into typed values and fills in what the
/// firmware needs but the slicer left out.
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    materials: &'a MaterialTable,
}

impl<'a> Calculator<'a> {
    /// Create a calculator backed by a material table.
    pub fn new(materials: &'a MaterialTable) -> Self {
        Self { materials }
    }

    /// Interpret every raw value and derive filament volume, mass and cost.
    pub fn calculate(&self, raw: SettingsMap) -> Result<SettingsMap> {
        let mut settings = SettingsMap::new();
        // Fixed key order keeps the reported error stable when several
        // values are malformed.
        for key in SettingKey::ALL {
            if let Some(value) = raw.get(key) {
                settings.insert(key, interpret(key, value)?);
            }
        }

        if settings.duration(SettingKey::PrintTime).is_none() {
            return Err(TranscodeError::MissingMetadata {
                key: SettingKey::PrintTime.source_token(),
            });
        }

        self.derive_filament(&mut settings);
        Ok(settings)
    }

    fn derive_filament(&self, settings: &mut SettingsMap) {
        let Some(lengths) = settings.list(SettingKey::FilamentLength).map(<[f64]>::to_vec) else {
            debug!("no filament length in the file, skipping filament metrics");
            return;
        };

        let types: Vec<String> = settings
            .text(SettingKey::FilamentType)
            .map(|text| {
                text.split([';', ','])
                    .map(|t| t.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let fallback = self.materials.default_material();

        let count = lengths.len();
        let mut diameters = Vec::with_capacity(count);
        let mut densities = Vec::with_capacity(count);
        let mut volumes = Vec::with_capacity(count);
        let mut weights = Vec::with_capacity(count);
        let mut costs = Vec::with_capacity(count);

        for (extruder, &length) in lengths.iter().enumerate() {
            let material = types
                .get(extruder)
                .and_then(|name| self.materials.get(name))
                .copied();

            let diameter = per_extruder(settings, SettingKey::FilamentDiameter, extruder)
                .unwrap_or(self.materials.default_diameter);

            let density = match per_extruder(settings, SettingKey::FilamentDensity, extruder) {
                Some(density) => density,
                None => {
                    let density = material.unwrap_or(fallback).density;
                    info!(extruder, density, "filament density not in file, using material table");
                    density
                }
            };

            let price = per_extruder(settings, SettingKey::FilamentPrice, extruder)
                .or_else(|| material.map(|m| m.price_per_kg))
                .unwrap_or(0.0);
            let reported_cost = reported(settings, SettingKey::FilamentCost, extruder);
            if price <= 0.0 && reported_cost.is_none() {
                warn!(extruder, "filament is unpriced, reporting a cost of 0");
            }

            let volume = filament_volume_cm3(length, diameter);
            // A mass reported by the slicer beats our estimate for pricing.
            let weight = reported(settings, SettingKey::FilamentWeight, extruder)
                .unwrap_or_else(|| filament_mass_g(volume, density));
            diameters.push(diameter);
            densities.push(density);
            volumes.push(reported(settings, SettingKey::FilamentVolume, extruder).unwrap_or(volume));
            weights.push(weight);
            costs.push(reported_cost.unwrap_or_else(|| filament_cost(weight, price)));
        }

        debug!(?volumes, ?weights, ?costs, "derived filament usage");

        fill(settings, SettingKey::FilamentDiameter, diameters);
        fill(settings, SettingKey::FilamentDensity, densities);
        fill(settings, SettingKey::FilamentVolume, volumes);
        let weights_extended = fill(settings, SettingKey::FilamentWeight, weights);
        let costs_extended = fill(settings, SettingKey::FilamentCost, costs);

        fill_total(settings, SettingKey::TotalFilamentWeight, SettingKey::FilamentWeight, weights_extended);
        fill_total(settings, SettingKey::TotalFilamentCost, SettingKey::FilamentCost, costs_extended);
    }
}

/// Value for one extruder; a shorter list repeats its last entry.
fn per_extruder(settings: &SettingsMap, key: SettingKey, extruder: usize) -> Option<f64> {
    let values = settings.list(key)?;
    values.get(extruder).or_else(|| values.last()).copied()
}

/// Value the slicer reported for exactly this extruder.
fn reported(settings: &SettingsMap, key: SettingKey, extruder: usize) -> Option<f64> {
    settings.list(key)?.get(extruder).copied()
}

/// Store per-extruder values unless the slicer already gave one for every
/// extruder. Returns true when a shorter slicer list was extended.
fn fill(settings: &mut SettingsMap, key: SettingKey, values: Vec<f64>) -> bool {
    match settings.list(key).map(<[f64]>::len) {
        Some(len) if len >= values.len() => false,
        existing => {
            if existing.is_some() {
                debug!(key = key.source_token(), "slicer list is shorter than the extruder count");
            }
            settings.insert(key, SettingValue::List(values));
            existing.is_some()
        }
    }
}

/// Sum `parts` into `key` when the slicer gave no total, or when its total
/// missed extruders.
fn fill_total(settings: &mut SettingsMap, key: SettingKey, parts: SettingKey, stale: bool) {
    if stale || !settings.contains(key) {
        let total = settings.list(parts).map_or(0.0, |values| values.iter().sum());
        settings.insert(key, SettingValue::Number(total));
    }
}

/// Interpret a value according to its key's kind. Typed values pass through.
fn interpret(key: SettingKey, value: &SettingValue) -> Result<SettingValue> {
    let SettingValue::Text(raw) = value else {
        return Ok(value.clone());
    };
    let token = key.source_token();

    let typed = match key.kind() {
        ValueKind::Text => SettingValue::Text(raw.trim().to_string()),
        ValueKind::Number => SettingValue::Number(parse_number(token, raw)?),
        ValueKind::Percent => {
            let trimmed = raw.trim();
            let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
            SettingValue::Number(parse_number(token, number).map_err(|_| {
                TranscodeError::derivation(token, raw.as_str(), "not a percentage")
            })?)
        }
        ValueKind::List => {
            let values = raw
                .split([',', ';'])
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| parse_number(token, item))
                .collect::<Result<Vec<_>>>()
                .map_err(|_| TranscodeError::derivation(token, raw.as_str(), "not a list of numbers"))?;
            if values.is_empty() {
                return Err(TranscodeError::derivation(token, raw.as_str(), "empty list"));
            }
            SettingValue::List(values)
        }
        ValueKind::Duration => SettingValue::Duration(
            parse_duration(raw)
                .map_err(|e| TranscodeError::derivation(token, raw.as_str(), e.to_string()))?,
        ),
    };

    if key == SettingKey::LayerCount {
        if let SettingValue::Number(count) = typed {
            if count.fract() != 0.0 || count > f64::from(u32::MAX) {
                return Err(TranscodeError::derivation(
                    token,
                    raw.as_str(),
                    "layer count must be a whole number",
                ));
            }
        }
    }
    Ok(typed)
}

fn parse_number(token: &'static str, text: &str) -> Result<f64> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| TranscodeError::derivation(token, text, "not a number"))?;
    if !value.is_finite() {
        return Err(TranscodeError::derivation(token, text, "not a finite number"));
    }
    if value < 0.0 {
        return Err(TranscodeError::derivation(token, text, "must not be negative"));
    }
    Ok(value)
}

/// Progress estimate at the start of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerProgress {
    /// 1-based layer number.
    pub layer: u32,
    /// Total number of layers.
    pub total_layers: u32,
    /// Percentage of the print done when this layer starts.
    pub percent: u8,
    /// Estimated seconds left when this layer starts.
    pub remaining_secs: u64,
}

/// Estimate progress for each layer.
///
/// `hints` holds one entry per layer: the remaining time the slicer itself
/// wrote into that layer, if any. When every layer has a hint those are used;
/// otherwise the total time is spread evenly over the layers, which is a
/// coarse approximation rather than a physical estimate.
pub fn layer_progress(total_secs: u64, hints: &[Option<u64>]) -> Vec<LayerProgress> {
    let total_layers = hints.len() as u32;
    let use_hints = !hints.is_empty() && hints.iter().all(Option::is_some);
    if !use_hints && hints.iter().any(Option::is_some) {
        debug!("per-layer timing is incomplete, distributing time evenly");
    }

    hints
        .iter()
        .enumerate()
        .map(|(index, hint)| {
            let remaining_secs = match hint {
                Some(hint) if use_hints => (*hint).min(total_secs),
                _ => {
                    let layers_left = u128::from(total_layers - index as u32);
                    (u128::from(total_secs) * layers_left / u128::from(total_layers)) as u64
                }
            };
            let percent = if total_secs == 0 {
                (index as u64 * 100 / u64::from(total_layers)) as u8
            } else {
                (u128::from(total_secs - remaining_secs) * 100 / u128::from(total_secs)) as u8
            };
            LayerProgress {
                layer: index as u32 + 1,
                total_layers,
                percent,
                remaining_secs,
            }
        })
        .collect()
}
