//! Settings extracted from slicer comments.

use std::collections::HashMap;

/// A setting the transcoder understands.
///
/// This is the full set of keys the parser can produce and the encoder can
/// emit. Anything else found in the file is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    /// Slicer name and version line.
    Generator,
    /// Printer model the file was sliced for.
    PrinterModel,
    /// Total estimated print time.
    PrintTime,
    /// Total layer count.
    LayerCount,
    /// Filament length per extruder (mm).
    FilamentLength,
    /// Filament volume per extruder (cm³).
    FilamentVolume,
    /// Filament mass per extruder (g).
    FilamentWeight,
    /// Filament cost per extruder.
    FilamentCost,
    /// Total filament mass (g).
    TotalFilamentWeight,
    /// Total filament cost.
    TotalFilamentCost,
    /// Filament diameter per extruder (mm).
    FilamentDiameter,
    /// Filament density per extruder (g/cm³).
    FilamentDensity,
    /// Filament price per extruder (per kg).
    FilamentPrice,
    /// Filament material name per extruder.
    FilamentType,
    /// Layer height (mm).
    LayerHeight,
    /// Sparse infill density (percent).
    InfillDensity,
    /// Outer wall print speed (mm/s).
    PrintSpeed,
    /// Nozzle temperature per extruder (°C).
    NozzleTemperature,
    /// Bed temperature per extruder (°C).
    BedTemperature,
    /// Maximum Z height of the print (mm).
    MaxZHeight,
}

/// How a setting's raw text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Kept verbatim.
    Text,
    /// A single number.
    Number,
    /// A number with an optional trailing `%`.
    Percent,
    /// Comma or semicolon separated numbers, one per extruder.
    List,
    /// A duration, stored as whole seconds.
    Duration,
}

impl SettingKey {
    /// Every recognized key.
    pub const ALL: [SettingKey; 20] = [
        SettingKey::Generator,
        SettingKey::PrinterModel,
        SettingKey::PrintTime,
        SettingKey::LayerCount,
        SettingKey::FilamentLength,
        SettingKey::FilamentVolume,
        SettingKey::FilamentWeight,
        SettingKey::FilamentCost,
        SettingKey::TotalFilamentWeight,
        SettingKey::TotalFilamentCost,
        SettingKey::FilamentDiameter,
        SettingKey::FilamentDensity,
        SettingKey::FilamentPrice,
        SettingKey::FilamentType,
        SettingKey::LayerHeight,
        SettingKey::InfillDensity,
        SettingKey::PrintSpeed,
        SettingKey::NozzleTemperature,
        SettingKey::BedTemperature,
        SettingKey::MaxZHeight,
    ];

    /// The slicer token this key is best known by, used in error messages.
    pub fn source_token(&self) -> &'static str {
        match self {
            SettingKey::Generator => "generated by",
            SettingKey::PrinterModel => "printer_model",
            SettingKey::PrintTime => "estimated printing time (normal mode)",
            SettingKey::LayerCount => "total layer number",
            SettingKey::FilamentLength => "filament used [mm]",
            SettingKey::FilamentVolume => "filament used [cm3]",
            SettingKey::FilamentWeight => "filament used [g]",
            SettingKey::FilamentCost => "filament cost",
            SettingKey::TotalFilamentWeight => "total filament used [g]",
            SettingKey::TotalFilamentCost => "total filament cost",
            SettingKey::FilamentDiameter => "filament_diameter",
            SettingKey::FilamentDensity => "filament_density",
            SettingKey::FilamentPrice => "filament_cost",
            SettingKey::FilamentType => "filament_type",
            SettingKey::LayerHeight => "layer_height",
            SettingKey::InfillDensity => "sparse_infill_density",
            SettingKey::PrintSpeed => "outer_wall_speed",
            SettingKey::NozzleTemperature => "nozzle_temperature",
            SettingKey::BedTemperature => "hot_plate_temp",
            SettingKey::MaxZHeight => "max_z_height",
        }
    }

    /// How the raw text of this key is interpreted.
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingKey::Generator | SettingKey::PrinterModel | SettingKey::FilamentType => {
                ValueKind::Text
            }
            SettingKey::PrintTime => ValueKind::Duration,
            SettingKey::InfillDensity => ValueKind::Percent,
            SettingKey::LayerCount
            | SettingKey::TotalFilamentWeight
            | SettingKey::TotalFilamentCost
            | SettingKey::LayerHeight
            | SettingKey::PrintSpeed
            | SettingKey::MaxZHeight => ValueKind::Number,
            SettingKey::FilamentLength
            | SettingKey::FilamentVolume
            | SettingKey::FilamentWeight
            | SettingKey::FilamentCost
            | SettingKey::FilamentDiameter
            | SettingKey::FilamentDensity
            | SettingKey::FilamentPrice
            | SettingKey::NozzleTemperature
            | SettingKey::BedTemperature => ValueKind::List,
        }
    }
}

/// A setting value, raw or interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Raw or textual value.
    Text(String),
    /// Single number.
    Number(f64),
    /// One number per extruder.
    List(Vec<f64>),
    /// Whole seconds.
    Duration(u64),
}

impl SettingValue {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content. A single-element list counts as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            SettingValue::List(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    /// List content. A single number counts as a one-element list.
    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            SettingValue::List(values) => Some(values),
            SettingValue::Number(n) => Some(std::slice::from_ref(n)),
            _ => None,
        }
    }

    /// Duration in seconds.
    pub fn as_duration(&self) -> Option<u64> {
        match self {
            SettingValue::Duration(secs) => Some(*secs),
            _ => None,
        }
    }
}

/// Settings keyed by [`SettingKey`]. Inserting an existing key replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsMap {
    values: HashMap<SettingKey, SettingValue>,
}

impl SettingsMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous one.
    pub fn insert(&mut self, key: SettingKey, value: SettingValue) {
        self.values.insert(key, value);
    }

    /// Insert a raw text value.
    pub fn insert_raw(&mut self, key: SettingKey, raw: impl Into<String>) {
        self.insert(key, SettingValue::Text(raw.into()));
    }

    /// Look up a value.
    pub fn get(&self, key: SettingKey) -> Option<&SettingValue> {
        self.values.get(&key)
    }

    /// Remove a value.
    pub fn remove(&mut self, key: SettingKey) -> Option<SettingValue> {
        self.values.remove(&key)
    }

    /// Whether a value is present.
    pub fn contains(&self, key: SettingKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of a key.
    pub fn number(&self, key: SettingKey) -> Option<f64> {
        self.get(key).and_then(SettingValue::as_number)
    }

    /// List value of a key.
    pub fn list(&self, key: SettingKey) -> Option<&[f64]> {
        self.get(key).and_then(SettingValue::as_list)
    }

    /// Text value of a key.
    pub fn text(&self, key: SettingKey) -> Option<&str> {
        self.get(key).and_then(SettingValue::as_text)
    }

    /// Duration value of a key, in seconds.
    pub fn duration(&self, key: SettingKey) -> Option<u64> {
        self.get(key).and_then(SettingValue::as_duration)
    }

    /// Iterate over all entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &SettingValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}
