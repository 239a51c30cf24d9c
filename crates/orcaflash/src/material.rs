//! Filament material table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Physical and price data for one filament material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Density (g/cm³).
    pub density: f64,
    /// Price per kilogram. Zero means unpriced.
    #[serde(default)]
    pub price_per_kg: f64,
}

impl Material {
    /// Material with the given density and no price.
    pub fn new(density: f64) -> Self {
        Self {
            density,
            price_per_kg: 0.0,
        }
    }
}

/// Fallback values used when the G-code does not state them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    /// Filament diameter (mm).
    pub default_diameter: f64,
    /// Material assumed when the file names none, or an unknown one.
    pub default_material: String,
    /// Materials keyed by name (`PLA`, `PETG`, ...).
    pub materials: BTreeMap<String, Material>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MaterialTable {
    /// Built-in table of common materials.
    pub fn builtin() -> Self {
        let materials = [
            ("PLA", 1.24),
            ("PETG", 1.27),
            ("ABS", 1.04),
            ("ASA", 1.07),
            ("TPU", 1.21),
            ("PA", 1.14),
            ("PC", 1.20),
            ("PVA", 1.23),
        ]
        .into_iter()
        .map(|(name, density)| (name.to_string(), Material::new(density)))
        .collect();

        Self {
            default_diameter: 1.75,
            default_material: "PLA".into(),
            materials,
        }
    }

    /// Parse a table from TOML.
    ///
    /// Missing top-level fields keep their built-in values; a `[materials]`
    /// section replaces the built-in materials entirely.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Look up a material by name, ignoring case. Slicer variants such as
    /// `PLA-CF` or `PETG HF` fall back to their base material.
    pub fn get(&self, name: &str) -> Option<&Material> {
        let name = name.trim();
        self.find(name).or_else(|| {
            let base = name.split(['-', ' ', '+']).next()?;
            self.find(base)
        })
    }

    /// The material used when nothing better is known.
    pub fn default_material(&self) -> Material {
        self.find(&self.default_material)
            .copied()
            .unwrap_or_else(|| Material::new(1.24))
    }

    fn find(&self, name: &str) -> Option<&Material> {
        self.materials
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, material)| material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin() {
        let table = MaterialTable::builtin();
        assert_eq!(table.default_diameter, 1.75);
        assert_eq!(table.get("PLA").map(|m| m.density), Some(1.24));
        assert_eq!(table.get("petg").map(|m| m.density), Some(1.27));
        for material in table.materials.values() {
            assert!(material.density > 0.0);
            assert_eq!(material.price_per_kg, 0.0);
        }
    }

    #[test]
    fn test_variant_falls_back_to_base() {
        let table = MaterialTable::builtin();
        assert_eq!(table.get("PLA-CF").map(|m| m.density), Some(1.24));
        assert_eq!(table.get("PETG HF").map(|m| m.density), Some(1.27));
        assert_eq!(table.get("NYLON"), None);
    }

    #[test]
    fn test_from_toml() {
        let table = MaterialTable::from_toml_str(
            r#"
            default_material = "PETG"

            [materials.PETG]
            density = 1.29
            price_per_kg = 25.0
            "#,
        )
        .unwrap();
        assert_eq!(table.default_diameter, 1.75);
        assert_eq!(table.materials.len(), 1);
        assert_eq!(
            table.default_material(),
            Material {
                density: 1.29,
                price_per_kg: 25.0
            }
        );
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        assert!(MaterialTable::from_toml_str("default_diameter = \"wide\"").is_err());
    }

    #[test]
    fn test_unknown_default_material() {
        let table = MaterialTable {
            default_material: "UNOBTAINIUM".into(),
            ..MaterialTable::builtin()
        };
        assert_eq!(table.default_material().density, 1.24);
    }
}
