//! # Unit Catalog & Converter
//!
//! Measurement units grouped into conversion classes, and the pure functions
//! that convert quantities between them.
//!
//! ## Conversion Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every unit stores ONE factor: how many base units it is worth.         │
//! │                                                                         │
//! │   VOLUME (base: ml)                                                     │
//! │     ml ── 1        cl ── 10        l ── 1000        gal ── 3785.41…     │
//! │                                                                         │
//! │   200 ml → l :   200 × factor(ml) / factor(l)                          │
//! │              =   200 × 1 / 1000  =  0.2 l                              │
//! │                                                                         │
//! │   kg → l     :   different classes → no conversion (None)              │
//! │   l  → l     :   identity, quantity returned untouched                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Catalog Lifetime
//! The standard catalog is built once per process and shared behind an
//! `Arc`. Units never change after registration, so no locking is needed.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ParseVariantError, UnitError};
use crate::{MIN_FRACTIONAL_QUANTITY, MIN_WHOLE_QUANTITY};

// =============================================================================
// Conversion Class
// =============================================================================

/// Group of units that can be converted among each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionClass {
    /// Base unit: gram.
    Mass,
    /// Base unit: milliliter.
    Volume,
    /// Base unit: single piece.
    Count,
    /// Base unit: centimeter.
    Length,
}

impl fmt::Display for ConversionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionClass::Mass => write!(f, "mass"),
            ConversionClass::Volume => write!(f, "volume"),
            ConversionClass::Count => write!(f, "count"),
            ConversionClass::Length => write!(f, "length"),
        }
    }
}

impl FromStr for ConversionClass {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mass" | "weight" => Ok(ConversionClass::Mass),
            "volume" => Ok(ConversionClass::Volume),
            "count" | "piece" => Ok(ConversionClass::Count),
            "length" => Ok(ConversionClass::Length),
            _ => Err(ParseVariantError::new("conversion class", s)),
        }
    }
}

// =============================================================================
// Unit
// =============================================================================

/// A registered measurement unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Unique key, e.g. `"kg"`.
    pub short_name: String,

    /// Human-readable name, e.g. `"Kilogram"`.
    pub display_name: String,

    pub conversion_class: ConversionClass,

    /// How many base units of `conversion_class` one of this unit is worth.
    pub factor_to_base: f64,

    /// Whether quantities like 0.25 are meaningful (kg yes, pcs no).
    pub allows_fractional: bool,
}

impl Unit {
    pub fn new(
        short_name: impl Into<String>,
        display_name: impl Into<String>,
        conversion_class: ConversionClass,
        factor_to_base: f64,
        allows_fractional: bool,
    ) -> Self {
        Unit {
            short_name: short_name.into(),
            display_name: display_name.into(),
            conversion_class,
            factor_to_base,
            allows_fractional,
        }
    }

    /// Smallest quantity a line in this unit can be decremented to.
    #[inline]
    pub fn minimum_quantity(&self) -> f64 {
        if self.allows_fractional {
            MIN_FRACTIONAL_QUANTITY
        } else {
            MIN_WHOLE_QUANTITY
        }
    }

    /// Applies the quantity-step rules of this unit.
    ///
    /// ## Rules
    /// - Whole-number units: round to nearest integer, floor at 1
    /// - Fractional units: floor at 0.01
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::units::UnitCatalog;
    ///
    /// let catalog = UnitCatalog::standard();
    /// let pcs = catalog.get("pcs").unwrap();
    /// assert_eq!(pcs.clamp_quantity(0.0), 1.0);
    /// assert_eq!(pcs.clamp_quantity(2.6), 3.0);
    ///
    /// let kg = catalog.get("kg").unwrap();
    /// assert_eq!(kg.clamp_quantity(-0.5), 0.01);
    /// ```
    pub fn clamp_quantity(&self, quantity: f64) -> f64 {
        if self.allows_fractional {
            quantity.max(MIN_FRACTIONAL_QUANTITY)
        } else {
            quantity.round().max(MIN_WHOLE_QUANTITY)
        }
    }

    /// Whether `quantity` is a valid step for this unit.
    #[inline]
    pub fn accepts_quantity(&self, quantity: f64) -> bool {
        self.allows_fractional || quantity.fract() == 0.0
    }
}

// =============================================================================
// Unit Catalog
// =============================================================================

/// Registry of units, indexed by short name.
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl UnitCatalog {
    /// Returns the process-wide standard catalog (built on first use).
    pub fn standard() -> Arc<UnitCatalog> {
        static STANDARD: OnceLock<Arc<UnitCatalog>> = OnceLock::new();
        STANDARD
            .get_or_init(|| Arc::new(UnitCatalog::from_trusted(standard_units())))
            .clone()
    }

    /// Starts an empty catalog for stores that define their own units.
    pub fn builder() -> UnitCatalogBuilder {
        UnitCatalogBuilder::default()
    }

    fn from_trusted(units: Vec<Unit>) -> Self {
        let index = units
            .iter()
            .enumerate()
            .map(|(i, unit)| (unit.short_name.clone(), i))
            .collect();
        UnitCatalog { units, index }
    }

    /// Looks up a unit by short name (case-sensitive).
    pub fn get(&self, short_name: &str) -> Option<&Unit> {
        self.index.get(short_name).map(|&i| &self.units[i])
    }

    /// All units in registration order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// True iff both units exist and share a conversion class.
    pub fn can_convert(&self, from: &str, to: &str) -> bool {
        match (self.get(from), self.get(to)) {
            (Some(a), Some(b)) => a.conversion_class == b.conversion_class,
            _ => false,
        }
    }

    /// Converts `quantity` from one unit into another.
    ///
    /// Returns `None` when the units cannot be converted. Converting a unit
    /// to itself returns `quantity` exactly, without passing through the base.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::units::UnitCatalog;
    ///
    /// let catalog = UnitCatalog::standard();
    /// assert_eq!(catalog.convert(200.0, "ml", "l"), Some(0.2));
    /// assert_eq!(catalog.convert(1.5, "kg", "kg"), Some(1.5));
    /// assert_eq!(catalog.convert(1.0, "kg", "l"), None);
    /// ```
    pub fn convert(&self, quantity: f64, from: &str, to: &str) -> Option<f64> {
        let from_unit = self.get(from)?;
        if from == to {
            return Some(quantity);
        }

        let to_unit = self.get(to)?;
        if from_unit.conversion_class != to_unit.conversion_class {
            return None;
        }

        Some(quantity * from_unit.factor_to_base / to_unit.factor_to_base)
    }

    /// Units a product stocked in `unit` can be sold in (including itself).
    pub fn compatible_units(&self, unit: &str) -> Vec<&Unit> {
        let Some(class) = self.get(unit).map(|u| u.conversion_class) else {
            return Vec::new();
        };
        self.units
            .iter()
            .filter(|u| u.conversion_class == class)
            .collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects units and validates them into a [`UnitCatalog`].
#[derive(Debug, Default)]
pub struct UnitCatalogBuilder {
    units: Vec<Unit>,
}

impl UnitCatalogBuilder {
    pub fn unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Adds every unit of the standard catalog.
    pub fn with_standard_units(mut self) -> Self {
        self.units.extend(standard_units());
        self
    }

    /// Validates and freezes the catalog.
    ///
    /// ## Rules
    /// - Short names are non-empty and unique
    /// - Factors are finite and strictly positive
    pub fn build(self) -> Result<UnitCatalog, UnitError> {
        let mut seen = HashMap::with_capacity(self.units.len());

        for unit in &self.units {
            if unit.short_name.trim().is_empty() {
                return Err(UnitError::MissingShortName);
            }
            if !unit.factor_to_base.is_finite() || unit.factor_to_base <= 0.0 {
                return Err(UnitError::InvalidFactor {
                    short_name: unit.short_name.clone(),
                    factor: unit.factor_to_base,
                });
            }
            if seen.insert(unit.short_name.as_str(), ()).is_some() {
                return Err(UnitError::DuplicateUnit(unit.short_name.clone()));
            }
        }

        Ok(UnitCatalog::from_trusted(self.units))
    }
}

// =============================================================================
// Standard Units
// =============================================================================

fn standard_units() -> Vec<Unit> {
    use ConversionClass::*;

    vec![
        // Mass (base: g)
        Unit::new("mg", "Milligram", Mass, 0.001, true),
        Unit::new("g", "Gram", Mass, 1.0, true),
        Unit::new("kg", "Kilogram", Mass, 1000.0, true),
        Unit::new("oz", "Ounce", Mass, 28.349523125, true),
        Unit::new("lb", "Pound", Mass, 453.59237, true),
        // Volume (base: ml)
        Unit::new("ml", "Milliliter", Volume, 1.0, true),
        Unit::new("cl", "Centiliter", Volume, 10.0, true),
        Unit::new("l", "Liter", Volume, 1000.0, true),
        Unit::new("gal", "Gallon", Volume, 3785.411784, true),
        // Count (base: pcs)
        Unit::new("pcs", "Piece", Count, 1.0, false),
        Unit::new("pair", "Pair", Count, 2.0, false),
        Unit::new("dozen", "Dozen", Count, 12.0, false),
        // Length (base: cm)
        Unit::new("mm", "Millimeter", Length, 0.1, true),
        Unit::new("cm", "Centimeter", Length, 1.0, true),
        Unit::new("m", "Meter", Length, 100.0, true),
        Unit::new("in", "Inch", Length, 2.54, true),
        Unit::new("ft", "Foot", Length, 30.48, true),
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================
