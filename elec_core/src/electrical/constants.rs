//! # Electrical Constants
//!
//! Physical constants and reference tables for low-voltage installation
//! design (IEC 60364 conventions). Everything here is compiled in and
//! read-only: scalar constants, `const` arrays, and exhaustive `match`
//! tables on enums.
//!
//! ## Reference values
//!
//! | Quantity                      | Copper  | Aluminum |
//! |-------------------------------|---------|----------|
//! | Resistivity at 20 °C (Ω·mm²/m) | 0.01724 | 0.02826  |
//! | Temperature coefficient (/°C) | 0.00393 | 0.00403  |

use serde::{Deserialize, Serialize};

// ============================================================================
// Conductor properties
// ============================================================================

/// Copper resistivity at 20 °C (Ω·mm²/m)
pub const COPPER_RESISTIVITY_20C: f64 = 0.01724;

/// Aluminum resistivity at 20 °C (Ω·mm²/m)
pub const ALUMINUM_RESISTIVITY_20C: f64 = 0.02826;

/// Copper temperature coefficient of resistance (/°C)
pub const COPPER_TEMPERATURE_COEFFICIENT: f64 = 0.00393;

/// Aluminum temperature coefficient of resistance (/°C)
pub const ALUMINUM_TEMPERATURE_COEFFICIENT: f64 = 0.00403;

/// Reference temperature for tabulated resistivities (°C)
pub const REFERENCE_TEMPERATURE_C: f64 = 20.0;

/// Standard conductor cross-sections (mm²)
pub const STANDARD_SECTIONS_MM2: [f64; 18] = [
    1.5, 2.5, 4.0, 6.0, 10.0, 16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0, 300.0,
    400.0, 500.0,
];

// ============================================================================
// System voltages
// ============================================================================

/// Phase-to-neutral voltage (V)
pub const PHASE_VOLTAGE: f64 = 220.0;

/// Line-to-line voltage of a three-phase system (V)
pub const LINE_VOLTAGE: f64 = 380.0;

/// Power factor assumed when nothing better is known
pub const DEFAULT_POWER_FACTOR: f64 = 0.92;

// ============================================================================
// Validation limits
// ============================================================================

/// Upper practical limit for distribution voltages (V)
pub const MAX_DISTRIBUTION_VOLTAGE: f64 = 50_000.0;

/// Upper practical limit for load currents (A)
pub const MAX_LOAD_CURRENT: f64 = 10_000.0;

/// Lowest accepted power factor
pub const MIN_POWER_FACTOR: f64 = 0.1;

/// Operating temperature range (°C)
pub const MIN_TEMPERATURE_C: f64 = -40.0;
pub const MAX_TEMPERATURE_C: f64 = 120.0;

// ============================================================================
// Typical power factors
// ============================================================================

/// Load nature, used to look up a typical power factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadNature {
    ResistiveLoad,
    Incandescent,
    Fluorescent,
    LedLighting,
    SmallMotors,
    LargeMotors,
    AirConditioning,
    MixedLoads,
    OutletsGeneral,
    OfficeEquipment,
}

impl LoadNature {
    pub const ALL: [LoadNature; 10] = [
        LoadNature::ResistiveLoad,
        LoadNature::Incandescent,
        LoadNature::Fluorescent,
        LoadNature::LedLighting,
        LoadNature::SmallMotors,
        LoadNature::LargeMotors,
        LoadNature::AirConditioning,
        LoadNature::MixedLoads,
        LoadNature::OutletsGeneral,
        LoadNature::OfficeEquipment,
    ];

    /// Typical cos φ for this kind of load
    pub fn typical_power_factor(&self) -> f64 {
        match self {
            LoadNature::ResistiveLoad => 1.00,
            LoadNature::Incandescent => 1.00,
            LoadNature::Fluorescent => 0.95, // with correction
            LoadNature::LedLighting => 0.95,
            LoadNature::SmallMotors => 0.80,
            LoadNature::LargeMotors => 0.85,
            LoadNature::AirConditioning => 0.75,
            LoadNature::MixedLoads => 0.92,
            LoadNature::OutletsGeneral => 0.85,
            LoadNature::OfficeEquipment => 0.88,
        }
    }
}

// ============================================================================
// Voltage-drop limits (IEC 60364-5-52)
// ============================================================================

/// Circuit duty for the general voltage-drop limit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitDuty {
    Lighting,
    PowerOutlets,
    Motors,
    MainFeeders,
    EmergencyCircuits,
}

impl CircuitDuty {
    pub const ALL: [CircuitDuty; 5] = [
        CircuitDuty::Lighting,
        CircuitDuty::PowerOutlets,
        CircuitDuty::Motors,
        CircuitDuty::MainFeeders,
        CircuitDuty::EmergencyCircuits,
    ];

    /// Maximum voltage drop (%)
    pub fn voltage_drop_limit_pct(&self) -> f64 {
        match self {
            CircuitDuty::Lighting => 3.0,
            CircuitDuty::PowerOutlets => 5.0,
            CircuitDuty::Motors => 5.0,
            CircuitDuty::MainFeeders => 1.0,
            CircuitDuty::EmergencyCircuits => 2.0,
        }
    }
}

// ============================================================================
// Demand factors by building type
// ============================================================================

/// Building type for the general demand-factor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Residential,
    Office,
    Industrial,
}

impl BuildingType {
    pub const ALL: [BuildingType; 3] = [
        BuildingType::Residential,
        BuildingType::Office,
        BuildingType::Industrial,
    ];

    /// Demand factors keyed by load use
    pub fn demand_factors(&self) -> &'static [(&'static str, f64)] {
        match self {
            BuildingType::Residential => &[
                ("lighting", 0.75),
                ("outlets", 0.50),
                ("air_conditioning", 0.80),
                ("kitchen", 0.75),
            ],
            BuildingType::Office => &[
                ("lighting", 0.90),
                ("outlets", 0.60),
                ("air_conditioning", 0.85),
                ("equipment", 0.70),
            ],
            BuildingType::Industrial => &[
                ("lighting", 0.95),
                ("power_outlets", 0.70),
                ("motors", 0.80),
                ("welding", 0.60),
            ],
        }
    }

    /// Demand factor for one load use, if tabulated for this building type
    pub fn demand_factor(&self, load_use: &str) -> Option<f64> {
        self.demand_factors()
            .iter()
            .find(|(name, _)| *name == load_use)
            .map(|(_, factor)| *factor)
    }
}

// ============================================================================
// Insulation temperature limits
// ============================================================================

/// Conductor insulation material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulationType {
    Pvc,
    Xlpe,
    Epr,
    Paper,
}

impl InsulationType {
    pub const ALL: [InsulationType; 4] = [
        InsulationType::Pvc,
        InsulationType::Xlpe,
        InsulationType::Epr,
        InsulationType::Paper,
    ];

    /// Maximum continuous conductor temperature (°C)
    pub fn max_temperature_c(&self) -> f64 {
        match self {
            InsulationType::Pvc => 70.0,
            InsulationType::Xlpe => 90.0,
            InsulationType::Epr => 90.0,
            InsulationType::Paper => 85.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sections_sorted() {
        assert!(STANDARD_SECTIONS_MM2.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_power_factors_in_range() {
        for nature in LoadNature::ALL {
            let pf = nature.typical_power_factor();
            assert!((MIN_POWER_FACTOR..=1.0).contains(&pf));
        }
        assert_eq!(LoadNature::MixedLoads.typical_power_factor(), DEFAULT_POWER_FACTOR);
    }

    #[test]
    fn test_demand_factor_lookup() {
        assert_eq!(BuildingType::Residential.demand_factor("outlets"), Some(0.50));
        assert_eq!(BuildingType::Industrial.demand_factor("welding"), Some(0.60));
        assert_eq!(BuildingType::Office.demand_factor("welding"), None);
    }

    #[test]
    fn test_main_feeders_strictest() {
        let strictest = CircuitDuty::ALL
            .iter()
            .map(|d| d.voltage_drop_limit_pct())
            .fold(f64::INFINITY, f64::min);
        assert_eq!(strictest, CircuitDuty::MainFeeders.voltage_drop_limit_pct());
    }

    #[test]
    fn test_insulation_serialization() {
        let json = serde_json::to_string(&InsulationType::Xlpe).unwrap();
        assert_eq!(json, "\"xlpe\"");
        assert_eq!(InsulationType::Xlpe.max_temperature_c(), 90.0);
    }
}
