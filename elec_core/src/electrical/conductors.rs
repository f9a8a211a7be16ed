//! # Conductors
//!
//! Conductor materials and installation methods, with the resistivity,
//! temperature coefficient and reactance values the engines draw on.
//!
//! ## JSON
//!
//! Materials serialize as `"cobre"` / `"aluminio"`. Installation types
//! accept both the cable-run names (`"cable_unipolar_bandeja"`,
//! `"cable_multipolar"`, `"conductor_desnudo"`) and the fault-study names
//! (`"cable_unipolar"`, `"cable_tripolar"`, `"conductor_aereo"`,
//! `"barra_cobre"`).

use serde::{Deserialize, Serialize};

use super::constants::{
    ALUMINUM_RESISTIVITY_20C, ALUMINUM_TEMPERATURE_COEFFICIENT, COPPER_RESISTIVITY_20C,
    COPPER_TEMPERATURE_COEFFICIENT,
};

/// Conductor material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConductorMaterial {
    #[default]
    #[serde(rename = "cobre", alias = "copper")]
    Copper,
    #[serde(rename = "aluminio", alias = "aluminum")]
    Aluminum,
}

impl ConductorMaterial {
    pub const ALL: [ConductorMaterial; 2] = [ConductorMaterial::Copper, ConductorMaterial::Aluminum];

    /// Resistivity at 20 °C (Ω·mm²/m)
    pub fn resistivity_20c(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => COPPER_RESISTIVITY_20C,
            ConductorMaterial::Aluminum => ALUMINUM_RESISTIVITY_20C,
        }
    }

    /// Temperature coefficient of resistance α (/°C)
    pub fn temperature_coefficient(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => COPPER_TEMPERATURE_COEFFICIENT,
            ConductorMaterial::Aluminum => ALUMINUM_TEMPERATURE_COEFFICIENT,
        }
    }

    /// Wire label
    pub fn label(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "cobre",
            ConductorMaterial::Aluminum => "aluminio",
        }
    }
}

impl std::fmt::Display for ConductorMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Installation method, which sets the series reactance of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstallationType {
    /// Single-core cables on a tray: 0.08 Ω/km
    #[serde(rename = "cable_unipolar", alias = "cable_unipolar_bandeja")]
    SingleCoreCable,

    /// Multi-core (three-core) cable: 0.07 Ω/km
    #[default]
    #[serde(rename = "cable_multipolar", alias = "cable_tripolar")]
    MultiCoreCable,

    /// Bare or overhead conductor: 0.30 Ω/km
    #[serde(rename = "conductor_desnudo", alias = "conductor_aereo")]
    BareConductor,

    /// Copper busbar: 0.02 Ω/km
    #[serde(rename = "barra_cobre")]
    CopperBusbar,
}

impl InstallationType {
    pub const ALL: [InstallationType; 4] = [
        InstallationType::SingleCoreCable,
        InstallationType::MultiCoreCable,
        InstallationType::BareConductor,
        InstallationType::CopperBusbar,
    ];

    /// Series reactance (Ω/km)
    pub fn reactance_ohm_per_km(&self) -> f64 {
        match self {
            InstallationType::SingleCoreCable => 0.08,
            InstallationType::MultiCoreCable => 0.07,
            InstallationType::BareConductor => 0.30,
            InstallationType::CopperBusbar => 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_properties() {
        assert_eq!(ConductorMaterial::Copper.resistivity_20c(), 0.01724);
        assert_eq!(ConductorMaterial::Aluminum.resistivity_20c(), 0.02826);
        assert!(ConductorMaterial::Aluminum.temperature_coefficient() > ConductorMaterial::Copper.temperature_coefficient());
    }

    #[test]
    fn test_material_serialization() {
        let json = serde_json::to_string(&ConductorMaterial::Aluminum).unwrap();
        assert_eq!(json, "\"aluminio\"");
        let copper: ConductorMaterial = serde_json::from_str("\"cobre\"").unwrap();
        assert_eq!(copper, ConductorMaterial::Copper);
    }

    #[test]
    fn test_installation_aliases() {
        let tray: InstallationType = serde_json::from_str("\"cable_unipolar_bandeja\"").unwrap();
        assert_eq!(tray, InstallationType::SingleCoreCable);
        let tripolar: InstallationType = serde_json::from_str("\"cable_tripolar\"").unwrap();
        assert_eq!(tripolar, InstallationType::MultiCoreCable);
        let overhead: InstallationType = serde_json::from_str("\"conductor_aereo\"").unwrap();
        assert_eq!(overhead.reactance_ohm_per_km(), 0.30);
    }

    #[test]
    fn test_unknown_installation_rejected() {
        let result: Result<InstallationType, _> = serde_json::from_str("\"subterraneo\"");
        assert!(result.is_err());
    }
}
