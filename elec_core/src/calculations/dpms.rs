//! # DPMS - Simultaneous Maximum Demand
//!
//! Aggregates the installed power of one room/panel by load category into
//! a simultaneous maximum demand figure (Determinación de la Potencia
//! Máxima Simultánea).
//!
//! ## Method
//!
//! ```text
//! installed[cat] = Σ (declared dpms if > 0, else outlets × unit_power[cat])
//! dpms[cat]      = installed[cat] × demand_factor[grade][cat]
//! current[cat]   = dpms[cat] / 220 V
//! density        = Σ dpms / (x · y)
//! ```
//!
//! ## Assumptions
//!
//! - Every category is treated as single-phase at 220 V, even categories
//!   that could be fed three-phase. Per-load phase detection is not done.
//! - An unknown or missing electrification grade uses the "Medio" table.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use elec_core::calculations::dpms::{calculate, Dimensions, LoadCategory, LoadItem, PanelEnvironment};
//!
//! let mut loads = BTreeMap::new();
//! loads.insert(LoadCategory::Tug, vec![LoadItem::outlets(5), LoadItem::outlets(5)]);
//!
//! let room = PanelEnvironment {
//!     id: "amb-1".to_string(),
//!     panel_name: "TS1".to_string(),
//!     room_name: "Living".to_string(),
//!     dimensions: Dimensions { x: 10.0, y: 10.0, h: None },
//!     grade: Some("Medio".to_string()),
//!     loads,
//! };
//!
//! let result = calculate(&room).unwrap();
//! assert!((result.dpms_total_va - 1350.0).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Engine;
use crate::electrical::constants::{DEFAULT_POWER_FACTOR, PHASE_VOLTAGE};
use crate::electrical::validation::validate_non_negative;
use crate::errors::{CalcError, CalcResult};

/// Voltage used to turn each category's demand into a current.
pub const CURRENT_BASIS_VOLTAGE: f64 = PHASE_VOLTAGE;

/// Power factor applied to the general summary's active power.
pub const SUMMARY_POWER_FACTOR: f64 = DEFAULT_POWER_FACTOR;

// ============================================================================
// Load categories and electrification grades
// ============================================================================

/// Load category of a room's circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadCategory {
    /// Tomas de uso general - general-purpose outlets
    #[serde(rename = "TUG")]
    Tug,
    /// Iluminación de uso general - general lighting
    #[serde(rename = "IUG")]
    Iug,
    /// Aparatos de climatización
    #[serde(rename = "ATE")]
    Ate,
    /// Acondicionadores de aire
    #[serde(rename = "ACU")]
    Acu,
    /// Tomas de uso específico - dedicated outlets
    #[serde(rename = "TUE")]
    Tue,
    /// Otras cargas eléctricas
    #[serde(rename = "OCE")]
    Oce,
}

impl LoadCategory {
    pub const ALL: [LoadCategory; 6] = [
        LoadCategory::Tug,
        LoadCategory::Iug,
        LoadCategory::Ate,
        LoadCategory::Acu,
        LoadCategory::Tue,
        LoadCategory::Oce,
    ];

    /// Installed power per outlet/point (VA)
    pub fn unit_power_va(&self) -> f64 {
        match self {
            LoadCategory::Tug => 180.0,
            LoadCategory::Iug => 300.0,
            LoadCategory::Ate => 600.0,
            LoadCategory::Acu => 1000.0,
            LoadCategory::Tue => 500.0,
            LoadCategory::Oce => 200.0,
        }
    }

    /// Typical cos φ of the category, used for the weighted power factor
    pub fn typical_power_factor(&self) -> f64 {
        match self {
            LoadCategory::Tug => 0.85,
            LoadCategory::Iug => 0.95,
            LoadCategory::Ate => 0.80,
            LoadCategory::Acu => 0.75,
            LoadCategory::Tue => 0.88,
            LoadCategory::Oce => 0.90,
        }
    }

    /// Short code as used on drawings
    pub fn code(&self) -> &'static str {
        match self {
            LoadCategory::Tug => "TUG",
            LoadCategory::Iug => "IUG",
            LoadCategory::Ate => "ATE",
            LoadCategory::Acu => "ACU",
            LoadCategory::Tue => "TUE",
            LoadCategory::Oce => "OCE",
        }
    }
}

impl std::fmt::Display for LoadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Electrification grade of a dwelling or premises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ElectrificationGrade {
    #[serde(rename = "Básico", alias = "Basico")]
    Basico,
    #[default]
    Medio,
    Superior,
    Especial,
}

impl ElectrificationGrade {
    pub const ALL: [ElectrificationGrade; 4] = [
        ElectrificationGrade::Basico,
        ElectrificationGrade::Medio,
        ElectrificationGrade::Superior,
        ElectrificationGrade::Especial,
    ];

    /// Parse a grade label; `None` for anything unrecognized
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Básico" | "Basico" => Some(ElectrificationGrade::Basico),
            "Medio" => Some(ElectrificationGrade::Medio),
            "Superior" => Some(ElectrificationGrade::Superior),
            "Especial" => Some(ElectrificationGrade::Especial),
            _ => None,
        }
    }

    /// Grade for an optional label, falling back to "Medio"
    pub fn resolve(label: Option<&str>) -> Self {
        match label.and_then(Self::from_label) {
            Some(grade) => grade,
            None => {
                debug!(grade = ?label, "unrecognized electrification grade, using Medio");
                ElectrificationGrade::default()
            }
        }
    }

    /// Demand factor for a load category
    pub fn demand_factor(&self, category: LoadCategory) -> f64 {
        use LoadCategory::*;
        match (self, category) {
            (ElectrificationGrade::Basico, Tug) => 0.8,
            (ElectrificationGrade::Basico, Acu) => 0.6,
            (ElectrificationGrade::Medio, Tug) => 0.75,
            (ElectrificationGrade::Medio, Acu) => 0.7,
            (ElectrificationGrade::Superior, Tug) => 0.7,
            (ElectrificationGrade::Superior, Acu) => 0.8,
            (ElectrificationGrade::Especial, Tug) => 0.65,
            (ElectrificationGrade::Especial, Acu) => 0.9,
            (_, Iug | Ate | Tue | Oce) => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ElectrificationGrade::Basico => "Básico",
            ElectrificationGrade::Medio => "Medio",
            ElectrificationGrade::Superior => "Superior",
            ElectrificationGrade::Especial => "Especial",
        }
    }
}

impl std::fmt::Display for ElectrificationGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Input
// ============================================================================

/// One circuit line within a category.
///
/// Installed power is the declared `dpms` when it is positive, otherwise
/// `outlet_count × unit_power[category]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoadItem {
    /// Number of outlets/points on the circuit
    #[serde(rename = "cantidadBocas", default)]
    pub outlet_count: u32,

    /// Declared installed power (VA); 0 means "derive from outlet count"
    #[serde(default)]
    pub dpms: f64,

    /// Circuit designation
    #[serde(rename = "identificacionCircuito", default, skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,

    /// Phase the circuit hangs from (informative only)
    #[serde(rename = "fase", default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl LoadItem {
    /// Circuit described by its outlet count
    pub fn outlets(outlet_count: u32) -> Self {
        LoadItem {
            outlet_count,
            ..Default::default()
        }
    }

    /// Circuit with a declared installed power (VA)
    pub fn declared(dpms_va: f64) -> Self {
        LoadItem {
            dpms: dpms_va,
            ..Default::default()
        }
    }

    /// Installed power (VA) for this item in `category`
    pub fn installed_power_va(&self, category: LoadCategory) -> f64 {
        if self.dpms > 0.0 {
            self.dpms
        } else {
            f64::from(self.outlet_count) * category.unit_power_va()
        }
    }
}

/// Floor plan dimensions (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: f64,
    pub y: f64,
    /// Ceiling height, informative only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

/// A room/panel to size.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "amb-1",
///   "denominacionTablero": "TS1",
///   "denominacionAmbiente": "Living",
///   "dimensiones": { "x": 10.0, "y": 10.0 },
///   "gradoElectrificacion": "Medio",
///   "cargas": {
///     "TUG": [{ "cantidadBocas": 5, "dpms": 0 }],
///     "IUG": [{ "cantidadBocas": 4, "dpms": 0 }]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelEnvironment {
    pub id: String,

    #[serde(rename = "denominacionTablero")]
    pub panel_name: String,

    #[serde(rename = "denominacionAmbiente")]
    pub room_name: String,

    #[serde(rename = "dimensiones")]
    pub dimensions: Dimensions,

    /// Electrification grade label; unknown or missing means "Medio"
    #[serde(rename = "gradoElectrificacion", default)]
    pub grade: Option<String>,

    #[serde(rename = "cargas", default)]
    pub loads: BTreeMap<LoadCategory, Vec<LoadItem>>,
}

impl PanelEnvironment {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::missing_field("id"));
        }
        validate_non_negative("dimensiones.x", self.dimensions.x)?;
        validate_non_negative("dimensiones.y", self.dimensions.y)?;
        for (category, items) in &self.loads {
            for item in items {
                validate_non_negative(&format!("cargas.{category}.dpms"), item.dpms)?;
            }
        }
        Ok(())
    }

    /// Floor area x·y (m²)
    pub fn area_m2(&self) -> f64 {
        self.dimensions.x * self.dimensions.y
    }

    /// Effective electrification grade
    pub fn effective_grade(&self) -> ElectrificationGrade {
        ElectrificationGrade::resolve(self.grade.as_deref())
    }

    /// Power-weighted average of category power factors over declared
    /// item powers; 0.92 when nothing is declared.
    pub fn weighted_power_factor(&self) -> f64 {
        let (weighted, total) = self
            .loads
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |item| (category.typical_power_factor(), item.dpms)))
            .fold((0.0, 0.0), |(weighted, total), (pf, power)| (weighted + power * pf, total + power));

        if total > 0.0 {
            weighted / total
        } else {
            DEFAULT_POWER_FACTOR
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Demand figures of one load category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryDemand {
    #[serde(rename = "potencia_instalada")]
    pub installed_power_va: f64,
    #[serde(rename = "factor_demanda")]
    pub demand_factor: f64,
    #[serde(rename = "dpms")]
    pub dpms_va: f64,
    #[serde(rename = "corriente")]
    pub current_a: f64,
}

/// Results of a DPMS calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpmsResult {
    pub id: String,
    #[serde(rename = "denominacionTablero")]
    pub panel_name: String,
    #[serde(rename = "denominacionAmbiente")]
    pub room_name: String,
    #[serde(rename = "superficie")]
    pub area_m2: f64,
    #[serde(rename = "gradoElectrificacion")]
    pub grade: ElectrificationGrade,
    #[serde(rename = "dpms_por_tipo")]
    pub by_category: BTreeMap<LoadCategory, CategoryDemand>,
    #[serde(rename = "dpms_total")]
    pub dpms_total_va: f64,
    #[serde(rename = "corriente_total")]
    pub current_total_a: f64,
    /// VA/m²; 0 for a zero area
    #[serde(rename = "densidad_potencia")]
    pub power_density_va_m2: f64,
    #[serde(rename = "factor_potencia_promedio")]
    pub average_power_factor: f64,
    #[serde(rename = "potencia_activa")]
    pub active_power_w: f64,
}

/// Totals across several DPMS results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpmsSummary {
    #[serde(rename = "cantidad_tableros")]
    pub panel_count: usize,
    #[serde(rename = "dpms_total_general")]
    pub dpms_total_va: f64,
    #[serde(rename = "corriente_total_general")]
    pub current_total_a: f64,
    #[serde(rename = "superficie_total")]
    pub area_total_m2: f64,
    #[serde(rename = "densidad_promedio")]
    pub average_density_va_m2: f64,
    /// Σ DPMS × 0.92, not the per-room weighted power factors
    #[serde(rename = "potencia_activa_total")]
    pub active_power_total_w: f64,
}

// ============================================================================
// Calculation
// ============================================================================

/// Calculate the simultaneous maximum demand of one room/panel.
///
/// # Returns
///
/// * `Ok(DpmsResult)` - Per-category and total demand
/// * `Err(CalcError::CalculationFailed)` - Invalid input, naming the record
pub fn calculate(input: &PanelEnvironment) -> CalcResult<DpmsResult> {
    debug!(id = %input.id, "dpms calculation");
    compute(input).map_err(|e| CalcError::calculation_failed(Engine::Dpms.name(), &input.id, e))
}

fn compute(input: &PanelEnvironment) -> CalcResult<DpmsResult> {
    input.validate()?;

    let area_m2 = input.area_m2();
    let grade = input.effective_grade();

    let mut by_category = BTreeMap::new();
    let mut dpms_total_va = 0.0;
    let mut current_total_a = 0.0;

    for (&category, items) in &input.loads {
        let installed_power_va: f64 = items.iter().map(|item| item.installed_power_va(category)).sum();
        let demand_factor = grade.demand_factor(category);
        let dpms_va = installed_power_va * demand_factor;
        let current_a = dpms_va / CURRENT_BASIS_VOLTAGE;

        by_category.insert(
            category,
            CategoryDemand {
                installed_power_va,
                demand_factor,
                dpms_va,
                current_a,
            },
        );

        dpms_total_va += dpms_va;
        current_total_a += current_a;
    }

    let power_density_va_m2 = if area_m2 > 0.0 { dpms_total_va / area_m2 } else { 0.0 };
    let average_power_factor = input.weighted_power_factor();

    Ok(DpmsResult {
        id: input.id.clone(),
        panel_name: input.panel_name.clone(),
        room_name: input.room_name.clone(),
        area_m2,
        grade,
        by_category,
        dpms_total_va,
        current_total_a,
        power_density_va_m2,
        average_power_factor,
        active_power_w: dpms_total_va * average_power_factor,
    })
}

/// Calculate several rooms. The first failing record aborts the batch.
pub fn calculate_multiple(inputs: &[PanelEnvironment]) -> CalcResult<Vec<DpmsResult>> {
    let results = inputs.iter().map(calculate).collect::<CalcResult<Vec<_>>>()?;
    info!(count = results.len(), "dpms batch calculated");
    Ok(results)
}

/// Totals across results; `None` for an empty list.
pub fn general_summary(results: &[DpmsResult]) -> Option<DpmsSummary> {
    if results.is_empty() {
        return None;
    }

    let dpms_total_va: f64 = results.iter().map(|r| r.dpms_total_va).sum();
    let current_total_a: f64 = results.iter().map(|r| r.current_total_a).sum();
    let area_total_m2: f64 = results.iter().map(|r| r.area_m2).sum();

    Some(DpmsSummary {
        panel_count: results.len(),
        dpms_total_va,
        current_total_a,
        area_total_m2,
        average_density_va_m2: if area_total_m2 > 0.0 { dpms_total_va / area_total_m2 } else { 0.0 },
        active_power_total_w: dpms_total_va * SUMMARY_POWER_FACTOR,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn living_room() -> PanelEnvironment {
        let mut loads = BTreeMap::new();
        loads.insert(LoadCategory::Tug, vec![LoadItem::outlets(5), LoadItem::outlets(5)]);
        PanelEnvironment {
            id: "amb-1".to_string(),
            panel_name: "TS1".to_string(),
            room_name: "Living".to_string(),
            dimensions: Dimensions { x: 10.0, y: 10.0, h: None },
            grade: Some("Medio".to_string()),
            loads,
        }
    }

    #[test]
    fn test_outlet_based_demand() {
        let result = calculate(&living_room()).unwrap();
        let tug = result.by_category[&LoadCategory::Tug];

        // 2 × 5 × 180 = 1800 VA installed, × 0.75 = 1350 VA
        assert!((tug.installed_power_va - 1800.0).abs() < 1e-9);
        assert_eq!(tug.demand_factor, 0.75);
        assert!((tug.dpms_va - 1350.0).abs() < 1e-9);
        assert!((tug.current_a - 6.136).abs() < 0.001);

        assert!((result.area_m2 - 100.0).abs() < 1e-9);
        assert!((result.power_density_va_m2 - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_declared_power_takes_priority() {
        let item = LoadItem {
            outlet_count: 10,
            dpms: 2500.0,
            ..Default::default()
        };
        assert_eq!(item.installed_power_va(LoadCategory::Tug), 2500.0);
        assert_eq!(LoadItem::outlets(3).installed_power_va(LoadCategory::Acu), 3000.0);
    }

    #[test]
    fn test_totals_are_category_sums() {
        let mut room = living_room();
        room.loads.insert(LoadCategory::Iug, vec![LoadItem::outlets(4)]);
        room.loads.insert(LoadCategory::Acu, vec![LoadItem::declared(2200.0)]);
        room.loads.insert(LoadCategory::Oce, vec![]);

        let result = calculate(&room).unwrap();
        let dpms_sum: f64 = result.by_category.values().map(|c| c.dpms_va).sum();
        let current_sum: f64 = result.by_category.values().map(|c| c.current_a).sum();

        assert!((result.dpms_total_va - dpms_sum).abs() < 1e-9);
        assert!((result.current_total_a - current_sum).abs() < 1e-9);
        assert_eq!(result.by_category[&LoadCategory::Oce].dpms_va, 0.0);
        assert_eq!(result.by_category.len(), 4);
    }

    #[test]
    fn test_unknown_grade_falls_back_to_medio() {
        let mut room = living_room();
        room.grade = Some("Premium".to_string());
        let result = calculate(&room).unwrap();
        assert_eq!(result.grade, ElectrificationGrade::Medio);

        room.grade = None;
        assert_eq!(calculate(&room).unwrap().grade, ElectrificationGrade::Medio);
    }

    #[test]
    fn test_grade_changes_outlet_factor() {
        let mut room = living_room();
        room.grade = Some("Básico".to_string());
        let basico = calculate(&room).unwrap();
        room.grade = Some("Especial".to_string());
        let especial = calculate(&room).unwrap();
        assert!((basico.dpms_total_va - 1440.0).abs() < 1e-9);
        assert!((especial.dpms_total_va - 1170.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_gives_zero_density() {
        let mut room = living_room();
        room.dimensions.x = 0.0;
        let result = calculate(&room).unwrap();
        assert_eq!(result.power_density_va_m2, 0.0);
        assert!(result.dpms_total_va > 0.0);
    }

    #[test]
    fn test_weighted_power_factor() {
        let mut room = living_room();
        // Only outlet counts: nothing declared, default applies
        assert_eq!(room.weighted_power_factor(), 0.92);

        room.loads.insert(LoadCategory::Iug, vec![LoadItem::declared(1000.0)]);
        room.loads.insert(LoadCategory::Acu, vec![LoadItem::declared(1000.0)]);
        // (1000 × 0.95 + 1000 × 0.75) / 2000
        assert!((room.weighted_power_factor() - 0.85).abs() < 1e-12);

        let result = calculate(&room).unwrap();
        assert!((result.active_power_w - result.dpms_total_va * 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_negative_dimension_names_record() {
        let mut room = living_room();
        room.dimensions.y = -3.0;
        let err = calculate(&room).unwrap_err();
        assert_eq!(err.record_id(), Some("amb-1"));
        assert_eq!(err.engine(), Some("DPMS"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut room = living_room();
        room.id = " ".to_string();
        let err = calculate(&room).unwrap_err();
        assert_eq!(err.root_cause().error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_general_summary_uses_fixed_power_factor() {
        let mut office = living_room();
        office.id = "amb-2".to_string();
        office.loads.insert(LoadCategory::Acu, vec![LoadItem::declared(3000.0)]);

        let results = calculate_multiple(&[living_room(), office]).unwrap();
        let summary = general_summary(&results).unwrap();

        assert_eq!(summary.panel_count, 2);
        assert!((summary.area_total_m2 - 200.0).abs() < 1e-9);
        assert!((summary.average_density_va_m2 - summary.dpms_total_va / 200.0).abs() < 1e-9);
        // Uses 0.92 even though the second room's weighted factor is 0.75
        assert!((summary.active_power_total_w - summary.dpms_total_va * 0.92).abs() < 1e-9);
        let per_room_active: f64 = results.iter().map(|r| r.active_power_w).sum();
        assert!((summary.active_power_total_w - per_room_active).abs() > 1.0);
    }

    #[test]
    fn test_general_summary_empty() {
        assert!(general_summary(&[]).is_none());
    }

    #[test]
    fn test_json_wire_format() {
        let json = r#"{
            "id": "amb-9",
            "denominacionTablero": "TP",
            "denominacionAmbiente": "Cocina",
            "dimensiones": { "x": 3.0, "y": 4.0, "h": 2.6 },
            "superficie": 12.0,
            "gradoElectrificacion": "Superior",
            "cargas": {
                "TUG": [{ "cantidadBocas": 6, "identificacionCircuito": "C1", "dpms": 0, "fase": "R", "corriente": 0 }],
                "TUE": [{ "cantidadBocas": 1, "identificacionCircuito": "C2", "dpms": 3000, "fase": "S", "corriente": 0 }]
            }
        }"#;
        let room: PanelEnvironment = serde_json::from_str(json).unwrap();
        let result = calculate(&room).unwrap();

        // TUG: 6 × 180 × 0.7 = 756, TUE: 3000 × 1.0
        assert!((result.dpms_total_va - 3756.0).abs() < 1e-9);

        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["gradoElectrificacion"], "Superior");
        assert!(out["dpms_por_tipo"]["TUE"]["potencia_instalada"].is_number());
        assert!(out.get("densidad_potencia").is_some());
    }
}
