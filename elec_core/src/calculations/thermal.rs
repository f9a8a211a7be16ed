//! # Thermal Ampacity Check
//!
//! Verifies that a copper conductor carries its design current within the
//! corrected ampacity, and estimates its operating temperature and losses.
//!
//! ## Method
//!
//! ```text
//! I_corrected = I_base(S) · k_temp(T_amb) · k_group(n)
//! I_max       = I_corrected / 1.25
//! pass        = I_design ≤ I_max
//! T_op        = min(T_amb + I²·R₂₀·3.5, 90 °C)
//! losses      = I² · R(T_op) / 1000   (W/m)
//! ```
//!
//! Base ampacity and the ambient factor are linear interpolations over
//! tabulated breakpoints. The grouping factor is held at the 9-conductor
//! entry for larger groups.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::calculations::thermal::{calculate, ThermalCheck};
//!
//! let check = ThermalCheck {
//!     id: "t-1".to_string(),
//!     circuit: "C1".to_string(),
//!     design_current_a: 10.0,
//!     section_mm2: 2.5,
//!     ambient_temperature_c: 40.0,
//!     conductor_count: 3,
//! };
//!
//! let result = calculate(&check).unwrap();
//! assert!(result.passes);
//! assert!((result.max_permitted_current_a - 14.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Engine;
use crate::electrical::constants::{COPPER_RESISTIVITY_20C, COPPER_TEMPERATURE_COEFFICIENT};
use crate::electrical::formulas::temperature_factor;
use crate::electrical::interpolation::Breakpoints;
use crate::electrical::validation::{validate_conductor_section, validate_current, validate_temperature};
use crate::errors::{CalcError, CalcResult};

/// Base ampacity (A) by cross-section (mm²), single-core cable on a
/// perforated tray, 90 °C insulation
pub const AMPACITY: Breakpoints = Breakpoints::new(&[
    (1.5, 18.0),
    (2.5, 25.0),
    (4.0, 32.0),
    (6.0, 41.0),
    (10.0, 57.0),
    (16.0, 76.0),
    (25.0, 101.0),
    (35.0, 125.0),
    (50.0, 151.0),
    (70.0, 192.0),
    (95.0, 232.0),
    (120.0, 269.0),
    (150.0, 309.0),
    (185.0, 353.0),
    (240.0, 415.0),
    (300.0, 477.0),
    (400.0, 551.0),
]);

/// Ambient temperature (°C) correction factors
pub const AMBIENT_FACTORS: Breakpoints = Breakpoints::new(&[
    (30.0, 1.15),
    (35.0, 1.08),
    (40.0, 1.00),
    (45.0, 0.91),
    (50.0, 0.82),
    (55.0, 0.71),
    (60.0, 0.58),
]);

/// Grouping factors for 1..=9 loaded conductors
const GROUPING_FACTORS: [f64; 9] = [1.00, 0.80, 0.70, 0.65, 0.60, 0.57, 0.54, 0.52, 0.50];

pub const SAFETY_MARGIN: f64 = 1.25;

/// Approximate cable thermal resistance (K·m/W)
pub const THERMAL_RESISTANCE: f64 = 3.5;

/// Operating temperature cap (°C)
pub const MAX_OPERATING_TEMPERATURE_C: f64 = 90.0;

/// Highest utilization a suggested section may reach (%)
pub const SUGGESTION_MAX_UTILIZATION: f64 = 80.0;

/// Run length assumed per circuit when totalling batch losses (m)
pub const ASSUMED_CIRCUIT_LENGTH_M: f64 = 50.0;

/// Grouping correction for `count` loaded conductors.
pub fn grouping_factor(count: u32) -> f64 {
    let index = count.clamp(1, GROUPING_FACTORS.len() as u32) as usize - 1;
    GROUPING_FACTORS[index]
}

/// Base ampacity for a cross-section, interpolated between tabulated sections.
pub fn base_ampacity(section_mm2: f64) -> f64 {
    AMPACITY.interpolate(section_mm2)
}

// ============================================================================
// Input / result
// ============================================================================

fn default_section() -> f64 {
    2.5
}

fn default_ambient() -> f64 {
    40.0
}

fn default_conductor_count() -> u32 {
    3
}

/// Thermal check of one conductor.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "t-1",
///   "circuito": "C1",
///   "corriente": 20.0,
///   "seccion": 4.0,
///   "temperatura": 35.0,
///   "cantidadConductores": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalCheck {
    pub id: String,

    #[serde(rename = "circuito", default)]
    pub circuit: String,

    #[serde(rename = "corriente", default)]
    pub design_current_a: f64,

    #[serde(rename = "seccion", default = "default_section")]
    pub section_mm2: f64,

    #[serde(rename = "temperatura", default = "default_ambient")]
    pub ambient_temperature_c: f64,

    #[serde(rename = "cantidadConductores", default = "default_conductor_count")]
    pub conductor_count: u32,
}

impl ThermalCheck {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::missing_field("id"));
        }
        validate_current("corriente", self.design_current_a)?;
        validate_temperature("temperatura", self.ambient_temperature_c)?;
        if self.conductor_count == 0 {
            return Err(CalcError::invalid_input(
                "cantidadConductores",
                "0",
                "At least one loaded conductor is required",
            ));
        }
        Ok(())
    }
}

/// Verdict tier of a thermal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThermalTier {
    Rechazado,
    Critico,
    Advertencia,
    Aceptable,
    Sobredimensionado,
}

impl ThermalTier {
    pub fn classify(passes: bool, utilization_pct: f64) -> Self {
        if !passes {
            ThermalTier::Rechazado
        } else if utilization_pct > 90.0 {
            ThermalTier::Critico
        } else if utilization_pct > 75.0 {
            ThermalTier::Advertencia
        } else if utilization_pct > 50.0 {
            ThermalTier::Aceptable
        } else {
            ThermalTier::Sobredimensionado
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ThermalTier::Rechazado => "RECHAZADO - Aumentar sección del conductor",
            ThermalTier::Critico => "CRÍTICO - Considerar aumentar sección",
            ThermalTier::Advertencia => "ADVERTENCIA - Verificar condiciones de instalación",
            ThermalTier::Aceptable => "ACEPTABLE - Dentro de parámetros normales",
            ThermalTier::Sobredimensionado => "SOBRADIMENSIONADO - Sección mayor a la necesaria",
        }
    }
}

/// Results of a thermal check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalResult {
    pub id: String,
    #[serde(rename = "circuito")]
    pub circuit: String,
    #[serde(rename = "corriente_diseño")]
    pub design_current_a: f64,
    #[serde(rename = "seccion")]
    pub section_mm2: f64,
    #[serde(rename = "capacidad_base")]
    pub base_ampacity_a: f64,
    #[serde(rename = "temperatura_ambiente")]
    pub ambient_temperature_c: f64,
    #[serde(rename = "cantidad_conductores")]
    pub conductor_count: u32,
    #[serde(rename = "factor_temperatura")]
    pub temperature_factor: f64,
    #[serde(rename = "factor_agrupamiento")]
    pub grouping_factor: f64,
    #[serde(rename = "capacidad_corregida")]
    pub corrected_ampacity_a: f64,
    #[serde(rename = "corriente_maxima_permitida")]
    pub max_permitted_current_a: f64,
    #[serde(rename = "verificacion_ok")]
    pub passes: bool,
    #[serde(rename = "porcentaje_utilizacion")]
    pub utilization_pct: f64,
    /// Ω/m at 20 °C
    #[serde(rename = "resistencia_20c")]
    pub resistance_20c: f64,
    #[serde(rename = "temperatura_operacion")]
    pub operating_temperature_c: f64,
    /// Ω/m at the estimated operating temperature
    #[serde(rename = "resistencia_operacion")]
    pub operating_resistance: f64,
    #[serde(rename = "perdidas_por_metro")]
    pub losses_w_per_m: f64,
    #[serde(rename = "nivel")]
    pub tier: ThermalTier,
    #[serde(rename = "recomendacion")]
    pub recommendation: String,
}

/// Smallest adequate section for a current, or the largest one with a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSuggestion {
    #[serde(rename = "seccion_recomendada")]
    pub section_mm2: f64,
    #[serde(rename = "capacidad_util", skip_serializing_if = "Option::is_none")]
    pub usable_ampacity_a: Option<f64>,
    #[serde(rename = "porcentaje_utilizacion", skip_serializing_if = "Option::is_none")]
    pub utilization_pct: Option<f64>,
    #[serde(rename = "margen_seguridad", skip_serializing_if = "Option::is_none")]
    pub margin_a: Option<f64>,
    #[serde(rename = "nota", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Batch tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalBatchSummary {
    #[serde(rename = "total_circuitos")]
    pub total: usize,
    #[serde(rename = "circuitos_aprobados")]
    pub passed: usize,
    #[serde(rename = "circuitos_rechazados")]
    pub rejected: usize,
    #[serde(rename = "porcentaje_aprobacion")]
    pub approval_pct: f64,
    /// Σ losses × 50 m (W)
    #[serde(rename = "perdidas_totales_estimadas")]
    pub estimated_losses_w: f64,
}

/// Detailed results plus tallies of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalBatch {
    #[serde(rename = "resultados_detallados")]
    pub results: Vec<ThermalResult>,
    #[serde(rename = "resumen")]
    pub summary: ThermalBatchSummary,
}

// ============================================================================
// Calculation
// ============================================================================

/// Check the thermal capacity of one conductor.
pub fn calculate(input: &ThermalCheck) -> CalcResult<ThermalResult> {
    debug!(id = %input.id, section_mm2 = input.section_mm2, "thermal calculation");
    compute(input).map_err(|e| CalcError::calculation_failed(Engine::Thermal.name(), &input.id, e))
}

fn compute(input: &ThermalCheck) -> CalcResult<ThermalResult> {
    input.validate()?;
    validate_conductor_section("seccion", input.section_mm2)?;

    let current = input.design_current_a;
    let base_ampacity_a = base_ampacity(input.section_mm2);
    let temp_factor = AMBIENT_FACTORS.interpolate(input.ambient_temperature_c);
    let group_factor = grouping_factor(input.conductor_count);

    let corrected_ampacity_a = base_ampacity_a * temp_factor * group_factor;
    let max_permitted_current_a = corrected_ampacity_a / SAFETY_MARGIN;
    let passes = current <= max_permitted_current_a;
    let utilization_pct = if max_permitted_current_a > 0.0 {
        current / max_permitted_current_a * 100.0
    } else {
        0.0
    };

    let resistance_20c = COPPER_RESISTIVITY_20C / input.section_mm2;
    let temperature_rise = current * current * resistance_20c * THERMAL_RESISTANCE;
    let operating_temperature_c = (input.ambient_temperature_c + temperature_rise).min(MAX_OPERATING_TEMPERATURE_C);
    let operating_resistance =
        resistance_20c * temperature_factor(COPPER_TEMPERATURE_COEFFICIENT, operating_temperature_c);
    let losses_w_per_m = current * current * operating_resistance / 1000.0;

    let tier = ThermalTier::classify(passes, utilization_pct);

    Ok(ThermalResult {
        id: input.id.clone(),
        circuit: input.circuit.clone(),
        design_current_a: current,
        section_mm2: input.section_mm2,
        base_ampacity_a,
        ambient_temperature_c: input.ambient_temperature_c,
        conductor_count: input.conductor_count,
        temperature_factor: temp_factor,
        grouping_factor: group_factor,
        corrected_ampacity_a,
        max_permitted_current_a,
        passes,
        utilization_pct,
        resistance_20c,
        operating_temperature_c,
        operating_resistance,
        losses_w_per_m,
        tier,
        recommendation: tier.message().to_string(),
    })
}

/// Scan the tabulated sections ascending for the first that passes with at
/// most 80 % utilization.
pub fn suggest_optimal_section(
    design_current_a: f64,
    ambient_temperature_c: f64,
    conductor_count: u32,
) -> CalcResult<ThermalSuggestion> {
    for section_mm2 in AMPACITY.keys() {
        let check = ThermalCheck {
            id: "sugerencia".to_string(),
            circuit: String::new(),
            design_current_a,
            section_mm2,
            ambient_temperature_c,
            conductor_count,
        };
        let result = calculate(&check)?;

        if result.passes && result.utilization_pct <= SUGGESTION_MAX_UTILIZATION {
            return Ok(ThermalSuggestion {
                section_mm2,
                usable_ampacity_a: Some(result.max_permitted_current_a),
                utilization_pct: Some(result.utilization_pct),
                margin_a: Some(result.max_permitted_current_a - design_current_a),
                note: None,
            });
        }
    }

    let largest = AMPACITY.max_key().unwrap_or_default();
    debug!(design_current_a, largest, "no tabulated section is adequate");
    Ok(ThermalSuggestion {
        section_mm2: largest,
        usable_ampacity_a: None,
        utilization_pct: None,
        margin_a: None,
        note: Some("Verificar con fabricante para secciones especiales".to_string()),
    })
}

/// Check several circuits and tally them. The first failing record aborts
/// the batch.
pub fn calculate_multiple_circuits(inputs: &[ThermalCheck]) -> CalcResult<ThermalBatch> {
    let results = inputs.iter().map(calculate).collect::<CalcResult<Vec<_>>>()?;
    let summary = batch_summary(&results);
    info!(total = summary.total, passed = summary.passed, "thermal batch calculated");
    Ok(ThermalBatch { results, summary })
}

/// Tallies over already computed results.
pub fn batch_summary(results: &[ThermalResult]) -> ThermalBatchSummary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passes).count();
    let estimated_losses_w = results.iter().map(|r| r.losses_w_per_m * ASSUMED_CIRCUIT_LENGTH_M).sum();

    ThermalBatchSummary {
        total,
        passed,
        rejected: total - passed,
        approval_pct: if total > 0 { passed as f64 / total as f64 * 100.0 } else { 0.0 },
        estimated_losses_w,
    }
}
