//! # Voltage Drop
//!
//! Exact voltage drop and power loss along a cable run, checked against the
//! limit of the circuit class.
//!
//! ## Method
//!
//! ```text
//! R = ρ·(1 + α·(T_op − 20)) / S · L/1000
//! X = x_km · L/1000
//! ΔV_active   = I·(R·cos φ + X·sin φ)
//! ΔV_reactive = I·(X·cos φ − R·sin φ)
//! ΔV          = √(ΔV_active² + ΔV_reactive²)
//! ```
//!
//! The current is taken as already phase-equivalent; no √3 line-to-line
//! correction is applied.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::calculations::voltage_drop::{calculate, VoltageDropCheck};
//!
//! let check = VoltageDropCheck::new("vd-1", 20.0, 50.0, 4.0);
//! let result = calculate(&check).unwrap();
//!
//! assert!(result.passes);
//! assert!((result.consumption_voltage_v + result.drop_v - 220.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Engine;
use crate::electrical::constants::{DEFAULT_POWER_FACTOR, PHASE_VOLTAGE, STANDARD_SECTIONS_MM2};
use crate::electrical::conductors::{ConductorMaterial, InstallationType};
use crate::electrical::formulas::{
    impedance_magnitude, sin_phi, temperature_factor, voltage_drop_components,
};
use crate::electrical::validation::{
    validate_conductor_section, validate_current, validate_non_negative, validate_power_factor,
    validate_temperature, validate_voltage,
};
use crate::errors::{CalcError, CalcResult};

/// Share of the limit a suggested section may use
pub const SUGGESTION_LIMIT_SHARE: f64 = 0.8;

/// Largest section the suggestion scan considers (mm²)
pub const MAX_SUGGESTED_SECTION_MM2: f64 = 300.0;

/// Circuit class, which sets the permitted drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CircuitClass {
    AlimentacionPrincipal,
    CircuitoFuerza,
    CircuitoIluminacion,
    #[default]
    CircuitoTomas,
    Emergencia,
}

impl CircuitClass {
    pub const ALL: [CircuitClass; 5] = [
        CircuitClass::AlimentacionPrincipal,
        CircuitClass::CircuitoFuerza,
        CircuitClass::CircuitoIluminacion,
        CircuitClass::CircuitoTomas,
        CircuitClass::Emergencia,
    ];

    /// Permitted voltage drop (%)
    pub fn limit_pct(&self) -> f64 {
        match self {
            CircuitClass::AlimentacionPrincipal => 1.0,
            CircuitClass::CircuitoFuerza | CircuitClass::CircuitoIluminacion => 3.0,
            CircuitClass::CircuitoTomas => 5.0,
            CircuitClass::Emergencia => 2.0,
        }
    }
}

// ============================================================================
// Input
// ============================================================================

fn default_section() -> f64 {
    2.5
}

fn default_voltage() -> f64 {
    PHASE_VOLTAGE
}

fn default_cos_phi() -> f64 {
    DEFAULT_POWER_FACTOR
}

fn default_operating_temperature() -> f64 {
    70.0
}

/// One cable run to check.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "vd-1",
///   "circuito": "C3",
///   "corriente": 20.0,
///   "longitud": 50.0,
///   "seccion": 4.0,
///   "tensionNominal": 220.0,
///   "tipoCircuito": "circuito_tomas",
///   "materialConductor": "cobre",
///   "tipoInstalacion": "cable_multipolar",
///   "cosPhi": 0.92,
///   "temperaturaOperacion": 70.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropCheck {
    pub id: String,

    #[serde(rename = "circuito", default)]
    pub circuit: String,

    #[serde(rename = "corriente", default)]
    pub current_a: f64,

    #[serde(rename = "longitud", default)]
    pub length_m: f64,

    #[serde(rename = "seccion", default = "default_section")]
    pub section_mm2: f64,

    #[serde(rename = "tensionNominal", default = "default_voltage")]
    pub nominal_voltage_v: f64,

    #[serde(rename = "tipoCircuito", default)]
    pub circuit_class: CircuitClass,

    #[serde(rename = "materialConductor", default)]
    pub material: ConductorMaterial,

    #[serde(rename = "tipoInstalacion", default)]
    pub installation: InstallationType,

    #[serde(rename = "cosPhi", default = "default_cos_phi")]
    pub cos_phi: f64,

    #[serde(rename = "temperaturaOperacion", default = "default_operating_temperature")]
    pub operating_temperature_c: f64,
}

impl VoltageDropCheck {
    /// Run with every optional parameter at its default.
    pub fn new(id: impl Into<String>, current_a: f64, length_m: f64, section_mm2: f64) -> Self {
        VoltageDropCheck {
            id: id.into(),
            circuit: String::new(),
            current_a,
            length_m,
            section_mm2,
            nominal_voltage_v: default_voltage(),
            circuit_class: CircuitClass::default(),
            material: ConductorMaterial::default(),
            installation: InstallationType::default(),
            cos_phi: default_cos_phi(),
            operating_temperature_c: default_operating_temperature(),
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::missing_field("id"));
        }
        validate_current("corriente", self.current_a)?;
        validate_non_negative("longitud", self.length_m)?;
        validate_voltage("tensionNominal", self.nominal_voltage_v)?;
        validate_power_factor("cosPhi", self.cos_phi)?;
        validate_temperature("temperaturaOperacion", self.operating_temperature_c)?;
        Ok(())
    }

    /// Run resistance (Ω) at the operating temperature
    pub fn total_resistance(&self) -> f64 {
        let alpha = self.material.temperature_coefficient();
        let per_km = self.material.resistivity_20c() * temperature_factor(alpha, self.operating_temperature_c)
            / self.section_mm2;
        per_km * self.length_m / 1000.0
    }

    /// Run reactance (Ω)
    pub fn total_reactance(&self) -> f64 {
        self.installation.reactance_ohm_per_km() * self.length_m / 1000.0
    }
}

// ============================================================================
// Results
// ============================================================================

/// Verdict tier of a voltage-drop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropTier {
    Rechazado,
    Advertencia,
    Aceptable,
    Excelente,
}

impl DropTier {
    pub fn classify(passes: bool, drop_pct: f64, limit_pct: f64) -> Self {
        if !passes {
            DropTier::Rechazado
        } else if drop_pct > limit_pct * 0.8 {
            DropTier::Advertencia
        } else if drop_pct > limit_pct * 0.5 {
            DropTier::Aceptable
        } else {
            DropTier::Excelente
        }
    }

    pub fn message(&self, drop_pct: f64, limit_pct: f64) -> String {
        match self {
            DropTier::Rechazado => format!(
                "RECHAZADO - Caída excesiva ({drop_pct:.2}% > {limit_pct}%). Aumentar sección o reducir longitud"
            ),
            DropTier::Advertencia => format!("ADVERTENCIA - Próximo al límite ({drop_pct:.2}% de {limit_pct}%)"),
            DropTier::Aceptable => format!("ACEPTABLE - Dentro de parámetros normales ({drop_pct:.2}%)"),
            DropTier::Excelente => format!("EXCELENTE - Caída mínima ({drop_pct:.2}%)"),
        }
    }
}

/// Results of a voltage-drop check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropResult {
    pub id: String,
    #[serde(rename = "circuito")]
    pub circuit: String,
    #[serde(rename = "corriente")]
    pub current_a: f64,
    #[serde(rename = "longitud")]
    pub length_m: f64,
    #[serde(rename = "seccion")]
    pub section_mm2: f64,
    #[serde(rename = "tension_nominal")]
    pub nominal_voltage_v: f64,
    #[serde(rename = "tipo_circuito")]
    pub circuit_class: CircuitClass,
    #[serde(rename = "material_conductor")]
    pub material: ConductorMaterial,
    #[serde(rename = "resistencia_total")]
    pub resistance_ohm: f64,
    #[serde(rename = "reactancia_total")]
    pub reactance_ohm: f64,
    #[serde(rename = "impedancia_total")]
    pub impedance_ohm: f64,
    /// I·R
    #[serde(rename = "caida_resistiva")]
    pub resistive_drop_v: f64,
    /// I·X·sin φ
    #[serde(rename = "caida_reactiva")]
    pub reactive_drop_v: f64,
    #[serde(rename = "caida_tension_v")]
    pub drop_v: f64,
    #[serde(rename = "caida_tension_porcentual")]
    pub drop_pct: f64,
    #[serde(rename = "limite_permitido")]
    pub limit_pct: f64,
    #[serde(rename = "verificacion_ok")]
    pub passes: bool,
    #[serde(rename = "tension_consumo")]
    pub consumption_voltage_v: f64,
    /// I²·R (W)
    #[serde(rename = "perdidas_activas")]
    pub active_losses_w: f64,
    /// I²·X (var)
    #[serde(rename = "perdidas_reactivas")]
    pub reactive_losses_var: f64,
    #[serde(rename = "perdidas_totales")]
    pub total_losses_va: f64,
    /// Consumption over nominal voltage (%)
    #[serde(rename = "eficiencia")]
    pub efficiency_pct: f64,
    #[serde(rename = "nivel")]
    pub tier: DropTier,
    #[serde(rename = "recomendacion")]
    pub recommendation: String,
}

/// Smallest section meeting the drop limit with margin, or the largest
/// one with a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSuggestion {
    #[serde(rename = "seccion_recomendada")]
    pub section_mm2: f64,
    #[serde(rename = "caida_tension", skip_serializing_if = "Option::is_none")]
    pub drop_pct: Option<f64>,
    #[serde(rename = "tension_consumo", skip_serializing_if = "Option::is_none")]
    pub consumption_voltage_v: Option<f64>,
    /// Limit minus drop, percentage points
    #[serde(rename = "margen_seguridad", skip_serializing_if = "Option::is_none")]
    pub margin_pct: Option<f64>,
    #[serde(rename = "nota", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Tallies and spread of a voltage profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    #[serde(rename = "total_circuitos")]
    pub total: usize,
    #[serde(rename = "circuitos_aprobados")]
    pub passed: usize,
    #[serde(rename = "circuitos_rechazados")]
    pub rejected: usize,
    #[serde(rename = "porcentaje_aprobacion")]
    pub approval_pct: f64,
    #[serde(rename = "tension_minima_sistema")]
    pub min_voltage_v: f64,
    #[serde(rename = "tension_maxima_sistema")]
    pub max_voltage_v: f64,
    #[serde(rename = "diferencia_tension")]
    pub voltage_spread_v: f64,
    #[serde(rename = "perdidas_totales")]
    pub total_losses_va: f64,
}

/// Detailed results plus summary of several runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageProfile {
    #[serde(rename = "resultados_detallados")]
    pub results: Vec<VoltageDropResult>,
    #[serde(rename = "resumen")]
    pub summary: ProfileSummary,
}

// ============================================================================
// Calculation
// ============================================================================

/// Calculate the voltage drop along one run.
pub fn calculate(input: &VoltageDropCheck) -> CalcResult<VoltageDropResult> {
    debug!(id = %input.id, length_m = input.length_m, "voltage-drop calculation");
    compute(input).map_err(|e| CalcError::calculation_failed(Engine::VoltageDrop.name(), &input.id, e))
}

fn compute(input: &VoltageDropCheck) -> CalcResult<VoltageDropResult> {
    input.validate()?;
    validate_conductor_section("seccion", input.section_mm2)?;

    let current = input.current_a;
    let resistance_ohm = input.total_resistance();
    let reactance_ohm = input.total_reactance();
    let sin = sin_phi(input.cos_phi);

    let drop = voltage_drop_components(current, resistance_ohm, reactance_ohm, input.cos_phi);
    let drop_pct = drop.total_v / input.nominal_voltage_v * 100.0;
    let limit_pct = input.circuit_class.limit_pct();
    let passes = drop_pct <= limit_pct;
    let consumption_voltage_v = input.nominal_voltage_v - drop.total_v;

    let active_losses_w = current * current * resistance_ohm;
    let reactive_losses_var = current * current * reactance_ohm;
    let tier = DropTier::classify(passes, drop_pct, limit_pct);

    Ok(VoltageDropResult {
        id: input.id.clone(),
        circuit: input.circuit.clone(),
        current_a: current,
        length_m: input.length_m,
        section_mm2: input.section_mm2,
        nominal_voltage_v: input.nominal_voltage_v,
        circuit_class: input.circuit_class,
        material: input.material,
        resistance_ohm,
        reactance_ohm,
        impedance_ohm: impedance_magnitude(resistance_ohm, reactance_ohm),
        resistive_drop_v: current * resistance_ohm,
        reactive_drop_v: current * reactance_ohm * sin,
        drop_v: drop.total_v,
        drop_pct,
        limit_pct,
        passes,
        consumption_voltage_v,
        active_losses_w,
        reactive_losses_var,
        total_losses_va: impedance_magnitude(active_losses_w, reactive_losses_var),
        // (V_c·I·cos φ)/(V_n·I·cos φ) reduces to V_c/V_n and stays defined at I = 0
        efficiency_pct: consumption_voltage_v / input.nominal_voltage_v * 100.0,
        tier,
        recommendation: tier.message(drop_pct, limit_pct),
    })
}

/// Scan standard sections up to 300 mm² for the first whose drop stays
/// within 80 % of the class limit.
pub fn suggest_optimal_section(
    current_a: f64,
    length_m: f64,
    nominal_voltage_v: f64,
    circuit_class: CircuitClass,
    cos_phi: f64,
) -> CalcResult<DropSuggestion> {
    let limit_pct = circuit_class.limit_pct();

    for &section_mm2 in STANDARD_SECTIONS_MM2.iter().take_while(|&&s| s <= MAX_SUGGESTED_SECTION_MM2) {
        let check = VoltageDropCheck {
            nominal_voltage_v,
            circuit_class,
            cos_phi,
            ..VoltageDropCheck::new("sugerencia", current_a, length_m, section_mm2)
        };
        let result = calculate(&check)?;

        if result.passes && result.drop_pct <= limit_pct * SUGGESTION_LIMIT_SHARE {
            return Ok(DropSuggestion {
                section_mm2,
                drop_pct: Some(result.drop_pct),
                consumption_voltage_v: Some(result.consumption_voltage_v),
                margin_pct: Some(limit_pct - result.drop_pct),
                note: None,
            });
        }
    }

    debug!(current_a, length_m, "no standard section meets the drop limit");
    Ok(DropSuggestion {
        section_mm2: MAX_SUGGESTED_SECTION_MM2,
        drop_pct: None,
        consumption_voltage_v: None,
        margin_pct: None,
        note: Some("Verificar si es necesario reducir longitud o usar tensión mayor".to_string()),
    })
}

/// Check several runs and summarize the resulting voltage profile. The
/// first failing record aborts the batch.
pub fn calculate_voltage_profile(inputs: &[VoltageDropCheck]) -> CalcResult<VoltageProfile> {
    let results = inputs.iter().map(calculate).collect::<CalcResult<Vec<_>>>()?;
    let summary = profile_summary(&results);
    info!(total = summary.total, passed = summary.passed, "voltage profile calculated");
    Ok(VoltageProfile { results, summary })
}

/// Summary over already computed results. Voltages are 0 for an empty list.
pub fn profile_summary(results: &[VoltageDropResult]) -> ProfileSummary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passes).count();

    let voltages = results.iter().map(|r| r.consumption_voltage_v);
    let (min_voltage_v, max_voltage_v) = if total == 0 {
        (0.0, 0.0)
    } else {
        voltages.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };

    ProfileSummary {
        total,
        passed,
        rejected: total - passed,
        approval_pct: if total > 0 { passed as f64 / total as f64 * 100.0 } else { 0.0 },
        min_voltage_v,
        max_voltage_v,
        voltage_spread_v: max_voltage_v - min_voltage_v,
        total_losses_va: results.iter().map(|r| r.total_losses_va).sum(),
    }
}
