//! # Short-Circuit Fault Levels
//!
//! Three-phase fault current at a point fed by a network source, a
//! distribution transformer and a cable run, following the simplified
//! IEC 60909 method.
//!
//! ## Method
//!
//! ```text
//! Z_source = V / (√3 · S_cc/(√3·V))
//! Z_trafo  = (z% / 100) · V² / S_trafo
//! R_cable  = ρ·L / (1000·S)      X_cable = x·L / (1000·S)
//! R_total  = R_cable
//! X_total  = Z_source + Z_trafo + X_cable
//! Ik''     = 1.1·V / (√3 · |Z_total|)
//! ip       = κ · √2 · Ik''
//! ```
//!
//! Source and transformer are modelled as purely reactive; the cable is
//! the only resistive contribution. In low voltage the steady-state
//! current is taken equal to Ik''.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Engine;
use crate::electrical::conductors::{ConductorMaterial, InstallationType};
use crate::electrical::constants::LINE_VOLTAGE;
use crate::electrical::formulas::impedance_magnitude;
use crate::electrical::validation::{
    validate_conductor_section, validate_non_negative, validate_positive, validate_voltage,
};
use crate::errors::{CalcError, CalcResult};

/// Voltage factor c_max for maximum fault currents
pub const VOLTAGE_FACTOR_MAX: f64 = 1.1;

/// X/R used when the loop has no resistance
pub const DEFAULT_X_R_RATIO: f64 = 10.0;

/// κ used above X/R = 3
pub const HIGH_X_R_PEAK_FACTOR: f64 = 1.8;

/// Ik'' above which currents are flagged as very high (A)
pub const HIGH_FAULT_CURRENT_A: f64 = 50_000.0;

/// Ik'' below which protection sensitivity is questioned (A)
pub const LOW_FAULT_CURRENT_A: f64 = 1_000.0;

/// Peak factor κ for a fault loop.
pub fn peak_factor(resistance: f64, reactance: f64) -> f64 {
    let x_r = x_r_ratio(resistance, reactance);
    if x_r <= 1.0 {
        1.02 + 0.98 * (-3.0 * resistance / reactance).exp()
    } else if x_r <= 3.0 {
        1.02 + 0.98 * (-3.0 / x_r).exp()
    } else {
        HIGH_X_R_PEAK_FACTOR
    }
}

/// X/R of a fault loop, 10 when R = 0.
pub fn x_r_ratio(resistance: f64, reactance: f64) -> f64 {
    if resistance > 0.0 {
        reactance / resistance
    } else {
        DEFAULT_X_R_RATIO
    }
}

// ============================================================================
// Input
// ============================================================================

fn default_voltage() -> f64 {
    LINE_VOLTAGE
}

fn default_source_power() -> f64 {
    1_000_000.0
}

fn default_transformer_power() -> f64 {
    630_000.0
}

fn default_transformer_impedance() -> f64 {
    5.0
}

fn default_cable_length() -> f64 {
    100.0
}

fn default_cable_section() -> f64 {
    240.0
}

fn default_clearing_time() -> f64 {
    0.2
}

/// A point of the installation to evaluate.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "cc-1",
///   "punto": "TG barras",
///   "tensionNominal": 380,
///   "potenciaCCFuente": 1000000,
///   "potenciaTransformador": 630000,
///   "impedanciaTransformador": 5.0,
///   "longitudCable": 100,
///   "seccionCable": 240,
///   "materialConductor": "cobre",
///   "tipoInstalacion": "cable_tripolar",
///   "tiempoEliminacion": 0.2,
///   "poderCorteProteccion": 25
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitPoint {
    pub id: String,

    #[serde(rename = "punto", default)]
    pub point: String,

    #[serde(rename = "tensionNominal", default = "default_voltage")]
    pub nominal_voltage_v: f64,

    /// Network short-circuit power at the source (VA)
    #[serde(rename = "potenciaCCFuente", default = "default_source_power")]
    pub source_power_va: f64,

    /// Transformer rating (VA)
    #[serde(rename = "potenciaTransformador", default = "default_transformer_power")]
    pub transformer_power_va: f64,

    /// Transformer short-circuit impedance (%)
    #[serde(rename = "impedanciaTransformador", default = "default_transformer_impedance")]
    pub transformer_impedance_pct: f64,

    #[serde(rename = "longitudCable", default = "default_cable_length")]
    pub cable_length_m: f64,

    #[serde(rename = "seccionCable", default = "default_cable_section")]
    pub cable_section_mm2: f64,

    #[serde(rename = "materialConductor", default)]
    pub material: ConductorMaterial,

    #[serde(rename = "tipoInstalacion", default)]
    pub installation: InstallationType,

    /// Protection clearing time (s)
    #[serde(rename = "tiempoEliminacion", default = "default_clearing_time")]
    pub clearing_time_s: f64,

    /// Rated breaking capacity of the protection (kA); unchecked when absent or 0
    #[serde(rename = "poderCorteProteccion", default, skip_serializing_if = "Option::is_none")]
    pub protection_breaking_capacity_ka: Option<f64>,
}

impl ShortCircuitPoint {
    /// Point with every optional parameter at its default.
    pub fn new(id: impl Into<String>) -> Self {
        ShortCircuitPoint {
            id: id.into(),
            point: String::new(),
            nominal_voltage_v: default_voltage(),
            source_power_va: default_source_power(),
            transformer_power_va: default_transformer_power(),
            transformer_impedance_pct: default_transformer_impedance(),
            cable_length_m: default_cable_length(),
            cable_section_mm2: default_cable_section(),
            material: ConductorMaterial::default(),
            installation: InstallationType::default(),
            clearing_time_s: default_clearing_time(),
            protection_breaking_capacity_ka: None,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::missing_field("id"));
        }
        validate_voltage("tensionNominal", self.nominal_voltage_v)?;
        validate_positive("potenciaCCFuente", self.source_power_va)?;
        validate_positive("potenciaTransformador", self.transformer_power_va)?;
        validate_non_negative("impedanciaTransformador", self.transformer_impedance_pct)?;
        validate_non_negative("longitudCable", self.cable_length_m)?;
        validate_non_negative("tiempoEliminacion", self.clearing_time_s)?;
        if let Some(rating) = self.protection_breaking_capacity_ka {
            validate_non_negative("poderCorteProteccion", rating)?;
        }
        Ok(())
    }

    /// Source impedance (Ω) from the network short-circuit power
    pub fn source_impedance(&self) -> f64 {
        let v = self.nominal_voltage_v;
        let source_current = self.source_power_va / (3f64.sqrt() * v);
        v / (3f64.sqrt() * source_current)
    }

    /// Transformer impedance (Ω) referred to the nominal voltage
    pub fn transformer_impedance(&self) -> f64 {
        let base = self.nominal_voltage_v.powi(2) / self.transformer_power_va;
        self.transformer_impedance_pct / 100.0 * base
    }

    /// Cable resistance (Ω)
    pub fn cable_resistance(&self) -> f64 {
        self.material.resistivity_20c() * self.cable_length_m / (1000.0 * self.cable_section_mm2)
    }

    /// Cable reactance (Ω)
    pub fn cable_reactance(&self) -> f64 {
        self.installation.reactance_ohm_per_km() * self.cable_length_m / (1000.0 * self.cable_section_mm2)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Severity of a fault level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultSeverity {
    /// Protection cannot break the fault
    Critico,
    /// Ik'' above 50 kA
    Advertencia,
    /// Ik'' below 1 kA
    Atencion,
    Normal,
}

impl FaultSeverity {
    pub fn classify(initial_current_a: f64, breaking_capacity_ok: Option<bool>) -> Self {
        if breaking_capacity_ok == Some(false) {
            FaultSeverity::Critico
        } else if initial_current_a > HIGH_FAULT_CURRENT_A {
            FaultSeverity::Advertencia
        } else if initial_current_a < LOW_FAULT_CURRENT_A {
            FaultSeverity::Atencion
        } else {
            FaultSeverity::Normal
        }
    }

    pub fn message(&self, initial_current_a: f64, required_capacity_ka: f64) -> String {
        match self {
            FaultSeverity::Critico => {
                format!("CRÍTICO - Poder de corte insuficiente. Se requiere ≥{required_capacity_ka:.1} kA")
            }
            FaultSeverity::Advertencia => {
                "ADVERTENCIA - Corriente muy alta. Verificar coordinación de protecciones".to_string()
            }
            FaultSeverity::Atencion => "ATENCIÓN - Corriente baja. Verificar sensibilidad de protecciones".to_string(),
            FaultSeverity::Normal => format!(
                "NORMAL - Icc = {initial_current_a:.0} A, Poder corte req. = {required_capacity_ka:.1} kA"
            ),
        }
    }
}

/// Fault currents and impedances at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitResult {
    pub id: String,
    #[serde(rename = "punto")]
    pub point: String,
    #[serde(rename = "tension_nominal")]
    pub nominal_voltage_v: f64,
    #[serde(rename = "impedancia_fuente")]
    pub source_impedance_ohm: f64,
    #[serde(rename = "impedancia_transformador")]
    pub transformer_impedance_ohm: f64,
    #[serde(rename = "resistencia_cable")]
    pub cable_resistance_ohm: f64,
    #[serde(rename = "reactancia_cable")]
    pub cable_reactance_ohm: f64,
    #[serde(rename = "impedancia_cable")]
    pub cable_impedance_ohm: f64,
    #[serde(rename = "resistencia_total")]
    pub total_resistance_ohm: f64,
    #[serde(rename = "reactancia_total")]
    pub total_reactance_ohm: f64,
    #[serde(rename = "impedancia_total")]
    pub total_impedance_ohm: f64,
    #[serde(rename = "relacion_x_r")]
    pub x_r_ratio: f64,
    #[serde(rename = "factor_pico")]
    pub peak_factor: f64,
    /// c_max · V
    #[serde(rename = "tension_maxima")]
    pub max_voltage_v: f64,
    /// Ik''
    #[serde(rename = "corriente_cc_inicial")]
    pub initial_current_a: f64,
    /// ip
    #[serde(rename = "corriente_cc_pico")]
    pub peak_current_a: f64,
    /// Ik
    #[serde(rename = "corriente_cc_permanente")]
    pub steady_state_current_a: f64,
    #[serde(rename = "poder_corte_necesario")]
    pub required_breaking_capacity_ka: f64,
    /// Ik''·√t
    #[serde(rename = "corriente_termica")]
    pub thermal_current_a: f64,
    /// I²t (A²s)
    #[serde(rename = "energia_especifica")]
    pub let_through_energy: f64,
    #[serde(rename = "tiempo_eliminacion")]
    pub clearing_time_s: f64,
    /// `None` when no protection rating was supplied
    #[serde(rename = "verificacion_poder_corte")]
    pub breaking_capacity_ok: Option<bool>,
    #[serde(rename = "nivel")]
    pub severity: FaultSeverity,
    #[serde(rename = "recomendacion")]
    pub recommendation: String,
}

/// Summary over several fault points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLevelSummary {
    #[serde(rename = "total_puntos")]
    pub total: usize,
    #[serde(rename = "corriente_cc_maxima")]
    pub max_initial_current_a: f64,
    #[serde(rename = "corriente_cc_minima")]
    pub min_initial_current_a: f64,
    /// max/min Ik''
    #[serde(rename = "factor_coordinacion")]
    pub coordination_factor: f64,
    #[serde(rename = "poder_corte_max_requerido")]
    pub max_required_breaking_capacity_ka: f64,
    #[serde(rename = "energia_max_pasante")]
    pub max_let_through_energy: f64,
    #[serde(rename = "recomendacion_general")]
    pub recommendation: String,
}

/// Detailed results plus summary of several fault points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLevels {
    #[serde(rename = "resultados_detallados")]
    pub results: Vec<ShortCircuitResult>,
    #[serde(rename = "resumen")]
    pub summary: FaultLevelSummary,
}

/// Suggested protection settings for a fault level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSettings {
    /// Residual-current trip (A)
    #[serde(rename = "ajuste_diferencial_recomendado")]
    pub differential_trip_a: f64,
    /// Overcurrent trip (A)
    #[serde(rename = "ajuste_sobrecorriente_recomendado")]
    pub overcurrent_trip_a: f64,
    /// Breaking capacity with 25 % margin (kA)
    #[serde(rename = "poder_corte_minimo")]
    pub min_breaking_capacity_ka: f64,
    #[serde(rename = "tiempo_actuacion_maximo")]
    pub max_operating_time_s: f64,
    #[serde(rename = "clase_limitacion_recomendada")]
    pub limiting_class: u8,
}

// ============================================================================
// Calculation
// ============================================================================

/// Calculate the fault currents at one point.
pub fn calculate(input: &ShortCircuitPoint) -> CalcResult<ShortCircuitResult> {
    debug!(id = %input.id, point = %input.point, "short-circuit calculation");
    compute(input).map_err(|e| CalcError::calculation_failed(Engine::ShortCircuit.name(), &input.id, e))
}

fn compute(input: &ShortCircuitPoint) -> CalcResult<ShortCircuitResult> {
    input.validate()?;
    validate_conductor_section("seccionCable", input.cable_section_mm2)?;

    let v = input.nominal_voltage_v;
    let source_impedance_ohm = input.source_impedance();
    let transformer_impedance_ohm = input.transformer_impedance();
    let cable_resistance_ohm = input.cable_resistance();
    let cable_reactance_ohm = input.cable_reactance();

    let total_resistance_ohm = cable_resistance_ohm;
    let total_reactance_ohm = source_impedance_ohm + transformer_impedance_ohm + cable_reactance_ohm;
    let total_impedance_ohm = impedance_magnitude(total_resistance_ohm, total_reactance_ohm);

    let max_voltage_v = v * VOLTAGE_FACTOR_MAX;
    let initial_current_a = max_voltage_v / (3f64.sqrt() * total_impedance_ohm);
    let kappa = peak_factor(total_resistance_ohm, total_reactance_ohm);
    let required_breaking_capacity_ka = 3f64.sqrt() * v * initial_current_a / 1000.0;

    let breaking_capacity_ok = input
        .protection_breaking_capacity_ka
        .filter(|&rating| rating > 0.0)
        .map(|rating| required_breaking_capacity_ka <= rating);

    let severity = FaultSeverity::classify(initial_current_a, breaking_capacity_ok);

    Ok(ShortCircuitResult {
        id: input.id.clone(),
        point: input.point.clone(),
        nominal_voltage_v: v,
        source_impedance_ohm,
        transformer_impedance_ohm,
        cable_resistance_ohm,
        cable_reactance_ohm,
        cable_impedance_ohm: impedance_magnitude(cable_resistance_ohm, cable_reactance_ohm),
        total_resistance_ohm,
        total_reactance_ohm,
        total_impedance_ohm,
        x_r_ratio: x_r_ratio(total_resistance_ohm, total_reactance_ohm),
        peak_factor: kappa,
        max_voltage_v,
        initial_current_a,
        peak_current_a: initial_current_a * kappa * 2f64.sqrt(),
        steady_state_current_a: initial_current_a,
        required_breaking_capacity_ka,
        thermal_current_a: initial_current_a * input.clearing_time_s.sqrt(),
        let_through_energy: initial_current_a.powi(2) * input.clearing_time_s,
        clearing_time_s: input.clearing_time_s,
        breaking_capacity_ok,
        severity,
        recommendation: severity.message(initial_current_a, required_breaking_capacity_ka),
    })
}

/// Evaluate several points and summarize the spread of fault currents.
///
/// An empty list is rejected. The first failing record aborts the batch.
pub fn calculate_fault_levels(inputs: &[ShortCircuitPoint]) -> CalcResult<FaultLevels> {
    let results = inputs.iter().map(calculate).collect::<CalcResult<Vec<_>>>()?;
    let summary = fault_level_summary(&results)?;
    info!(points = summary.total, max_ik = summary.max_initial_current_a, "fault levels calculated");
    Ok(FaultLevels { results, summary })
}

/// Summary over already computed results.
pub fn fault_level_summary(results: &[ShortCircuitResult]) -> CalcResult<FaultLevelSummary> {
    if results.is_empty() {
        return Err(CalcError::invalid_input(
            "puntos",
            "[]",
            "At least one fault point is required",
        ));
    }

    let currents = results.iter().map(|r| r.initial_current_a);
    let max_initial_current_a = currents.clone().fold(f64::NEG_INFINITY, f64::max);
    let min_initial_current_a = currents.fold(f64::INFINITY, f64::min);
    let coordination_factor = if min_initial_current_a > 0.0 {
        max_initial_current_a / min_initial_current_a
    } else {
        0.0
    };

    Ok(FaultLevelSummary {
        total: results.len(),
        max_initial_current_a,
        min_initial_current_a,
        coordination_factor,
        max_required_breaking_capacity_ka: results
            .iter()
            .map(|r| r.required_breaking_capacity_ka)
            .fold(f64::NEG_INFINITY, f64::max),
        max_let_through_energy: results.iter().map(|r| r.let_through_energy).fold(f64::NEG_INFINITY, f64::max),
        recommendation: system_recommendation(coordination_factor, max_initial_current_a).to_string(),
    })
}

/// System-level advice from the coordination factor and the highest Ik''.
pub fn system_recommendation(coordination_factor: f64, max_initial_current_a: f64) -> &'static str {
    if coordination_factor > 10.0 {
        "Sistema con amplio rango de corrientes - Verificar coordinación selectiva"
    } else if max_initial_current_a > HIGH_FAULT_CURRENT_A {
        "Altas corrientes de CC - Considerar limitadores de corriente"
    } else if coordination_factor < 2.0 {
        "Corrientes de CC similares - Facilita coordinación de protecciones"
    } else {
        "Sistema con niveles de falla adecuados para coordinación"
    }
}

/// Protection settings for a fault current and a nominal current (A).
pub fn suggest_protection_settings(fault_current_a: f64, nominal_current_a: f64) -> CalcResult<ProtectionSettings> {
    validate_non_negative("corriente_cc", fault_current_a)?;
    validate_non_negative("corriente_nominal", nominal_current_a)?;

    Ok(ProtectionSettings {
        differential_trip_a: (nominal_current_a * 0.1).max(0.03),
        overcurrent_trip_a: nominal_current_a * 1.25,
        min_breaking_capacity_ka: fault_current_a / 1000.0 * 1.25,
        max_operating_time_s: if fault_current_a > 0.0 { 4.0 / fault_current_a } else { 0.1 },
        limiting_class: if fault_current_a > 10_000.0 { 3 } else { 1 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_impedance() {
        let point = ShortCircuitPoint::new("cc");
        let expected = 0.05 * 380.0 * 380.0 / 630_000.0;
        assert!((point.transformer_impedance() - expected).abs() < 1e-15);
    }

    #[test]
    fn test_source_impedance() {
        // V / (√3 · S/(√3·V)) = V²/S
        let point = ShortCircuitPoint::new("cc");
        assert!((point.source_impedance() - 380.0 * 380.0 / 1e6).abs() < 1e-12);
    }

    #[test]
    fn test_default_point() {
        let result = calculate(&ShortCircuitPoint::new("cc")).unwrap();
        let r: f64 = 0.01724 * 100.0 / (1000.0 * 240.0);
        let x = 0.144_4 + 0.011_460_317_460_317_46 + 0.07 * 100.0 / (1000.0 * 240.0);
        let z = r.hypot(x);

        assert!((result.total_resistance_ohm - r).abs() < 1e-12);
        assert!((result.total_reactance_ohm - x).abs() < 1e-9);
        assert!((result.initial_current_a - 418.0 / (3f64.sqrt() * z)).abs() < 1e-3);
        assert_eq!(result.peak_factor, 1.8);
        assert_eq!(result.steady_state_current_a, result.initial_current_a);
        assert!(result.breaking_capacity_ok.is_none());
        assert_eq!(result.severity, FaultSeverity::Normal);
    }

    #[test]
    fn test_peak_exceeds_initial() {
        let mut point = ShortCircuitPoint::new("cc");
        point.cable_length_m = 2000.0;
        point.cable_section_mm2 = 1.5;
        let result = calculate(&point).unwrap();
        assert!(result.peak_current_a >= result.initial_current_a);
    }

    #[test]
    fn test_peak_factor_branches() {
        // X/R = 1 → 1.02 + 0.98·e⁻³
        assert!((peak_factor(1.0, 1.0) - (1.02 + 0.98 * (-3.0f64).exp())).abs() < 1e-12);
        // X/R = 2 → 1.02 + 0.98·e^(−1.5)
        assert!((peak_factor(1.0, 2.0) - (1.02 + 0.98 * (-1.5f64).exp())).abs() < 1e-12);
        assert_eq!(peak_factor(1.0, 5.0), 1.8);
        assert_eq!(peak_factor(0.0, 1.0), 1.8);
        assert_eq!(x_r_ratio(0.0, 1.0), 10.0);
    }

    #[test]
    fn test_derived_quantities() {
        let result = calculate(&ShortCircuitPoint::new("cc")).unwrap();
        let ik = result.initial_current_a;
        assert!((result.required_breaking_capacity_ka - 3f64.sqrt() * 380.0 * ik / 1000.0).abs() < 1e-9);
        assert!((result.thermal_current_a - ik * 0.2f64.sqrt()).abs() < 1e-9);
        assert!((result.let_through_energy - ik * ik * 0.2).abs() < 1e-6);
        assert!((result.max_voltage_v - 418.0).abs() < 1e-9);
    }

    #[test]
    fn test_breaking_capacity_check() {
        let mut point = ShortCircuitPoint::new("cc");
        let required = calculate(&point).unwrap().required_breaking_capacity_ka;

        point.protection_breaking_capacity_ka = Some(required * 2.0);
        assert_eq!(calculate(&point).unwrap().breaking_capacity_ok, Some(true));

        point.protection_breaking_capacity_ka = Some(required / 2.0);
        let result = calculate(&point).unwrap();
        assert_eq!(result.breaking_capacity_ok, Some(false));
        assert_eq!(result.severity, FaultSeverity::Critico);
        assert!(result.recommendation.starts_with("CRÍTICO - Poder de corte insuficiente"));

        point.protection_breaking_capacity_ka = Some(0.0);
        assert!(calculate(&point).unwrap().breaking_capacity_ok.is_none());
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(FaultSeverity::classify(60_000.0, Some(true)), FaultSeverity::Advertencia);
        assert_eq!(FaultSeverity::classify(500.0, None), FaultSeverity::Atencion);
        assert_eq!(FaultSeverity::classify(5_000.0, None), FaultSeverity::Normal);
        assert_eq!(
            FaultSeverity::Normal.message(5_000.4, 3.29),
            "NORMAL - Icc = 5000 A, Poder corte req. = 3.3 kA"
        );
    }

    #[test]
    fn test_invalid_point_names_record() {
        let mut point = ShortCircuitPoint::new("cc-bad");
        point.transformer_power_va = 0.0;
        let err = calculate(&point).unwrap_err();
        assert_eq!(err.record_id(), Some("cc-bad"));
        assert_eq!(err.engine(), Some("Short-Circuit"));
    }

    #[test]
    fn test_fault_levels() {
        let near = ShortCircuitPoint::new("near");
        let mut far = ShortCircuitPoint::new("far");
        far.cable_length_m = 3000.0;
        far.cable_section_mm2 = 2.5;

        let levels = calculate_fault_levels(&[near, far]).unwrap();
        let s = &levels.summary;
        assert_eq!(s.total, 2);
        assert_eq!(s.max_initial_current_a, levels.results[0].initial_current_a);
        assert_eq!(s.min_initial_current_a, levels.results[1].initial_current_a);
        assert!((s.coordination_factor - s.max_initial_current_a / s.min_initial_current_a).abs() < 1e-12);
        assert_eq!(s.max_required_breaking_capacity_ka, levels.results[0].required_breaking_capacity_ka);
    }

    #[test]
    fn test_fault_levels_empty_rejected() {
        assert!(calculate_fault_levels(&[]).is_err());
    }

    #[test]
    fn test_system_recommendation() {
        assert!(system_recommendation(12.0, 60_000.0).starts_with("Sistema con amplio rango"));
        assert!(system_recommendation(5.0, 60_000.0).starts_with("Altas corrientes"));
        assert!(system_recommendation(1.5, 5_000.0).starts_with("Corrientes de CC similares"));
        assert!(system_recommendation(5.0, 5_000.0).starts_with("Sistema con niveles"));
    }

    #[test]
    fn test_protection_settings() {
        let settings = suggest_protection_settings(20_000.0, 100.0).unwrap();
        assert!((settings.differential_trip_a - 10.0).abs() < 1e-12);
        assert!((settings.overcurrent_trip_a - 125.0).abs() < 1e-12);
        assert!((settings.min_breaking_capacity_ka - 25.0).abs() < 1e-12);
        assert!((settings.max_operating_time_s - 0.0002).abs() < 1e-15);
        assert_eq!(settings.limiting_class, 3);

        let small = suggest_protection_settings(0.0, 0.1).unwrap();
        assert_eq!(small.differential_trip_a, 0.03);
        assert_eq!(small.max_operating_time_s, 0.1);
        assert_eq!(small.limiting_class, 1);

        assert!(suggest_protection_settings(-1.0, 10.0).is_err());
    }

    #[test]
    fn test_json_defaults() {
        let point: ShortCircuitPoint = serde_json::from_str(r#"{"id": "cc", "punto": "TG"}"#).unwrap();
        assert_eq!(point, ShortCircuitPoint { point: "TG".to_string(), ..ShortCircuitPoint::new("cc") });
        assert_eq!(point.installation, InstallationType::MultiCoreCable);

        let out = serde_json::to_value(calculate(&point).unwrap()).unwrap();
        assert!(out["verificacion_poder_corte"].is_null());
        assert_eq!(out["nivel"], "NORMAL");
    }
}
