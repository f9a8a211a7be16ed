//! # Electrical Formulas
//!
//! Validated formula functions shared by the engines.
//!
//! ```text
//! I (1φ)  = P / (V · cos φ)
//! I (3φ)  = P / (√3 · V · cos φ)
//! ΔV      = 2 · I · R · L                        (approximate, single-phase)
//! ΔV      = I · |(R cos φ + X sin φ), (X cos φ − R sin φ)|   (exact vector form)
//! R(T)    = R₂₀ · (1 + α · (T − 20))
//! ```
//!
//! ## Example
//!
//! ```rust
//! use elec_core::electrical::formulas::three_phase_current;
//!
//! // 10 kW at 380 V, cos φ = 0.85
//! let i = three_phase_current(10.0, 380.0, 0.85).unwrap();
//! assert!((i - 17.87).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

use super::constants::REFERENCE_TEMPERATURE_C;
use super::validation::{
    validate_current, validate_non_negative, validate_positive, validate_power_factor,
    validate_temperature, validate_voltage,
};
use crate::errors::{CalcError, CalcResult};

/// Number of phases of a supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phases {
    #[default]
    Single,
    Three,
}

/// sin φ from cos φ, taken as 0 for cos φ ≥ 1.
pub fn sin_phi(cos_phi: f64) -> f64 {
    if cos_phi >= 1.0 {
        0.0
    } else {
        (1.0 - cos_phi * cos_phi).sqrt()
    }
}

/// Temperature correction multiplier 1 + α·(T − 20).
pub fn temperature_factor(alpha: f64, temperature_c: f64) -> f64 {
    1.0 + alpha * (temperature_c - REFERENCE_TEMPERATURE_C)
}

/// Magnitude of R + jX.
pub fn impedance_magnitude(resistance: f64, reactance: f64) -> f64 {
    resistance.hypot(reactance)
}

/// Single-phase current (A) for an active power in kW.
pub fn single_phase_current(power_kw: f64, voltage: f64, cos_phi: f64) -> CalcResult<f64> {
    validate_voltage("voltage", voltage)?;
    validate_power_factor("cos_phi", cos_phi)?;
    Ok(power_kw * 1000.0 / (voltage * cos_phi))
}

/// Three-phase line current (A) for an active power in kW.
pub fn three_phase_current(power_kw: f64, voltage_line: f64, cos_phi: f64) -> CalcResult<f64> {
    validate_voltage("voltage_line", voltage_line)?;
    validate_power_factor("cos_phi", cos_phi)?;
    Ok(power_kw * 1000.0 / (3f64.sqrt() * voltage_line * cos_phi))
}

/// Active power (kW) drawn at a given current and voltage.
pub fn power_from_current_voltage(current: f64, voltage: f64, cos_phi: f64, phases: Phases) -> CalcResult<f64> {
    validate_current("current", current)?;
    validate_voltage("voltage", voltage)?;
    validate_power_factor("cos_phi", cos_phi)?;
    let watts = match phases {
        Phases::Single => voltage * current * cos_phi,
        Phases::Three => 3f64.sqrt() * voltage * current * cos_phi,
    };
    Ok(watts / 1000.0)
}

/// Approximate single-phase voltage drop ΔV = 2·I·R·L.
///
/// `resistance` is per km, `length_km` in km.
pub fn voltage_drop_single_phase(current: f64, resistance: f64, length_km: f64) -> CalcResult<f64> {
    validate_current("current", current)?;
    Ok(2.0 * current * resistance * length_km)
}

/// Components of the exact voltage-drop vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropComponents {
    /// I·(R·cos φ + X·sin φ)
    pub active_v: f64,
    /// I·(X·cos φ − R·sin φ)
    pub reactive_v: f64,
    /// Vector magnitude
    pub total_v: f64,
}

/// Exact voltage-drop vector for total run resistance and reactance (Ω).
pub fn voltage_drop_components(current: f64, resistance: f64, reactance: f64, cos_phi: f64) -> VoltageDropComponents {
    let sin = sin_phi(cos_phi);
    let active_v = current * (resistance * cos_phi + reactance * sin);
    let reactive_v = current * (reactance * cos_phi - resistance * sin);
    VoltageDropComponents {
        active_v,
        reactive_v,
        total_v: active_v.hypot(reactive_v),
    }
}

/// Exact voltage drop (V) for per-km resistance and reactance over `length_km`.
pub fn voltage_drop_exact(current: f64, resistance: f64, reactance: f64, length_km: f64, cos_phi: f64) -> CalcResult<f64> {
    validate_current("current", current)?;
    validate_power_factor("cos_phi", cos_phi)?;
    validate_non_negative("length_km", length_km)?;
    Ok(voltage_drop_components(current, resistance * length_km, reactance * length_km, cos_phi).total_v)
}

/// Resistance corrected to `temperature_c` with coefficient `alpha`.
pub fn temperature_corrected_resistance(resistance_20c: f64, temperature_c: f64, alpha: f64) -> CalcResult<f64> {
    validate_temperature("temperature", temperature_c)?;
    Ok(resistance_20c * temperature_factor(alpha, temperature_c))
}

/// Three-phase symmetric fault current V / (√3·Z).
pub fn short_circuit_current(voltage: f64, impedance: f64) -> CalcResult<f64> {
    validate_voltage("voltage", voltage)?;
    validate_positive("impedance", impedance)?;
    Ok(voltage / (3f64.sqrt() * impedance))
}

/// Two impedances in parallel.
pub fn impedance_parallel(z1: f64, z2: f64) -> CalcResult<f64> {
    validate_positive("z1", z1)?;
    validate_positive("z2", z2)?;
    Ok(z1 * z2 / (z1 + z2))
}

/// Impedances in series.
pub fn impedance_series(impedances: &[f64]) -> CalcResult<f64> {
    impedances.iter().enumerate().try_fold(0.0, |total, (i, &z)| {
        if !z.is_finite() || z < 0.0 {
            return Err(CalcError::invalid_input(
                format!("impedances[{i}]"),
                z.to_string(),
                "Impedances must be non-negative",
            ));
        }
        Ok(total + z)
    })
}
