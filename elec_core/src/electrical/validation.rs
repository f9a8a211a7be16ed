//! # Parameter Validation
//!
//! Domain checks run before any formula executes. Out-of-domain values
//! (voltage ≤ 0, negative current, cos φ outside [0.1, 1.0], temperature
//! outside [-40, 120] °C) are rejected with [`CalcError::InvalidInput`].
//!
//! A cross-section that is not in the standard list is *not* an error: it
//! is reported with its nearest standard value and a `tracing` warning, and
//! the calculation proceeds.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::constants::{
    MAX_DISTRIBUTION_VOLTAGE, MAX_LOAD_CURRENT, MAX_TEMPERATURE_C, MIN_POWER_FACTOR,
    MIN_TEMPERATURE_C, STANDARD_SECTIONS_MM2,
};
use super::interpolation::nearest;
use crate::errors::{CalcError, CalcResult};

fn require_finite(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be a finite number"));
    }
    Ok(())
}

/// Voltage must be in (0, 50 000] V.
pub fn validate_voltage(field: &str, voltage: f64) -> CalcResult<()> {
    require_finite(field, voltage)?;
    if voltage <= 0.0 {
        return Err(CalcError::invalid_input(field, voltage.to_string(), "Voltage must be positive"));
    }
    if voltage > MAX_DISTRIBUTION_VOLTAGE {
        return Err(CalcError::invalid_input(
            field,
            voltage.to_string(),
            "Voltage outside the typical distribution range (max 50 kV)",
        ));
    }
    Ok(())
}

/// Load current must be in [0, 10 000] A.
pub fn validate_current(field: &str, current: f64) -> CalcResult<()> {
    require_finite(field, current)?;
    if current < 0.0 {
        return Err(CalcError::invalid_input(field, current.to_string(), "Current cannot be negative"));
    }
    if current > MAX_LOAD_CURRENT {
        return Err(CalcError::invalid_input(
            field,
            current.to_string(),
            "Current outside the typical range (max 10 kA)",
        ));
    }
    Ok(())
}

/// cos φ must be in [0.1, 1.0].
pub fn validate_power_factor(field: &str, cos_phi: f64) -> CalcResult<()> {
    require_finite(field, cos_phi)?;
    if !(MIN_POWER_FACTOR..=1.0).contains(&cos_phi) {
        return Err(CalcError::invalid_input(
            field,
            cos_phi.to_string(),
            "Power factor must be between 0.1 and 1.0",
        ));
    }
    Ok(())
}

/// Temperature must be in [-40, 120] °C.
pub fn validate_temperature(field: &str, temperature_c: f64) -> CalcResult<()> {
    require_finite(field, temperature_c)?;
    if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&temperature_c) {
        return Err(CalcError::invalid_input(
            field,
            temperature_c.to_string(),
            "Temperature outside the operating range (-40 °C to 120 °C)",
        ));
    }
    Ok(())
}

/// Value must be finite and ≥ 0.
pub fn validate_non_negative(field: &str, value: f64) -> CalcResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value cannot be negative"));
    }
    Ok(())
}

/// Value must be finite and > 0.
pub fn validate_positive(field: &str, value: f64) -> CalcResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
    }
    Ok(())
}

/// Outcome of a cross-section check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionCheck {
    /// Section as supplied (mm²)
    pub requested_mm2: f64,
    /// Whether it is one of the standard sections
    pub is_standard: bool,
    /// Closest standard section (equal to `requested_mm2` when standard)
    pub nearest_standard_mm2: f64,
}

/// Check a conductor cross-section against the standard list.
///
/// Non-positive sections are rejected. Non-standard sections produce a
/// warning and report the nearest standard value.
pub fn validate_conductor_section(field: &str, section_mm2: f64) -> CalcResult<SectionCheck> {
    validate_positive(field, section_mm2)?;

    let is_standard = STANDARD_SECTIONS_MM2.contains(&section_mm2);
    let nearest_standard_mm2 = if is_standard {
        section_mm2
    } else {
        let closest = nearest(&STANDARD_SECTIONS_MM2, section_mm2).unwrap_or(section_mm2);
        warn!(
            field = field,
            requested_mm2 = section_mm2,
            nearest_mm2 = closest,
            "non-standard conductor section"
        );
        closest
    };

    Ok(SectionCheck {
        requested_mm2: section_mm2,
        is_standard,
        nearest_standard_mm2,
    })
}

/// A free-form set of parameters to check in one go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectricalParameters {
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,
    #[serde(default)]
    pub conductor_section: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Which of the supplied parameters were checked. Absent parameters stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_factor_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_section_valid: Option<bool>,
    /// Nearest standard section when the supplied one is non-standard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_section_nearest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_valid: Option<bool>,
}

/// Validate every parameter present, failing on the first invalid one.
pub fn validate_parameters(params: &ElectricalParameters) -> CalcResult<ParameterValidation> {
    let mut report = ParameterValidation::default();

    if let Some(voltage) = params.voltage {
        validate_voltage("voltage", voltage)?;
        report.voltage_valid = Some(true);
    }
    if let Some(current) = params.current {
        validate_current("current", current)?;
        report.current_valid = Some(true);
    }
    if let Some(cos_phi) = params.power_factor {
        validate_power_factor("power_factor", cos_phi)?;
        report.power_factor_valid = Some(true);
    }
    if let Some(section) = params.conductor_section {
        let check = validate_conductor_section("conductor_section", section)?;
        report.conductor_section_valid = Some(true);
        if !check.is_standard {
            report.conductor_section_nearest = Some(check.nearest_standard_mm2);
        }
    }
    if let Some(temperature) = params.temperature {
        validate_temperature("temperature", temperature)?;
        report.temperature_valid = Some(true);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_bounds() {
        assert!(validate_voltage("v", 220.0).is_ok());
        assert!(validate_voltage("v", 50_000.0).is_ok());
        assert!(validate_voltage("v", 0.0).is_err());
        assert!(validate_voltage("v", -380.0).is_err());
        assert!(validate_voltage("v", 50_001.0).is_err());
        assert!(validate_voltage("v", f64::NAN).is_err());
    }

    #[test]
    fn test_current_bounds() {
        assert!(validate_current("i", 0.0).is_ok());
        assert!(validate_current("i", -0.1).is_err());
        assert!(validate_current("i", 10_001.0).is_err());
    }

    #[test]
    fn test_power_factor_bounds() {
        assert!(validate_power_factor("pf", 0.1).is_ok());
        assert!(validate_power_factor("pf", 1.0).is_ok());
        assert!(validate_power_factor("pf", 0.05).is_err());
        assert!(validate_power_factor("pf", 1.01).is_err());
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(validate_temperature("t", -40.0).is_ok());
        assert!(validate_temperature("t", 120.0).is_ok());
        assert!(validate_temperature("t", 121.0).is_err());
        assert!(validate_temperature("t", -41.0).is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = validate_voltage("tensionNominal", 0.0).unwrap_err();
        match err {
            CalcError::InvalidInput { field, .. } => assert_eq!(field, "tensionNominal"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_standard_section() {
        let check = validate_conductor_section("seccion", 2.5).unwrap();
        assert!(check.is_standard);
        assert_eq!(check.nearest_standard_mm2, 2.5);
    }

    #[test]
    fn test_non_standard_section_is_not_an_error() {
        let check = validate_conductor_section("seccion", 3.0).unwrap();
        assert!(!check.is_standard);
        assert_eq!(check.nearest_standard_mm2, 2.5);

        let check = validate_conductor_section("seccion", 20.0).unwrap();
        assert_eq!(check.nearest_standard_mm2, 16.0);
    }

    #[test]
    fn test_zero_section_rejected() {
        assert!(validate_conductor_section("seccion", 0.0).is_err());
    }

    #[test]
    fn test_validate_parameters_report() {
        let params = ElectricalParameters {
            voltage: Some(380.0),
            conductor_section: Some(5.0),
            ..Default::default()
        };
        let report = validate_parameters(&params).unwrap();
        assert_eq!(report.voltage_valid, Some(true));
        assert_eq!(report.conductor_section_valid, Some(true));
        assert_eq!(report.conductor_section_nearest, Some(4.0));
        assert_eq!(report.current_valid, None);

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("current_valid"));
    }

    #[test]
    fn test_validate_parameters_rejects() {
        let params = ElectricalParameters {
            power_factor: Some(1.5),
            ..Default::default()
        };
        assert!(validate_parameters(&params).is_err());
    }
}
