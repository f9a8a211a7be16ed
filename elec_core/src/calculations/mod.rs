//! # Calculation Engines
//!
//! Every engine follows the same shape:
//!
//! - an input record (JSON-serializable, Spanish wire names)
//! - a result record echoing the identifying fields
//! - `calculate(&input) -> CalcResult<Result>`, a pure function that wraps
//!   any failure in [`CalcError::CalculationFailed`] with the engine name
//!   and record id
//!
//! plus type-specific batch and summary helpers.
//!
//! ## Available Engines
//!
//! - [`dpms`] - Simultaneous maximum demand of a room/panel
//! - [`loads_per_panel`] - Per-circuit quantities and panel totals
//! - [`thermal`] - Conductor ampacity check
//! - [`voltage_drop`] - Voltage drop along a cable run
//! - [`short_circuit`] - Fault levels and protection sizing
//!
//! ## Untyped records
//!
//! [`calculate_record`] and [`calculate_batch`] accept plain
//! `serde_json::Value` records, for shells that receive JSON and do not
//! want to name the input types.
//!
//! ```rust
//! use elec_core::calculations::{calculate_batch, BatchMode, Engine};
//! use serde_json::json;
//!
//! let records = vec![json!({"id": "t-1", "corriente": 10.0, "seccion": 2.5})];
//! let response = calculate_batch(Engine::Thermal, &records, BatchMode::AllOrNothing).unwrap();
//! assert_eq!(response.results.len(), 1);
//! ```

pub mod dpms;
pub mod loads_per_panel;
pub mod short_circuit;
pub mod thermal;
pub mod voltage_drop;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::{CalcError, CalcResult};

pub use dpms::{DpmsResult, PanelEnvironment};
pub use loads_per_panel::{CircuitLoad, LoadResult};
pub use short_circuit::{ShortCircuitPoint, ShortCircuitResult};
pub use thermal::{ThermalCheck, ThermalResult};
pub use voltage_drop::{VoltageDropCheck, VoltageDropResult};

/// The calculation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    Dpms,
    LoadsPerPanel,
    Thermal,
    VoltageDrop,
    ShortCircuit,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::Dpms,
        Engine::LoadsPerPanel,
        Engine::Thermal,
        Engine::VoltageDrop,
        Engine::ShortCircuit,
    ];

    /// Display name, as carried by engine errors
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Dpms => "DPMS",
            Engine::LoadsPerPanel => "Loads-per-Panel",
            Engine::Thermal => "Thermal",
            Engine::VoltageDrop => "Voltage-Drop",
            Engine::ShortCircuit => "Short-Circuit",
        }
    }

    /// Kebab-case identifier used on the command line and in JSON
    pub fn slug(&self) -> &'static str {
        match self {
            Engine::Dpms => "dpms",
            Engine::LoadsPerPanel => "loads-per-panel",
            Engine::Thermal => "thermal",
            Engine::VoltageDrop => "voltage-drop",
            Engine::ShortCircuit => "short-circuit",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Engine {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|engine| engine.slug() == s)
            .ok_or_else(|| CalcError::invalid_input("engine", s, "Unknown calculation engine"))
    }
}

/// What a batch does when one record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// The first failure rejects the whole batch
    #[default]
    AllOrNothing,
    /// Each record succeeds or fails on its own; input order is kept
    Isolated,
}

/// Enum wrapper over every engine input.
///
/// Lets a project hold heterogeneous calculations in one list while
/// keeping each input typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    Dpms(PanelEnvironment),
    LoadsPerPanel(CircuitLoad),
    Thermal(ThermalCheck),
    VoltageDrop(VoltageDropCheck),
    ShortCircuit(ShortCircuitPoint),
}

impl CalculationItem {
    /// Parse an untyped record for `engine`.
    ///
    /// Malformed records fail as `CalculationFailed`, naming the engine and
    /// the record id when one can be read.
    pub fn from_record(engine: Engine, record: &Value) -> CalcResult<Self> {
        fn parse<T: serde::de::DeserializeOwned>(engine: Engine, record: &Value) -> CalcResult<T> {
            T::deserialize(record).map_err(|e| {
                CalcError::calculation_failed(engine.name(), record_id_of(record), CalcError::serialization(e.to_string()))
            })
        }

        Ok(match engine {
            Engine::Dpms => CalculationItem::Dpms(parse(engine, record)?),
            Engine::LoadsPerPanel => CalculationItem::LoadsPerPanel(parse(engine, record)?),
            Engine::Thermal => CalculationItem::Thermal(parse(engine, record)?),
            Engine::VoltageDrop => CalculationItem::VoltageDrop(parse(engine, record)?),
            Engine::ShortCircuit => CalculationItem::ShortCircuit(parse(engine, record)?),
        })
    }

    pub fn engine(&self) -> Engine {
        match self {
            CalculationItem::Dpms(_) => Engine::Dpms,
            CalculationItem::LoadsPerPanel(_) => Engine::LoadsPerPanel,
            CalculationItem::Thermal(_) => Engine::Thermal,
            CalculationItem::VoltageDrop(_) => Engine::VoltageDrop,
            CalculationItem::ShortCircuit(_) => Engine::ShortCircuit,
        }
    }

    /// Id of the wrapped record
    pub fn record_id(&self) -> &str {
        match self {
            CalculationItem::Dpms(i) => &i.id,
            CalculationItem::LoadsPerPanel(i) => &i.id,
            CalculationItem::Thermal(i) => &i.id,
            CalculationItem::VoltageDrop(i) => &i.id,
            CalculationItem::ShortCircuit(i) => &i.id,
        }
    }

    /// Run the matching engine.
    pub fn calculate(&self) -> CalcResult<CalculationOutput> {
        Ok(match self {
            CalculationItem::Dpms(i) => CalculationOutput::Dpms(dpms::calculate(i)?),
            CalculationItem::LoadsPerPanel(i) => CalculationOutput::LoadsPerPanel(loads_per_panel::calculate(i)?),
            CalculationItem::Thermal(i) => CalculationOutput::Thermal(thermal::calculate(i)?),
            CalculationItem::VoltageDrop(i) => CalculationOutput::VoltageDrop(voltage_drop::calculate(i)?),
            CalculationItem::ShortCircuit(i) => CalculationOutput::ShortCircuit(short_circuit::calculate(i)?),
        })
    }
}

/// Result of any engine. Serializes as the bare result record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CalculationOutput {
    Dpms(DpmsResult),
    LoadsPerPanel(LoadResult),
    Thermal(ThermalResult),
    VoltageDrop(VoltageDropResult),
    ShortCircuit(ShortCircuitResult),
}

/// One slot of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Computed(Value),
    Failed { error: CalcError },
}

impl BatchEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchEntry::Failed { .. })
    }
}

/// `{"results": [...]}` envelope returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

/// Record id of an untyped record, empty when absent.
pub fn record_id_of(record: &Value) -> &str {
    record.get("id").and_then(Value::as_str).unwrap_or_default()
}

/// Split a JSON document into records: an array yields its elements, any
/// other value is a single record.
pub fn into_records(document: Value) -> Vec<Value> {
    match document {
        Value::Array(records) => records,
        record => vec![record],
    }
}

/// Calculate one untyped record with `engine`.
pub fn calculate_record(engine: Engine, record: &Value) -> CalcResult<Value> {
    let output = CalculationItem::from_record(engine, record)?.calculate()?;
    Ok(serde_json::to_value(output)?)
}

/// Calculate a list of untyped records, preserving input order.
pub fn calculate_batch(engine: Engine, records: &[Value], mode: BatchMode) -> CalcResult<BatchResponse> {
    let results = match mode {
        BatchMode::AllOrNothing => records
            .iter()
            .map(|record| calculate_record(engine, record).map(BatchEntry::Computed))
            .collect::<CalcResult<Vec<_>>>()?,
        BatchMode::Isolated => records
            .iter()
            .map(|record| match calculate_record(engine, record) {
                Ok(value) => BatchEntry::Computed(value),
                Err(error) => BatchEntry::Failed { error },
            })
            .collect(),
    };

    let failed = results.iter().filter(|entry| entry.is_failed()).count();
    info!(engine = engine.slug(), total = results.len(), failed, "batch calculated");
    Ok(BatchResponse { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_slugs() {
        for engine in Engine::ALL {
            assert_eq!(engine.slug().parse::<Engine>().unwrap(), engine);
            let json = serde_json::to_string(&engine).unwrap();
            assert_eq!(json, format!("\"{}\"", engine.slug()));
        }
        assert!("load-flow".parse::<Engine>().is_err());
    }

    #[test]
    fn test_calculate_record() {
        let record = json!({"id": "c-1", "identificacionTablero": "TG", "lineaOCarga": "L1", "potenciaAparente": 2.2});
        let out = calculate_record(Engine::LoadsPerPanel, &record).unwrap();
        assert_eq!(out["id"], "c-1");
        assert!((out["corriente_nominal"].as_f64().unwrap() - 10.0).abs() < 1e-9);
        // Untagged output: no type discriminator
        assert!(out.get("type").is_none());
    }

    #[test]
    fn test_malformed_record_names_engine_and_id() {
        let record = json!({"id": "t-9", "corriente": "mucho"});
        let err = calculate_record(Engine::Thermal, &record).unwrap_err();
        assert_eq!(err.engine(), Some("Thermal"));
        assert_eq!(err.record_id(), Some("t-9"));
        assert_eq!(err.root_cause().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_missing_required_field() {
        // Missing dimensions
        let record = json!({"id": "amb", "denominacionTablero": "TS", "denominacionAmbiente": "Hall"});
        let err = calculate_record(Engine::Dpms, &record).unwrap_err();
        assert_eq!(err.record_id(), Some("amb"));
        assert!(err.to_string().contains("dimensiones"));
    }

    #[test]
    fn test_all_or_nothing_batch() {
        let records = vec![
            json!({"id": "a", "corriente": 10.0}),
            json!({"id": "b", "corriente": -1.0}),
            json!({"id": "c", "corriente": 5.0}),
        ];
        let err = calculate_batch(Engine::Thermal, &records, BatchMode::AllOrNothing).unwrap_err();
        assert_eq!(err.record_id(), Some("b"));
    }

    #[test]
    fn test_isolated_batch_keeps_order() {
        let records = vec![
            json!({"id": "a", "corriente": 10.0}),
            json!({"id": "b", "corriente": -1.0}),
            json!({"id": "c", "corriente": 5.0}),
        ];
        let response = calculate_batch(Engine::Thermal, &records, BatchMode::Isolated).unwrap();
        assert_eq!(response.results.len(), 3);
        assert!(!response.results[0].is_failed());
        assert!(response.results[1].is_failed());
        assert!(!response.results[2].is_failed());

        let out = serde_json::to_value(&response).unwrap();
        assert_eq!(out["results"][0]["id"], "a");
        assert_eq!(out["results"][1]["error"]["type"], "CalculationFailed");
        assert_eq!(out["results"][2]["id"], "c");
    }

    #[test]
    fn test_into_records() {
        assert_eq!(into_records(json!([{"id": "a"}, {"id": "b"}])).len(), 2);
        assert_eq!(into_records(json!({"id": "a"})).len(), 1);
    }

    #[test]
    fn test_item_tagging() {
        let item = CalculationItem::Thermal(ThermalCheck {
            id: "t".to_string(),
            circuit: "C1".to_string(),
            design_current_a: 10.0,
            section_mm2: 2.5,
            ambient_temperature_c: 40.0,
            conductor_count: 3,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "Thermal");
        let roundtrip: CalculationItem = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, item);
        assert_eq!(roundtrip.engine(), Engine::Thermal);
        assert_eq!(roundtrip.record_id(), "t");
    }
}
