//! # Loads per Panel
//!
//! Per-circuit electrical quantities (active/reactive power, nominal and
//! design current) and their aggregation per distribution panel.
//!
//! ## Method
//!
//! ```text
//! P = S · cos φ        Q = S · sin φ
//! I (RST, RSTN) = S·1000 / (√3 · 380)
//! I (RS, ST, RT) = S·1000 / 380
//! I (RN, SN, TN) = S·1000 / 220
//! I_design = I · class_factor      I_mean = I_design · load_factor
//! ```
//!
//! Apparent power is given in kVA, so active and reactive power come out
//! in kW and kvar.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Engine;
use crate::electrical::constants::{DEFAULT_POWER_FACTOR, LINE_VOLTAGE, PHASE_VOLTAGE};
use crate::electrical::formulas::sin_phi;
use crate::electrical::validation::{validate_non_negative, validate_power_factor};
use crate::errors::{CalcError, CalcResult};

/// Diversity factor applied to panels with more than this many loads
pub const DIVERSITY_THRESHOLD: usize = 3;

// ============================================================================
// Load class and feed type
// ============================================================================

/// Service class of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoadClass {
    #[default]
    Normal,
    Emergencia,
    #[serde(rename = "Crítica", alias = "Critica")]
    Critica,
}

impl LoadClass {
    pub const ALL: [LoadClass; 3] = [LoadClass::Normal, LoadClass::Emergencia, LoadClass::Critica];

    /// Multiplier from nominal to design current
    pub fn correction_factor(&self) -> f64 {
        match self {
            LoadClass::Normal => 1.0,
            LoadClass::Emergencia => 1.25,
            LoadClass::Critica => 1.5,
        }
    }

    /// Empirical ratio of mean to design current
    pub fn load_factor(&self) -> f64 {
        match self {
            LoadClass::Normal => 0.75,
            LoadClass::Emergencia | LoadClass::Critica => 0.9,
        }
    }
}

/// Phases a circuit is connected between.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FeedType {
    #[default]
    RN,
    SN,
    TN,
    RS,
    ST,
    RT,
    RST,
    RSTN,
}

/// How a feed type turns apparent power into current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedBasis {
    /// Phase-to-neutral, 220 V
    SinglePhase,
    /// Line-to-line without √3, 380 V
    TwoPhase,
    /// Balanced three-phase, 380 V
    ThreePhase,
}

impl FeedType {
    pub const ALL: [FeedType; 8] = [
        FeedType::RN,
        FeedType::SN,
        FeedType::TN,
        FeedType::RS,
        FeedType::ST,
        FeedType::RT,
        FeedType::RST,
        FeedType::RSTN,
    ];

    pub fn basis(&self) -> FeedBasis {
        match self {
            FeedType::RN | FeedType::SN | FeedType::TN => FeedBasis::SinglePhase,
            FeedType::RS | FeedType::ST | FeedType::RT => FeedBasis::TwoPhase,
            FeedType::RST | FeedType::RSTN => FeedBasis::ThreePhase,
        }
    }

    /// Nominal voltage (V) of the feed
    pub fn nominal_voltage(&self) -> f64 {
        match self.basis() {
            FeedBasis::SinglePhase => PHASE_VOLTAGE,
            FeedBasis::TwoPhase | FeedBasis::ThreePhase => LINE_VOLTAGE,
        }
    }

    /// Current (A) drawn for an apparent power in kVA
    pub fn current_for(&self, apparent_power_kva: f64) -> f64 {
        let va = apparent_power_kva * 1000.0;
        match self.basis() {
            FeedBasis::SinglePhase => va / PHASE_VOLTAGE,
            FeedBasis::TwoPhase => va / LINE_VOLTAGE,
            FeedBasis::ThreePhase => va / (3f64.sqrt() * LINE_VOLTAGE),
        }
    }
}

// ============================================================================
// Input / result
// ============================================================================

fn default_cos_phi() -> f64 {
    DEFAULT_POWER_FACTOR
}

/// One circuit/load hanging from a panel.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "c-1",
///   "identificacionTablero": "TG",
///   "lineaOCarga": "Bomba de agua",
///   "tipoCarga": "Emergencia",
///   "alimentacion": "RSTN",
///   "potenciaAparente": 10.0,
///   "cosPhi": 0.85
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitLoad {
    pub id: String,

    #[serde(rename = "identificacionTablero")]
    pub panel_id: String,

    #[serde(rename = "lineaOCarga")]
    pub line_id: String,

    #[serde(rename = "tipoCarga", default)]
    pub class: LoadClass,

    #[serde(rename = "alimentacion", default)]
    pub feed: FeedType,

    /// Apparent power (kVA)
    #[serde(rename = "potenciaAparente", default)]
    pub apparent_power_kva: f64,

    #[serde(rename = "cosPhi", default = "default_cos_phi")]
    pub cos_phi: f64,
}

impl CircuitLoad {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::missing_field("id"));
        }
        validate_non_negative("potenciaAparente", self.apparent_power_kva)?;
        validate_power_factor("cosPhi", self.cos_phi)?;
        Ok(())
    }
}

/// Electrical quantities of one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub id: String,
    #[serde(rename = "identificacionTablero")]
    pub panel_id: String,
    #[serde(rename = "lineaOCarga")]
    pub line_id: String,
    #[serde(rename = "tipoCarga")]
    pub class: LoadClass,
    #[serde(rename = "alimentacion")]
    pub feed: FeedType,
    #[serde(rename = "tension_nominal")]
    pub nominal_voltage_v: f64,
    #[serde(rename = "potencia_aparente")]
    pub apparent_power_kva: f64,
    #[serde(rename = "potencia_activa")]
    pub active_power_kw: f64,
    #[serde(rename = "potencia_reactiva")]
    pub reactive_power_kvar: f64,
    pub cos_phi: f64,
    #[serde(rename = "corriente_nominal")]
    pub nominal_current_a: f64,
    #[serde(rename = "factor_correccion")]
    pub correction_factor: f64,
    #[serde(rename = "corriente_diseño")]
    pub design_current_a: f64,
    #[serde(rename = "factor_carga")]
    pub load_factor: f64,
    #[serde(rename = "corriente_media")]
    pub mean_current_a: f64,
}

/// Aggregate of the loads of one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSummary {
    #[serde(rename = "tablero")]
    pub panel_id: String,
    #[serde(rename = "cantidad_cargas")]
    pub load_count: usize,
    #[serde(rename = "potencia_total_aparente")]
    pub apparent_power_kva: f64,
    #[serde(rename = "potencia_total_activa")]
    pub active_power_kw: f64,
    /// Σ design current
    #[serde(rename = "corriente_total")]
    pub design_current_a: f64,
    #[serde(rename = "factor_diversidad")]
    pub diversity_factor: f64,
    #[serde(rename = "corriente_diversificada")]
    pub diversified_current_a: f64,
    #[serde(rename = "cos_phi_promedio")]
    pub average_cos_phi: f64,
    #[serde(rename = "cargas_detalle")]
    pub loads: Vec<LoadResult>,
}

/// Roll-up of every panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllPanelsSummary {
    #[serde(rename = "cantidad_tableros")]
    pub panel_count: usize,
    #[serde(rename = "potencia_total_aparente")]
    pub apparent_power_kva: f64,
    #[serde(rename = "potencia_total_activa")]
    pub active_power_kw: f64,
    /// Σ diversified panel currents
    #[serde(rename = "corriente_total_diversificada")]
    pub diversified_current_a: f64,
    /// Active/apparent over all panels; 0 when nothing is loaded
    #[serde(rename = "cos_phi_general")]
    pub overall_cos_phi: f64,
    #[serde(rename = "tableros")]
    pub panels: Vec<PanelSummary>,
}

// ============================================================================
// Calculation
// ============================================================================

/// Calculate the electrical quantities of one load.
pub fn calculate(input: &CircuitLoad) -> CalcResult<LoadResult> {
    debug!(id = %input.id, panel = %input.panel_id, "loads-per-panel calculation");
    compute(input).map_err(|e| CalcError::calculation_failed(Engine::LoadsPerPanel.name(), &input.id, e))
}

fn compute(input: &CircuitLoad) -> CalcResult<LoadResult> {
    input.validate()?;

    let nominal_current_a = input.feed.current_for(input.apparent_power_kva);
    let correction_factor = input.class.correction_factor();
    let design_current_a = nominal_current_a * correction_factor;
    let load_factor = input.class.load_factor();

    Ok(LoadResult {
        id: input.id.clone(),
        panel_id: input.panel_id.clone(),
        line_id: input.line_id.clone(),
        class: input.class,
        feed: input.feed,
        nominal_voltage_v: input.feed.nominal_voltage(),
        apparent_power_kva: input.apparent_power_kva,
        active_power_kw: input.apparent_power_kva * input.cos_phi,
        reactive_power_kvar: input.apparent_power_kva * sin_phi(input.cos_phi),
        cos_phi: input.cos_phi,
        nominal_current_a,
        correction_factor,
        design_current_a,
        load_factor,
        mean_current_a: design_current_a * load_factor,
    })
}

/// Calculate several loads. The first failing record aborts the batch.
pub fn calculate_multiple(inputs: &[CircuitLoad]) -> CalcResult<Vec<LoadResult>> {
    let results = inputs.iter().map(calculate).collect::<CalcResult<Vec<_>>>()?;
    info!(count = results.len(), "loads-per-panel batch calculated");
    Ok(results)
}

/// Summarize the loads belonging to `panel_id`.
///
/// Loads of other panels are ignored. A panel with more than three loads
/// gets a 0.8 diversity factor on its design current.
pub fn panel_summary(results: &[LoadResult], panel_id: &str) -> PanelSummary {
    let loads: Vec<LoadResult> = results.iter().filter(|r| r.panel_id == panel_id).cloned().collect();

    let apparent_power_kva: f64 = loads.iter().map(|r| r.apparent_power_kva).sum();
    let active_power_kw: f64 = loads.iter().map(|r| r.active_power_kw).sum();
    let design_current_a: f64 = loads.iter().map(|r| r.design_current_a).sum();

    let diversity_factor = if loads.len() > DIVERSITY_THRESHOLD { 0.8 } else { 1.0 };
    let average_cos_phi = if apparent_power_kva > 0.0 {
        active_power_kw / apparent_power_kva
    } else {
        DEFAULT_POWER_FACTOR
    };

    PanelSummary {
        panel_id: panel_id.to_string(),
        load_count: loads.len(),
        apparent_power_kva,
        active_power_kw,
        design_current_a,
        diversity_factor,
        diversified_current_a: design_current_a * diversity_factor,
        average_cos_phi,
        loads,
    }
}

/// Summarize every panel, in order of first appearance.
///
/// Loads with an empty panel id are left out.
pub fn all_panels_summary(results: &[LoadResult]) -> AllPanelsSummary {
    let mut panel_ids: Vec<&str> = Vec::new();
    for result in results {
        let id = result.panel_id.as_str();
        if !id.is_empty() && !panel_ids.contains(&id) {
            panel_ids.push(id);
        }
    }

    let panels: Vec<PanelSummary> = panel_ids.iter().map(|id| panel_summary(results, id)).collect();

    let apparent_power_kva: f64 = panels.iter().map(|p| p.apparent_power_kva).sum();
    let active_power_kw: f64 = panels.iter().map(|p| p.active_power_kw).sum();
    let diversified_current_a: f64 = panels.iter().map(|p| p.diversified_current_a).sum();

    AllPanelsSummary {
        panel_count: panels.len(),
        apparent_power_kva,
        active_power_kw,
        diversified_current_a,
        overall_cos_phi: if apparent_power_kva > 0.0 { active_power_kw / apparent_power_kva } else { 0.0 },
        panels,
    }
}
