//! # Project Data Structures
//!
//! A `Project` bundles the calculation records of one installation so they
//! can be stored as a single JSON file and computed together into a
//! [`ProjectReport`].
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (schema version, id, engineer, job info, timestamps)
//! ├── settings: ProjectSettings (standard label, batch mode)
//! └── items: Vec<CalculationItem> (tagged engine inputs, in entry order)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use elec_core::calculations::{CalculationItem, ThermalCheck};
//! use elec_core::project::Project;
//!
//! let mut project = Project::new("Ing. Pérez", "25-014", "Consorcio Norte");
//! project.add_item(CalculationItem::Thermal(ThermalCheck {
//!     id: "t-1".to_string(),
//!     circuit: "C1".to_string(),
//!     design_current_a: 10.0,
//!     section_mm2: 2.5,
//!     ambient_temperature_c: 40.0,
//!     conductor_count: 3,
//! }));
//!
//! let report = project.calculate_all().unwrap();
//! assert_eq!(report.entries.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::calculations::dpms::{self, DpmsResult, DpmsSummary};
use crate::calculations::loads_per_panel::{self, AllPanelsSummary, LoadResult};
use crate::calculations::short_circuit::{self, FaultLevelSummary, ShortCircuitResult};
use crate::calculations::thermal::{self, ThermalBatchSummary, ThermalResult};
use crate::calculations::voltage_drop::{self, ProfileSummary, VoltageDropResult};
use crate::calculations::{BatchMode, CalculationItem, CalculationOutput, Engine};
use crate::errors::{CalcError, CalcResult};

/// Current schema version for project files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: ProjectSettings,

    /// Calculation records, computed in this order
    #[serde(default)]
    pub items: Vec<CalculationItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// ```rust
    /// use elec_core::project::Project;
    ///
    /// let project = Project::new("Ing. Pérez", "25-014", "Consorcio Norte");
    /// assert_eq!(project.meta.engineer, "Ing. Pérez");
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            items: Vec::new(),
        }
    }

    /// Append a calculation record. Returns its position.
    pub fn add_item(&mut self, item: CalculationItem) -> usize {
        self.items.push(item);
        self.touch();
        self.items.len() - 1
    }

    /// Remove the first record of `engine` with `record_id`.
    pub fn remove_item(&mut self, engine: Engine, record_id: &str) -> Option<CalculationItem> {
        let position = self
            .items
            .iter()
            .position(|item| item.engine() == engine && item.record_id() == record_id)?;
        self.touch();
        Some(self.items.remove(position))
    }

    /// Find a record by engine and id.
    pub fn get_item(&self, engine: Engine, record_id: &str) -> Option<&CalculationItem> {
        self.items
            .iter()
            .find(|item| item.engine() == engine && item.record_id() == record_id)
    }

    /// Records of one engine, in entry order
    pub fn items_of(&self, engine: Engine) -> impl Iterator<Item = &CalculationItem> {
        self.items.iter().filter(move |item| item.engine() == engine)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Compute every record and the per-engine summaries.
    ///
    /// With [`BatchMode::AllOrNothing`] the first failing record aborts the
    /// report; with [`BatchMode::Isolated`] failures are recorded in place.
    pub fn calculate_all(&self) -> CalcResult<ProjectReport> {
        let mut entries = Vec::with_capacity(self.items.len());

        for item in &self.items {
            let outcome = match (item.calculate(), self.settings.batch_mode) {
                (Ok(output), _) => Ok(output),
                (Err(error), BatchMode::AllOrNothing) => return Err(error),
                (Err(error), BatchMode::Isolated) => Err(error),
            };
            entries.push(ReportEntry::new(item, outcome));
        }

        let summaries = ReportSummaries::from_entries(&entries);
        let failed = entries.iter().filter(|e| e.error.is_some()).count();
        info!(project = %self.meta.id, total = entries.len(), failed, "project calculated");

        Ok(ProjectReport {
            id: Uuid::new_v4(),
            project: self.meta.clone(),
            standard: self.settings.standard.clone(),
            batch_mode: self.settings.batch_mode,
            generated_at: Utc::now(),
            entries,
            summaries,
        })
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    pub id: Uuid,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    pub client: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Project-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Installation standard the project is designed to (informative)
    pub standard: String,

    /// Failure policy used by [`Project::calculate_all`]
    #[serde(default)]
    pub batch_mode: BatchMode,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            standard: "IEC 60364".to_string(),
            batch_mode: BatchMode::default(),
        }
    }
}

/// Outcome of one project record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub engine: Engine,
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

impl ReportEntry {
    fn new(item: &CalculationItem, outcome: CalcResult<CalculationOutput>) -> Self {
        let (result, error) = match outcome {
            Ok(output) => (Some(output), None),
            Err(error) => (None, Some(error)),
        };
        ReportEntry {
            engine: item.engine(),
            record_id: item.record_id().to_string(),
            result,
            error,
        }
    }
}

/// Per-engine summaries over the successful entries. An engine with no
/// successful records has no summary.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ReportSummaries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpms: Option<DpmsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panels: Option<AllPanelsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal: Option<ThermalBatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_profile: Option<ProfileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_levels: Option<FaultLevelSummary>,
}

impl ReportSummaries {
    fn from_entries(entries: &[ReportEntry]) -> Self {
        let mut dpms_results: Vec<DpmsResult> = Vec::new();
        let mut loads: Vec<LoadResult> = Vec::new();
        let mut thermal_results: Vec<ThermalResult> = Vec::new();
        let mut drops: Vec<VoltageDropResult> = Vec::new();
        let mut faults: Vec<ShortCircuitResult> = Vec::new();

        for output in entries.iter().filter_map(|e| e.result.as_ref()) {
            match output {
                CalculationOutput::Dpms(r) => dpms_results.push(r.clone()),
                CalculationOutput::LoadsPerPanel(r) => loads.push(r.clone()),
                CalculationOutput::Thermal(r) => thermal_results.push(r.clone()),
                CalculationOutput::VoltageDrop(r) => drops.push(r.clone()),
                CalculationOutput::ShortCircuit(r) => faults.push(r.clone()),
            }
        }

        ReportSummaries {
            dpms: dpms::general_summary(&dpms_results),
            panels: (!loads.is_empty()).then(|| loads_per_panel::all_panels_summary(&loads)),
            thermal: (!thermal_results.is_empty()).then(|| thermal::batch_summary(&thermal_results)),
            voltage_profile: (!drops.is_empty()).then(|| voltage_drop::profile_summary(&drops)),
            fault_levels: short_circuit::fault_level_summary(&faults).ok(),
        }
    }
}

/// Computed snapshot of a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub id: Uuid,
    pub project: ProjectMetadata,
    pub standard: String,
    pub batch_mode: BatchMode,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    pub summaries: ReportSummaries,
}

impl ProjectReport {
    /// Entries that failed (only possible in isolated mode)
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.error.is_some())
    }
}
