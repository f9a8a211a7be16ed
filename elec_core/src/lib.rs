//! # elec_core - Low-Voltage Installation Calculation Engine
//!
//! `elec_core` computes the standard quantities of a low-voltage electrical
//! installation from structured circuit and panel descriptions:
//! simultaneous maximum demand (DPMS), per-panel load distribution,
//! conductor ampacity, voltage drop and short-circuit fault levels.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every engine is a pure function of its input record and
//!   compiled-in constant tables
//! - **JSON-First**: all inputs and results implement Serialize/Deserialize
//!   with the field names used on the wire
//! - **Rich Errors**: structured errors naming the engine, record and field
//!
//! ## Quick Start
//!
//! ```rust
//! use elec_core::calculations::thermal::{calculate, ThermalCheck};
//!
//! let check = ThermalCheck {
//!     id: "t-1".to_string(),
//!     circuit: "C1".to_string(),
//!     design_current_a: 20.0,
//!     section_mm2: 4.0,
//!     ambient_temperature_c: 35.0,
//!     conductor_count: 3,
//! };
//!
//! let result = calculate(&check).unwrap();
//! println!("{}", result.recommendation);
//! ```
//!
//! ## Modules
//!
//! - [`electrical`] - Constants, conductor data, validation and formulas
//! - [`calculations`] - The five engines and the untyped record dispatcher
//! - [`project`] - Project container and computed report
//! - [`errors`] - Structured error types
//! - [`file_io`] - Atomic JSON saves and versioned loads

pub mod calculations;
pub mod electrical;
pub mod errors;
pub mod file_io;
pub mod project;

pub use calculations::{calculate_batch, calculate_record, BatchMode, CalculationItem, Engine};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, save_report};
pub use project::{Project, ProjectReport, ProjectSettings};
