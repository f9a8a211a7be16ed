//! # Electrical Library
//!
//! Constants, conductor data, validation and formula functions shared by
//! every calculation engine.
//!
//! - [`constants`] - Physical constants and reference tables
//! - [`conductors`] - Conductor materials and installation methods
//! - [`validation`] - Domain checks on electrical parameters
//! - [`formulas`] - Current, voltage-drop and impedance formulas
//! - [`interpolation`] - Sorted breakpoint tables with linear interpolation

pub mod conductors;
pub mod constants;
pub mod formulas;
pub mod interpolation;
pub mod validation;

pub use conductors::{ConductorMaterial, InstallationType};
pub use interpolation::Breakpoints;
pub use validation::{validate_parameters, ElectricalParameters, ParameterValidation, SectionCheck};
