//! # psse2grg-core
//!
//! The translation engine shared by the RAW <-> GRG converters.
//!
//! - [`grg`]: typed GRG bus-breaker documents
//! - [`ids`]: deterministic identifier allocation in both directions
//! - [`topology`]: substation clustering over transformer adjacency
//! - [`switches`]: breaker synthesis for every component link
//! - [`collapse`]: voltage point collapse back onto flat bus numbers
//! - [`validate`]: structural document checks
//! - [`diagnostics`]: warnings collected during a translation pass
//!
//! Nothing in this crate performs I/O; the file formats live in
//! `psse2grg-io`.

pub mod collapse;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grg;
pub mod ids;
pub mod switches;
pub mod topology;
pub mod units;
pub mod validate;

pub use collapse::{switch_assignment, SwitchAssignment, VoltagePointIndex};
pub use config::{TranslationOptions, DEFAULT_BASE_MVA, DEFAULT_FLOAT_PRECISION};
pub use diagnostics::{Category, DiagnosticIssue, Diagnostics, Severity, Translation};
pub use error::{GrgError, GrgResult};
pub use grg::Document;
pub use switches::{combine_status, SwitchAllocator};
pub use topology::{SubstationPartition, UnionFind};
pub use validate::{is_valid, validate_document};
