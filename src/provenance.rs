//! The provenance log: a snapshot of every sample record, rewritten after
//! each stage so a run can be inspected (or its records recovered) later.

pub mod command;
pub mod log;

pub use log::ProvenanceLog;
