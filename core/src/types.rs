//! Shared primitive types used across the pipeline.

/// The canonical run identifier.
pub type RunId = String;

/// Join key for one lead within a run. Equal to the lead's name.
pub type LeadId = String;
