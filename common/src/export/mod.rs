//! Export core utilities.

pub mod pdf_core;
