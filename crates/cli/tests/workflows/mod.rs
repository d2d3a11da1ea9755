//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

pub mod associations;
pub mod edge_cases;
pub mod insert_data;
pub mod insert_tags;
