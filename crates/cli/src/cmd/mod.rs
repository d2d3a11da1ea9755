//! CLI command implementations

pub mod descendants;
pub mod find;
pub mod insert_data;
pub mod insert_tags;
pub mod show;
pub mod stats;
pub mod tag;
pub mod tags;
