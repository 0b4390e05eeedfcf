#![forbid(unsafe_code)]

pub mod check;
pub mod cli;
pub mod columns;
pub mod config;
pub mod days;
pub mod fields;
pub mod formats;
pub mod importer;
pub mod logging;
pub mod migrate;
pub mod preview;
pub mod store;
pub mod summary;
pub mod table;
pub mod tag_admin;
pub mod tags;
