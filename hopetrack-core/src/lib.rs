//! HOPETRACK library
//!
//! Case normalization, status classification, notification derivation and
//! document export for the HOPETRACK case manager.

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod services;
pub mod status;
pub mod storage;
