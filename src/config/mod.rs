//! # Configuration Module
//!
//! Run configuration and per-item conversion settings.

pub mod config;

pub use config::{ConversionSettings, OptimizerConfig, SettingsPatch};
