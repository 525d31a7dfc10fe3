//! `tieout-recon`: ACH batch to portfolio statement tie-out engine.
//!
//! Pure engine crate: receives pre-loaded sheets, returns normalized records,
//! the reconciled set and the report views. No CLI or IO dependencies.

pub mod config;
pub mod contract;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod money;
pub mod payment;
pub mod portfolio;
pub mod report;
pub mod table;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{PortfolioMode, RunParams, TieOutInput, TieOutResult};
pub use table::{RawCell, RawTable};
