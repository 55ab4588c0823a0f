pub mod config;
pub mod error;
pub mod meter;
pub mod reconcile;
pub mod snapshot;
pub mod totals;

pub use config::Config;
pub use error::{AppError, Result};
pub use meter::{Decision, MeterId, ReconciledReading};
pub use reconcile::Reconciler;
