//! Core data types for the Moonitor market tracker.

pub mod alert;
pub mod asset;
pub mod chart;
pub mod exchange;
pub mod range;
pub mod ticker;

pub use alert::*;
pub use asset::*;
pub use chart::*;
pub use exchange::*;
pub use range::*;
pub use ticker::*;
