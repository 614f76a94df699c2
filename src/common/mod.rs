//! Common types, traits, and error definitions for pendulum_lqr
//!
//! This module provides the building blocks shared by the controller
//! and the simulation driver.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
