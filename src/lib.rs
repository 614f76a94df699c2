//! pendulum_lqr - discrete-time LQR control of a torque-driven pendulum
//!
//! This crate provides a generic LQR core with an injectable Riccati solver,
//! a pendulum linearization layer that re-linearizes on setpoint changes,
//! and a headless simulation driver with gnuplot output.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Algorithm modules
pub mod control;
pub mod simulation;

// Re-export common types for convenience
pub use common::{normalize_angle, PendulumParams, PendulumState};
pub use common::{RiccatiSolver, TorqueController};
pub use common::{InputParseError, LqrError, LqrResult};
pub use control::{DoublingSolver, FixedPointSolver, Lqr, PendulumLqr};
pub use simulation::{PendulumSimulator, Sample, ScheduledSetpoint, SimulatorParams};
