//! Simulation driver
//!
//! Owns the true pendulum state, evaluates a [`TorqueController`](crate::common::TorqueController)
//! once per control cycle, saturates and integrates.

pub mod setpoint;
pub mod simulator;

pub use setpoint::*;
pub use simulator::*;
