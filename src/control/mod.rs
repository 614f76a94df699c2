//! Control algorithms module
//!
//! Discrete-time LQR with an injectable Riccati solver, and the pendulum
//! linearization layer built on top of it.

pub mod riccati;
pub mod lqr;
pub mod pendulum_lqr;

pub use riccati::{DoublingSolver, FixedPointSolver};
pub use lqr::{Gains, Lqr};
pub use pendulum_lqr::{linearize, Equilibrium, PendulumLqr};
