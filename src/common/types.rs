//! Common types used throughout pendulum_lqr

use std::f64::consts::{PI, TAU};

/// Wrap an angle into (-PI, PI]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU);
    if wrapped == 0.0 {
        PI
    } else {
        wrapped - PI
    }
}

/// Pendulum state. Zero angle is the hanging rest position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumState {
    pub theta: f64,
    pub theta_dot: f64,
}

impl PendulumState {
    pub fn new(theta: f64, theta_dot: f64) -> Self {
        Self { theta, theta_dot }
    }

    pub fn rest() -> Self {
        Self { theta: 0.0, theta_dot: 0.0 }
    }

    /// Normalize theta to (-PI, PI]
    pub fn normalize_theta(&mut self) {
        self.theta = normalize_angle(self.theta);
    }
}

/// Physical parameters of a point-mass pendulum on a massless rod
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumParams {
    pub mass: f64,    // [kg]
    pub length: f64,  // [m]
    pub gravity: f64, // [m/s^2]
}

impl PendulumParams {
    pub fn new(mass: f64, length: f64, gravity: f64) -> Self {
        Self { mass, length, gravity }
    }

    /// m * g * l, the peak gravity torque about the pivot
    pub fn mgl(&self) -> f64 {
        self.mass * self.gravity * self.length
    }

    /// m * l^2
    pub fn inertia(&self) -> f64 {
        self.mass * self.length.powi(2)
    }

    /// Torque that holds the pendulum at rest at `theta`
    pub fn holding_torque(&self, theta: f64) -> f64 {
        self.mgl() * theta.sin()
    }
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self { mass: 1.0, length: 1.0, gravity: 9.8 }
    }
}
