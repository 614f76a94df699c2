//! Common traits defining the seams between solver, controller and driver

use nalgebra::DMatrix;

use crate::common::error::LqrResult;

/// Trait for discrete algebraic Riccati equation solvers
///
/// Returns the stabilizing solution P of
/// `P = A'PA - A'PB (R + B'PB)^-1 B'PA + Q`.
/// Shapes are validated by the caller before `solve` is invoked.
pub trait RiccatiSolver {
    fn solve(
        &self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> LqrResult<DMatrix<f64>>;
}

impl<S: RiccatiSolver + ?Sized> RiccatiSolver for &S {
    fn solve(
        &self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> LqrResult<DMatrix<f64>> {
        (**self).solve(a, b, q, r)
    }
}

/// The interface a simulation driver uses to talk to a torque controller
pub trait TorqueController {
    /// Torque command before saturation
    fn control(&self, theta: f64, theta_dot: f64) -> f64;

    /// Re-target the controller at a new equilibrium angle [rad]
    fn set_setpoint(&mut self, theta: f64) -> LqrResult<()>;

    /// Current equilibrium angle [rad]
    fn setpoint(&self) -> f64;
}
