//! LQR control of a torque-driven pendulum about a settable equilibrium
//!
//! Angle convention: zero is the hanging rest position and the plant follows
//! ```text
//! theta_ddot = -(g / l) sin(theta) + torque / (m l^2)
//! ```
//! Holding the pendulum at rest at `theta_eq` therefore takes the bias torque
//! `m g l sin(theta_eq)`, which is added on top of the LQR correction.
//!
//! The model is the forward-Euler discretization of the Jacobian at the
//! equilibrium, used both at construction and on every setpoint change:
//! ```text
//! A = | 1                      dt |    B = | 0            |
//!     | -(g / l) cos(th) dt    1  |        | dt / (m l^2) |
//! ```

use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::common::{
    normalize_angle, LqrError, LqrResult, PendulumParams, RiccatiSolver, TorqueController,
};
use crate::control::lqr::Lqr;
use crate::control::riccati::DoublingSolver;

/// Default controller period [s]
pub const DEFAULT_DT: f64 = 0.01;
/// Default gravity [m/s^2]
pub const DEFAULT_GRAVITY: f64 = 9.8;

/// Operating point the controller is linearized about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equilibrium {
    pub theta: f64,
    pub bias_torque: f64,
}

impl Equilibrium {
    pub fn at(params: &PendulumParams, theta: f64) -> Self {
        Self { theta, bias_torque: params.holding_torque(theta) }
    }
}

/// Discrete model (A, B) of the pendulum linearized at `theta`
pub fn linearize(params: &PendulumParams, theta: f64, dt: f64) -> (DMatrix<f64>, DMatrix<f64>) {
    let a = DMatrix::from_row_slice(
        2,
        2,
        &[
            1.0, dt,
            -params.gravity / params.length * theta.cos() * dt, 1.0,
        ],
    );
    let b = DMatrix::from_row_slice(2, 1, &[0.0, dt / params.inertia()]);
    (a, b)
}

/// Pendulum controller: error coordinates and bias torque around an [`Lqr`] core
#[derive(Debug, Clone)]
pub struct PendulumLqr<S = DoublingSolver> {
    params: PendulumParams,
    dt: f64,
    equilibrium: Equilibrium,
    lqr: Lqr<S>,
}

impl PendulumLqr<DoublingSolver> {
    pub fn new(
        mass: f64,
        length: f64,
        theta: f64,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
        dt: f64,
        gravity: f64,
    ) -> LqrResult<Self> {
        Self::with_solver(
            PendulumParams::new(mass, length, gravity),
            theta,
            q,
            r,
            dt,
            DoublingSolver::default(),
        )
    }

    /// Controller with a 0.01 s period under 9.8 m/s^2 gravity
    pub fn with_defaults(
        mass: f64,
        length: f64,
        theta: f64,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
    ) -> LqrResult<Self> {
        Self::new(mass, length, theta, q, r, DEFAULT_DT, DEFAULT_GRAVITY)
    }
}

impl<S: RiccatiSolver> PendulumLqr<S> {
    pub fn with_solver(
        params: PendulumParams,
        theta: f64,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
        dt: f64,
        solver: S,
    ) -> LqrResult<Self> {
        check_positive("mass", params.mass)?;
        check_positive("length", params.length)?;
        check_positive("gravity", params.gravity)?;
        check_positive("timestep", dt)?;

        let (a, b) = linearize(&params, theta, dt);
        let lqr = Lqr::with_solver(a, b, q, r, solver)?;

        Ok(PendulumLqr {
            params,
            dt,
            equilibrium: Equilibrium::at(&params, theta),
            lqr,
        })
    }

    /// Re-linearize about `theta`. On failure the previous setpoint stays active.
    pub fn set_setpoint(&mut self, theta: f64) -> LqrResult<()> {
        let (a, _) = linearize(&self.params, theta, self.dt);
        self.lqr.reset(a)?;
        self.equilibrium = Equilibrium::at(&self.params, theta);
        info!(
            setpoint_deg = theta.to_degrees(),
            bias_torque = self.equilibrium.bias_torque,
            "setpoint updated"
        );
        Ok(())
    }

    /// Torque command before saturation
    pub fn control(&self, theta: f64, theta_dot: f64) -> f64 {
        let x = DVector::from_vec(vec![
            normalize_angle(theta - self.equilibrium.theta),
            theta_dot,
        ]);
        self.lqr.apply(&x)[0] + self.equilibrium.bias_torque
    }

    pub fn setpoint(&self) -> f64 {
        self.equilibrium.theta
    }

    pub fn bias_torque(&self) -> f64 {
        self.equilibrium.bias_torque
    }

    pub fn equilibrium(&self) -> Equilibrium {
        self.equilibrium
    }

    /// Feedback gain (1x2) for the current setpoint
    pub fn gain(&self) -> &DMatrix<f64> {
        self.lqr.k()
    }

    pub fn lqr(&self) -> &Lqr<S> {
        &self.lqr
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    pub fn timestep(&self) -> f64 {
        self.dt
    }
}

impl<S: RiccatiSolver> TorqueController for PendulumLqr<S> {
    fn control(&self, theta: f64, theta_dot: f64) -> f64 {
        PendulumLqr::control(self, theta, theta_dot)
    }

    fn set_setpoint(&mut self, theta: f64) -> LqrResult<()> {
        PendulumLqr::set_setpoint(self, theta)
    }

    fn setpoint(&self) -> f64 {
        PendulumLqr::setpoint(self)
    }
}

fn check_positive(name: &str, value: f64) -> LqrResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LqrError::InvalidParameter(format!(
            "{} must be finite and positive, got {}",
            name, value
        )));
    }
    Ok(())
}
