//! Discrete-time Linear Quadratic Regulator
//!
//! [`Lqr`] owns the system matrices (A, B, Q, R), the Riccati solution P and
//! the feedback gain `K = (R + B'PB)^-1 B'PA`. The control law is `u = -K x`.
//!
//! The Riccati solve is delegated to an injected [`RiccatiSolver`].
//! A, P and K live together in one [`Gains`] value; `reset` builds a complete
//! replacement before swapping it in, so a failed reset leaves the previous
//! gains untouched.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::common::{LqrError, LqrResult, RiccatiSolver};
use crate::control::riccati::DoublingSolver;

/// State transition matrix together with the Riccati solution and gain derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct Gains {
    pub a: DMatrix<f64>,
    pub p: DMatrix<f64>,
    pub k: DMatrix<f64>,
}

/// LQR controller over a linear system `x[t+1] = A x[t] + B u[t]`
#[derive(Debug, Clone)]
pub struct Lqr<S = DoublingSolver> {
    b: DMatrix<f64>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    gains: Gains,
    solver: S,
}

impl Lqr<DoublingSolver> {
    /// Build a controller with the default doubling solver
    pub fn new(
        a: DMatrix<f64>,
        b: DMatrix<f64>,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
    ) -> LqrResult<Self> {
        Self::with_solver(a, b, q, r, DoublingSolver::default())
    }
}

impl<S: RiccatiSolver> Lqr<S> {
    /// Build a controller, solving the DARE with `solver`
    pub fn with_solver(
        a: DMatrix<f64>,
        b: DMatrix<f64>,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
        solver: S,
    ) -> LqrResult<Self> {
        let n = b.nrows();
        let m = b.ncols();
        check_shape("A", &a, (n, n))?;
        check_shape("Q", &q, (n, n))?;
        check_shape("R", &r, (m, m))?;
        if n == 0 || m == 0 {
            return Err(LqrError::dimension("B", (n.max(1), m.max(1)), (n, m)));
        }

        let gains = solve_gains(&solver, a, &b, &q, &r)?;
        Ok(Lqr { b, q, r, gains, solver })
    }

    /// Replace A and recompute P and K from it, keeping B, Q and R
    pub fn reset(&mut self, a: DMatrix<f64>) -> LqrResult<()> {
        let n = self.state_dim();
        check_shape("A", &a, (n, n))?;
        self.gains = solve_gains(&self.solver, a, &self.b, &self.q, &self.r)?;
        Ok(())
    }

    /// Optimal input `u = -K x`
    pub fn control(&self, x: &DVector<f64>) -> LqrResult<DVector<f64>> {
        if x.len() != self.state_dim() {
            return Err(LqrError::dimension("x", (self.state_dim(), 1), (x.len(), 1)));
        }
        Ok(self.apply(x))
    }

    /// `u = -K x` for a state already known to have `state_dim` entries
    pub(crate) fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        -(&self.gains.k * x)
    }

    pub fn state_dim(&self) -> usize {
        self.b.nrows()
    }

    pub fn input_dim(&self) -> usize {
        self.b.ncols()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.gains.a
    }

    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn q(&self) -> &DMatrix<f64> {
        &self.q
    }

    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// Riccati solution (cost-to-go) for the current A
    pub fn p(&self) -> &DMatrix<f64> {
        &self.gains.p
    }

    /// Feedback gain for the current A
    pub fn k(&self) -> &DMatrix<f64> {
        &self.gains.k
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    /// Largest eigenvalue magnitude of `A - B K`
    pub fn closed_loop_spectral_radius(&self) -> f64 {
        spectral_radius(&(&self.gains.a - &self.b * &self.gains.k))
    }
}

fn check_shape(what: &'static str, m: &DMatrix<f64>, expected: (usize, usize)) -> LqrResult<()> {
    if m.shape() != expected {
        return Err(LqrError::dimension(what, expected, m.shape()));
    }
    Ok(())
}

fn solve_gains<S: RiccatiSolver>(
    solver: &S,
    a: DMatrix<f64>,
    b: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
) -> LqrResult<Gains> {
    let p = solver.solve(&a, b, q, r)?;
    if p.shape() != a.shape() {
        return Err(LqrError::dimension("P", a.shape(), p.shape()));
    }

    let bt_p = b.transpose() * &p;
    let inv = (r + &bt_p * b)
        .try_inverse()
        .ok_or_else(|| LqrError::Solver("R + B'PB is singular".to_string()))?;
    let k = inv * bt_p * &a;

    if !k.iter().all(|v| v.is_finite()) {
        return Err(LqrError::Solver("feedback gain is not finite".to_string()));
    }

    let radius = spectral_radius(&(&a - b * &k));
    if radius >= 1.0 {
        return Err(LqrError::Solver(format!(
            "Riccati solution is not stabilizing (closed-loop spectral radius {:.6})",
            radius
        )));
    }
    debug!(spectral_radius = radius, "feedback gain updated");

    Ok(Gains { a, p, k })
}

fn spectral_radius(m: &DMatrix<f64>) -> f64 {
    m.complex_eigenvalues()
        .iter()
        .map(|lambda| lambda.norm_sqr().sqrt())
        .fold(0.0, f64::max)
}
