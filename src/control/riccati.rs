//! Discrete algebraic Riccati equation solvers
//!
//! Two interchangeable implementations of [`RiccatiSolver`]:
//!
//! - [`DoublingSolver`]: structure-preserving doubling, quadratic convergence.
//!   This is the default used by the LQR core.
//! - [`FixedPointSolver`]: plain value iteration on the Riccati recursion,
//!   starting from `P = Q`. Slow when the closed loop is close to the unit
//!   circle, but easy to follow.
//!
//! Both reject cost matrices that do not admit a unique stabilizing solution
//! (R not symmetric positive definite, Q not symmetric positive semidefinite)
//! and report divergence instead of returning a non-finite P.

use nalgebra::DMatrix;
use tracing::debug;

use crate::common::{LqrError, LqrResult, RiccatiSolver};

const SYMMETRY_TOL: f64 = 1e-9;

/// Structure-preserving doubling algorithm
///
/// Iterates
/// ```text
/// W     = (I + G_k H_k)^-1
/// A_k+1 = A_k W A_k
/// G_k+1 = G_k + A_k W G_k A_k'
/// H_k+1 = H_k + A_k' H_k W A_k
/// ```
/// from `A_0 = A`, `G_0 = B R^-1 B'`, `H_0 = Q`; `H_k` converges to P.
#[derive(Debug, Clone, Copy)]
pub struct DoublingSolver {
    pub max_iter: usize,
    /// Relative change of H between iterations that counts as converged
    pub tolerance: f64,
}

impl Default for DoublingSolver {
    fn default() -> Self {
        Self { max_iter: 100, tolerance: 1e-13 }
    }
}

impl RiccatiSolver for DoublingSolver {
    fn solve(
        &self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> LqrResult<DMatrix<f64>> {
        check_cost_matrices(q, r)?;

        let n = a.nrows();
        let identity = DMatrix::<f64>::identity(n, n);
        let r_inv = r
            .clone()
            .cholesky()
            .ok_or_else(|| LqrError::Solver("R is not positive definite".to_string()))?
            .inverse();

        let mut a_k = a.clone();
        let mut g_k = b * r_inv * b.transpose();
        let mut h_k = q.clone();

        for iter in 0..self.max_iter {
            let w = (&identity + &g_k * &h_k).try_inverse().ok_or_else(|| {
                LqrError::Solver(format!("singular doubling step at iteration {}", iter))
            })?;

            let a_w = &a_k * &w;
            let a_next = &a_w * &a_k;
            let g_next = &g_k + &a_w * &g_k * a_k.transpose();
            let h_next = &h_k + a_k.transpose() * &h_k * &w * &a_k;

            if !is_finite(&h_next) {
                return Err(LqrError::Solver(
                    "doubling iteration diverged; (A, B) is not stabilizable".to_string(),
                ));
            }

            let change = (&h_next - &h_k).norm() / h_next.norm().max(f64::MIN_POSITIVE);
            a_k = a_next;
            g_k = g_next;
            h_k = h_next;

            if change < self.tolerance {
                debug!(iterations = iter + 1, "doubling iteration converged");
                return Ok(symmetrize(h_k));
            }
        }

        Err(LqrError::Solver(format!(
            "doubling iteration did not converge in {} steps",
            self.max_iter
        )))
    }
}

/// Value iteration on the Riccati recursion
#[derive(Debug, Clone, Copy)]
pub struct FixedPointSolver {
    pub max_iter: usize,
    /// Largest absolute element change that counts as converged
    pub eps: f64,
}

impl Default for FixedPointSolver {
    fn default() -> Self {
        Self { max_iter: 100_000, eps: 1e-10 }
    }
}

impl RiccatiSolver for FixedPointSolver {
    fn solve(
        &self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> LqrResult<DMatrix<f64>> {
        check_cost_matrices(q, r)?;

        let mut p = q.clone();
        for iter in 0..self.max_iter {
            let bt_p = b.transpose() * &p;
            let inv = (r + &bt_p * b).try_inverse().ok_or_else(|| {
                LqrError::Solver(format!("R + B'PB is singular at iteration {}", iter))
            })?;

            let pn = a.transpose() * &p * a - a.transpose() * &p * b * inv * &bt_p * a + q;

            if !is_finite(&pn) {
                return Err(LqrError::Solver(
                    "value iteration diverged; (A, B) is not stabilizable".to_string(),
                ));
            }

            if (&pn - &p).amax() < self.eps {
                debug!(iterations = iter + 1, "value iteration converged");
                return Ok(symmetrize(pn));
            }
            p = pn;
        }

        Err(LqrError::Solver(format!(
            "value iteration did not converge in {} steps",
            self.max_iter
        )))
    }
}

/// Check that Q is symmetric positive semidefinite and R symmetric positive definite
pub fn check_cost_matrices(q: &DMatrix<f64>, r: &DMatrix<f64>) -> LqrResult<()> {
    if !is_finite(q) || !is_finite(r) {
        return Err(LqrError::Solver("cost matrices must be finite".to_string()));
    }
    if !is_symmetric(q) {
        return Err(LqrError::Solver("Q is not symmetric".to_string()));
    }
    if !is_symmetric(r) {
        return Err(LqrError::Solver("R is not symmetric".to_string()));
    }

    let scale = q.amax().max(1.0);
    let min_eig = q.clone().symmetric_eigenvalues().min();
    if min_eig < -SYMMETRY_TOL * scale {
        return Err(LqrError::Solver(format!(
            "Q is not positive semidefinite (smallest eigenvalue {:.3e})",
            min_eig
        )));
    }

    if r.clone().cholesky().is_none() {
        return Err(LqrError::Solver("R is not positive definite".to_string()));
    }
    Ok(())
}

fn is_symmetric(m: &DMatrix<f64>) -> bool {
    let scale = m.amax().max(1.0);
    (m - m.transpose()).amax() <= SYMMETRY_TOL * scale
}

fn is_finite(m: &DMatrix<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

fn symmetrize(p: DMatrix<f64>) -> DMatrix<f64> {
    (&p + p.transpose()) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pendulum_system() -> (DMatrix<f64>, DMatrix<f64>, DMatrix<f64>, DMatrix<f64>) {
        let dt = 0.01;
        let a = DMatrix::from_row_slice(2, 2, &[1.0, dt, -9.8 * dt, 1.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, dt]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        (a, b, q, r)
    }

    fn riccati_residual(
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
        p: &DMatrix<f64>,
    ) -> f64 {
        let bt_p = b.transpose() * p;
        let inv = (r + &bt_p * b).try_inverse().unwrap();
        let rhs = a.transpose() * p * a - a.transpose() * p * b * inv * &bt_p * a + q;
        (rhs - p).amax() / p.amax()
    }

    #[test]
    fn test_scalar_dare_golden_ratio() {
        // P^2 - P - 1 = 0 for a = b = q = r = 1
        let one = DMatrix::from_element(1, 1, 1.0);
        let p = DoublingSolver::default().solve(&one, &one, &one, &one).unwrap();
        let golden = (1.0 + 5.0_f64.sqrt()) / 2.0;
        assert_relative_eq!(p[(0, 0)], golden, epsilon = 1e-12);
    }

    #[test]
    fn test_doubling_satisfies_riccati_equation() {
        let (a, b, q, r) = pendulum_system();
        let p = DoublingSolver::default().solve(&a, &b, &q, &r).unwrap();
        assert!(riccati_residual(&a, &b, &q, &r, &p) < 1e-9);
        assert_relative_eq!(p[(0, 1)], p[(1, 0)]);
        assert!(p.clone().symmetric_eigenvalues().min() > 0.0);
    }

    #[test]
    fn test_fixed_point_matches_doubling() {
        let (a, b, q, r) = pendulum_system();
        let p_sda = DoublingSolver::default().solve(&a, &b, &q, &r).unwrap();
        let p_fp = FixedPointSolver::default().solve(&a, &b, &q, &r).unwrap();
        for (x, y) in p_sda.iter().zip(p_fp.iter()) {
            assert_relative_eq!(*x, *y, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_unstable_uncontrollable_mode_fails() {
        // the first state grows by 2x per step and the input never reaches it
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.5]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let q = DMatrix::identity(2, 2);
        let r = DMatrix::identity(1, 1);
        let err = DoublingSolver::default().solve(&a, &b, &q, &r).unwrap_err();
        assert!(matches!(err, LqrError::Solver(_)));
        let err = FixedPointSolver::default().solve(&a, &b, &q, &r).unwrap_err();
        assert!(matches!(err, LqrError::Solver(_)));
    }

    #[test]
    fn test_rejects_indefinite_r() {
        let (a, b, q, _) = pendulum_system();
        let r = DMatrix::from_element(1, 1, -1.0);
        let err = DoublingSolver::default().solve(&a, &b, &q, &r).unwrap_err();
        assert!(matches!(err, LqrError::Solver(_)));
    }

    #[test]
    fn test_rejects_indefinite_q() {
        let (a, b, _, r) = pendulum_system();
        let q = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        assert!(check_cost_matrices(&q, &r).is_err());
        assert!(DoublingSolver::default().solve(&a, &b, &q, &r).is_err());
    }

    #[test]
    fn test_rejects_asymmetric_q() {
        let r = DMatrix::identity(1, 1);
        let q = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]);
        assert!(check_cost_matrices(&q, &r).is_err());
    }

    #[test]
    fn test_accepts_semidefinite_q() {
        let r = DMatrix::identity(1, 1);
        let q = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        assert!(check_cost_matrices(&q, &r).is_ok());
    }

    #[test]
    fn test_iteration_limit_reported() {
        let (a, b, q, r) = pendulum_system();
        let solver = FixedPointSolver { max_iter: 3, eps: 1e-12 };
        let err = solver.solve(&a, &b, &q, &r).unwrap_err();
        assert!(format!("{}", err).contains("did not converge"));
    }
}
