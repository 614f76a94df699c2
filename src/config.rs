//! TOML configuration for the controller and the simulation.
//!
//! Every key is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [pendulum]
//! mass = 1.0
//! length = 1.0
//! gravity = 9.81
//! damping = 0.1
//!
//! [controller]
//! q_angle = 30.0
//! q_velocity = 10.0
//! r = 1.0
//! initial_setpoint_deg = -90.0
//!
//! [simulation]
//! hz = 100.0
//! decimation = 5
//! torque_max = 10.0
//! initial_theta = 0.0
//! initial_theta_dot = 0.0
//! disturbance_std = 0.0
//! seed = 0
//! ```

use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::common::{LqrError, LqrResult, PendulumParams, PendulumState};
use crate::control::PendulumLqr;
use crate::simulation::SimulatorParams;

/// Physical plant parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PendulumConfig {
    pub mass: f64,
    pub length: f64,
    pub gravity: f64,
    pub damping: f64,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self { mass: 1.0, length: 1.0, gravity: 9.81, damping: 0.1 }
    }
}

/// LQR weights and the starting setpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// State cost on the angle error
    pub q_angle: f64,
    /// State cost on the angular velocity
    pub q_velocity: f64,
    /// Input cost
    pub r: f64,
    pub initial_setpoint_deg: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { q_angle: 30.0, q_velocity: 10.0, r: 1.0, initial_setpoint_deg: -90.0 }
    }
}

/// Loop timing, saturation and initial conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub hz: f64,
    pub decimation: usize,
    pub torque_max: f64,
    pub initial_theta: f64,
    pub initial_theta_dot: f64,
    pub disturbance_std: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hz: 100.0,
            decimation: 5,
            torque_max: 10.0,
            initial_theta: 0.0,
            initial_theta_dot: 0.0,
            disturbance_std: 0.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pendulum: PendulumConfig,
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load and validate a TOML file
    pub fn load(path: &Path) -> LqrResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            LqrError::Config(msg) => LqrError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> LqrResult<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| LqrError::Config(format!("parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LqrResult<()> {
        let p = &self.pendulum;
        let c = &self.controller;
        let s = &self.simulation;

        positive("pendulum.mass", p.mass)?;
        positive("pendulum.length", p.length)?;
        positive("pendulum.gravity", p.gravity)?;
        non_negative("pendulum.damping", p.damping)?;
        non_negative("controller.q_angle", c.q_angle)?;
        non_negative("controller.q_velocity", c.q_velocity)?;
        positive("controller.r", c.r)?;
        finite("controller.initial_setpoint_deg", c.initial_setpoint_deg)?;
        positive("simulation.hz", s.hz)?;
        if s.decimation == 0 {
            return Err(LqrError::Config("simulation.decimation must be at least 1".to_string()));
        }
        positive("simulation.torque_max", s.torque_max)?;
        finite("simulation.initial_theta", s.initial_theta)?;
        finite("simulation.initial_theta_dot", s.initial_theta_dot)?;
        non_negative("simulation.disturbance_std", s.disturbance_std)?;
        Ok(())
    }

    pub fn pendulum_params(&self) -> PendulumParams {
        PendulumParams::new(self.pendulum.mass, self.pendulum.length, self.pendulum.gravity)
    }

    /// Controller period: one evaluation every `decimation` ticks
    pub fn control_dt(&self) -> f64 {
        self.simulation.decimation as f64 / self.simulation.hz
    }

    pub fn state_cost(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_vec(vec![
            self.controller.q_angle,
            self.controller.q_velocity,
        ]))
    }

    pub fn input_cost(&self) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.controller.r)
    }

    pub fn build_controller(&self) -> LqrResult<PendulumLqr> {
        let p = &self.pendulum;
        PendulumLqr::new(
            p.mass,
            p.length,
            self.controller.initial_setpoint_deg.to_radians(),
            self.state_cost(),
            self.input_cost(),
            self.control_dt(),
            p.gravity,
        )
    }

    pub fn simulator_params(&self) -> SimulatorParams {
        let s = &self.simulation;
        SimulatorParams {
            pendulum: self.pendulum_params(),
            damping: self.pendulum.damping,
            hz: s.hz,
            decimation: s.decimation,
            torque_max: s.torque_max,
            disturbance_std: s.disturbance_std,
            seed: s.seed,
        }
    }

    pub fn initial_state(&self) -> PendulumState {
        PendulumState::new(self.simulation.initial_theta, self.simulation.initial_theta_dot)
    }
}

fn finite(name: &str, value: f64) -> LqrResult<()> {
    if !value.is_finite() {
        return Err(LqrError::Config(format!("{} must be finite, got {}", name, value)));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> LqrResult<()> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(LqrError::Config(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> LqrResult<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(LqrError::Config(format!("{} must be non-negative, got {}", name, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_setup() {
        let c = Config::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.pendulum.gravity, 9.81);
        assert_eq!(c.simulation.decimation, 5);
        assert_abs_diff_eq!(c.control_dt(), 0.05, epsilon = 1e-15);
        assert_eq!(c.state_cost()[(0, 0)], 30.0);
        assert_eq!(c.state_cost()[(1, 1)], 10.0);
        assert_eq!(c.state_cost()[(0, 1)], 0.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let c = Config::from_toml(
            r#"
            [pendulum]
            mass = 2.0

            [simulation]
            decimation = 1
            "#,
        )
        .unwrap();
        assert_eq!(c.pendulum.mass, 2.0);
        assert_eq!(c.pendulum.length, 1.0);
        assert_eq!(c.simulation.decimation, 1);
        assert_eq!(c.controller, ControllerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in &[
            "[pendulum]\nmass = 0.0",
            "[pendulum]\ndamping = -1.0",
            "[controller]\nr = 0.0",
            "[simulation]\ndecimation = 0",
            "[simulation]\nhz = -100.0",
        ] {
            let err = Config::from_toml(text).unwrap_err();
            assert!(matches!(err, LqrError::Config(_)), "{}", text);
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml("[pendulum]\nmas = 1.0").unwrap_err();
        assert!(matches!(err, LqrError::Config(_)));
    }

    #[test]
    fn test_build_controller() {
        let c = Config::default();
        let controller = c.build_controller().unwrap();
        assert_abs_diff_eq!(controller.setpoint(), -std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(controller.bias_torque(), -9.81, epsilon = 1e-12);
        assert_abs_diff_eq!(controller.timestep(), 0.05, epsilon = 1e-15);

        let params = c.simulator_params();
        assert_eq!(params.decimation, 5);
        assert_eq!(params.damping, 0.1);
        assert_eq!(c.initial_state(), PendulumState::rest());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[controller]\nq_angle = 5.0\ninitial_setpoint_deg = 45.0").unwrap();
        let c = Config::load(file.path()).unwrap();
        assert_eq!(c.controller.q_angle, 5.0);
        assert_eq!(c.controller.initial_setpoint_deg, 45.0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, LqrError::Io(_)));
    }
}
