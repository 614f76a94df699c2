//! Headless pendulum simulation driven by a torque controller
//!
//! Each tick:
//! 1. every `decimation` ticks, ask the controller for a new torque
//! 2. clamp the torque to `[-torque_max, torque_max]`
//! 3. integrate `theta_ddot = -(g/l) sin(theta) + (tau + w)/(m l^2) - (b/m) theta_dot`
//!    with semi-implicit Euler (velocity first, then angle), `w` being an optional
//!    Gaussian torque disturbance
//! 4. wrap theta into (-PI, PI]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::{error, info};

use crate::common::{LqrError, LqrResult, PendulumParams, PendulumState, TorqueController};
use crate::simulation::setpoint::{apply_setpoint_text, ScheduledSetpoint};

/// Plant and loop parameters of the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorParams {
    pub pendulum: PendulumParams,
    /// Viscous damping coefficient
    pub damping: f64,
    /// Simulation ticks per second
    pub hz: f64,
    /// Ticks between controller evaluations
    pub decimation: usize,
    /// Saturation limit [N m]
    pub torque_max: f64,
    /// Standard deviation of the torque disturbance [N m], 0 disables it
    pub disturbance_std: f64,
    pub seed: u64,
}

impl SimulatorParams {
    pub fn dt(&self) -> f64 {
        1.0 / self.hz
    }

    /// Period at which the controller is evaluated
    pub fn control_dt(&self) -> f64 {
        self.decimation as f64 / self.hz
    }
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            pendulum: PendulumParams::new(1.0, 1.0, 9.81),
            damping: 0.1,
            hz: 100.0,
            decimation: 5,
            torque_max: 10.0,
            disturbance_std: 0.0,
            seed: 0,
        }
    }
}

/// One recorded simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub theta: f64,
    pub theta_dot: f64,
    /// Applied (saturated) torque
    pub torque: f64,
    pub setpoint: f64,
}

/// Pendulum simulator owning the true state and the controller
pub struct PendulumSimulator<C> {
    controller: C,
    params: SimulatorParams,
    state: PendulumState,
    torque: f64,
    counter: usize,
    time: f64,
    rng: StdRng,
    disturbance: Option<Normal<f64>>,
    trajectory: Vec<Sample>,
    rejected_inputs: usize,
}

impl<C: TorqueController> PendulumSimulator<C> {
    pub fn new(controller: C, params: SimulatorParams, initial: PendulumState) -> LqrResult<Self> {
        if !(params.hz.is_finite() && params.hz > 0.0) {
            return Err(LqrError::InvalidParameter(format!("hz must be positive, got {}", params.hz)));
        }
        if params.decimation == 0 {
            return Err(LqrError::InvalidParameter("decimation must be at least 1".to_string()));
        }
        if !(params.torque_max.is_finite() && params.torque_max > 0.0) {
            return Err(LqrError::InvalidParameter(format!(
                "torque_max must be positive, got {}",
                params.torque_max
            )));
        }
        if !(params.disturbance_std.is_finite() && params.disturbance_std >= 0.0) {
            return Err(LqrError::InvalidParameter(format!(
                "disturbance_std must be finite and non-negative, got {}",
                params.disturbance_std
            )));
        }
        let disturbance = if params.disturbance_std > 0.0 {
            let normal = Normal::new(0.0, params.disturbance_std)
                .map_err(|e| LqrError::InvalidParameter(format!("disturbance_std: {}", e)))?;
            Some(normal)
        } else {
            None
        };

        let mut state = initial;
        state.normalize_theta();

        Ok(PendulumSimulator {
            controller,
            params,
            state,
            torque: 0.0,
            counter: 0,
            time: 0.0,
            rng: StdRng::seed_from_u64(params.seed),
            disturbance,
            trajectory: Vec::new(),
            rejected_inputs: 0,
        })
    }

    /// Advance one tick and return the recorded sample
    pub fn step(&mut self) -> Sample {
        let dt = self.params.dt();
        let p = &self.params.pendulum;

        if self.counter == 0 {
            self.torque = self
                .controller
                .control(self.state.theta, self.state.theta_dot);
        }
        self.torque = self.torque.clamp(-self.params.torque_max, self.params.torque_max);

        let noise = match &self.disturbance {
            Some(normal) => normal.sample(&mut self.rng),
            None => 0.0,
        };

        let theta_ddot = -(p.gravity / p.length) * self.state.theta.sin()
            + (self.torque + noise) / p.inertia()
            - (self.params.damping / p.mass) * self.state.theta_dot;

        self.state.theta_dot += theta_ddot * dt;
        self.state.theta += self.state.theta_dot * dt;
        self.state.normalize_theta();

        self.counter = (self.counter + 1) % self.params.decimation;
        self.time += dt;

        let sample = Sample {
            time: self.time,
            theta: self.state.theta,
            theta_dot: self.state.theta_dot,
            torque: self.torque,
            setpoint: self.controller.setpoint(),
        };
        self.trajectory.push(sample);
        sample
    }

    /// Hand setpoint text to the controller as if typed by a user.
    ///
    /// Rejected input is logged and counted; the previous setpoint stays.
    pub fn submit_setpoint(&mut self, text: &str) -> Option<f64> {
        match apply_setpoint_text(&mut self.controller, text) {
            Ok(theta) => Some(theta),
            Err(LqrError::InputParse(_)) => {
                self.rejected_inputs += 1;
                None
            }
            Err(e) => {
                error!("setpoint {:?} rejected by controller: {}", text, e);
                self.rejected_inputs += 1;
                None
            }
        }
    }

    /// Simulate `duration` seconds, submitting each scheduled setpoint once its time is reached
    pub fn run(&mut self, duration: f64, schedule: &[ScheduledSetpoint]) -> &[Sample] {
        let mut pending: Vec<&ScheduledSetpoint> = schedule.iter().collect();
        pending.sort_by(|a, b| a.time.total_cmp(&b.time));
        let mut pending = pending.into_iter().peekable();

        let end = self.time + duration;
        let start_len = self.trajectory.len();
        while self.time + 0.5 * self.params.dt() < end {
            let now = self.time;
            while let Some(event) = pending.next_if(|e| e.time <= now) {
                self.submit_setpoint(&event.text);
            }
            self.step();
        }

        info!(
            time = self.time,
            theta_deg = self.state.theta.to_degrees(),
            setpoint_deg = self.controller.setpoint().to_degrees(),
            torque = self.torque,
            "simulation finished"
        );
        &self.trajectory[start_len..]
    }

    pub fn state(&self) -> PendulumState {
        self.state
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn trajectory(&self) -> &[Sample] {
        &self.trajectory
    }

    pub fn rejected_inputs(&self) -> usize {
        self.rejected_inputs
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn params(&self) -> &SimulatorParams {
        &self.params
    }
}
