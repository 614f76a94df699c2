//
// Headless pendulum simulation under LQR control.
//
// Setpoint changes are given as `<time_s>:<degrees>` and are fed to the
// controller exactly like text typed into an input box; malformed text is
// reported and ignored.
//
// Example:
//   pendulum_lqr --config config/pendulum.toml --duration 12 \
//       --setpoint 4:45 --setpoint 8:180 --plot img/pendulum/run.png
//

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pendulum_lqr::config::Config;
use pendulum_lqr::utils::{angle_plot, torque_plot};
use pendulum_lqr::{LqrResult, PendulumSimulator, ScheduledSetpoint};

#[derive(Debug, Parser)]
#[command(name = "pendulum_lqr", about = "Simulate a pendulum held at a setpoint by an LQR controller")]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated time [s]
    #[arg(short, long, default_value_t = 10.0)]
    duration: f64,

    /// Setpoint text submitted at a simulated time, as <time_s>:<degrees>
    #[arg(short, long = "setpoint")]
    setpoints: Vec<ScheduledSetpoint>,

    /// Write angle and torque plots; `_torque` is appended to the stem for the second one
    #[arg(short, long)]
    plot: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> LqrResult<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let controller = config.build_controller()?;
    info!(
        setpoint_deg = controller.setpoint().to_degrees(),
        bias_torque = controller.bias_torque(),
        k_angle = controller.gain()[(0, 0)],
        k_velocity = controller.gain()[(0, 1)],
        control_dt = controller.timestep(),
        "controller ready"
    );

    let params = config.simulator_params();
    let mut sim = PendulumSimulator::new(controller, params, config.initial_state())?;
    sim.run(args.duration, &args.setpoints);

    let state = sim.state();
    println!("Simulation finished");
    println!(
        "Final state: theta={:.2} [deg], theta_dot={:.3} [rad/s], target={:.2} [deg], torque={:.2} [N m]",
        state.theta.to_degrees(),
        state.theta_dot,
        sim.controller().setpoint().to_degrees(),
        sim.torque()
    );
    if sim.rejected_inputs() > 0 {
        println!("Rejected setpoint inputs: {}", sim.rejected_inputs());
    }

    if let Some(path) = &args.plot {
        angle_plot(sim.trajectory()).save_png(path, 800, 600)?;
        let torque_path = torque_plot_path(path);
        torque_plot(sim.trajectory(), params.torque_max).save_png(&torque_path, 800, 600)?;
        info!("plots saved to {} and {}", path.display(), torque_path.display());
    }
    Ok(())
}

fn torque_plot_path(path: &std::path::Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pendulum".to_string());
    path.with_file_name(format!("{}_torque.png", stem))
}
