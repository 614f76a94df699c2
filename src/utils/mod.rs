//! Utility modules for pendulum_lqr

pub mod visualization;

pub use visualization::{angle_plot, colors, torque_plot, SeriesStyle, Visualizer};
