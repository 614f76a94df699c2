//! Visualization utilities for pendulum_lqr
//!
//! Time-series plots of a simulation run using gnuplot.

use std::path::Path;

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth};

use crate::common::{LqrError, LqrResult};
use crate::simulation::Sample;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const THETA: &str = BLUE;
    pub const SETPOINT: &str = RED;
    pub const TORQUE: &str = BLACK;
    pub const LIMIT: &str = GRAY;
}

/// Style for a plotted series
#[derive(Debug, Clone)]
pub struct SeriesStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl SeriesStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

#[derive(Debug, Clone)]
struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    style: SeriesStyle,
}

/// Collects series and renders them onto a single pair of axes
pub struct Visualizer {
    title: String,
    x_label: String,
    y_label: String,
    y_range: Option<(f64, f64)>,
    series: Vec<Series>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            x_label: "time [s]".to_string(),
            y_label: String::new(),
            y_range: None,
            series: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_y_label(&mut self, label: &str) -> &mut Self {
        self.y_label = label.to_string();
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn plot_series(&mut self, x: &[f64], y: &[f64], style: &SeriesStyle) -> &mut Self {
        self.series.push(Series { x: x.to_vec(), y: y.to_vec(), style: style.clone() });
        self
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Save plot to PNG file
    pub fn save_png(&self, path: &Path, width: u32, height: u32) -> LqrResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let mut fg = self.render();
        fg.save_to_png(path, width, height)
            .map_err(|e| LqrError::Visualization(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut fg = Figure::new();
        {
            let axes = fg.axes2d();
            if !self.title.is_empty() {
                axes.set_title(&self.title, &[]);
            }
            axes.set_x_label(&self.x_label, &[]);
            axes.set_y_label(&self.y_label, &[]);
            if let Some((min, max)) = self.y_range {
                axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
            }
            for s in &self.series {
                axes.lines(&s.x, &s.y, &[
                    Caption(s.style.caption.as_str()),
                    Color(s.style.color.as_str()),
                    LineWidth(s.style.line_width),
                ]);
            }
        }
        fg
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Angle and setpoint [deg] over time
pub fn angle_plot(samples: &[Sample]) -> Visualizer {
    let t: Vec<f64> = samples.iter().map(|s| s.time).collect();
    let theta: Vec<f64> = samples.iter().map(|s| s.theta.to_degrees()).collect();
    let target: Vec<f64> = samples.iter().map(|s| s.setpoint.to_degrees()).collect();

    let mut vis = Visualizer::new();
    vis.set_title("Pendulum LQR")
        .set_y_label("angle [deg]")
        .set_y_range(-180.0, 180.0)
        .plot_series(&t, &theta, &SeriesStyle::new(colors::THETA, "theta"))
        .plot_series(&t, &target, &SeriesStyle::new(colors::SETPOINT, "setpoint").with_line_width(1.0));
    vis
}

/// Applied torque over time with the saturation limits
pub fn torque_plot(samples: &[Sample], torque_max: f64) -> Visualizer {
    let t: Vec<f64> = samples.iter().map(|s| s.time).collect();
    let torque: Vec<f64> = samples.iter().map(|s| s.torque).collect();
    let span = match (t.first(), t.last()) {
        (Some(&a), Some(&b)) => vec![a, b],
        _ => Vec::new(),
    };

    let mut vis = Visualizer::new();
    vis.set_title("Pendulum LQR torque")
        .set_y_label("torque [N m]")
        .set_y_range(-1.1 * torque_max, 1.1 * torque_max)
        .plot_series(&t, &torque, &SeriesStyle::new(colors::TORQUE, "torque"));
    if !span.is_empty() {
        let limit = SeriesStyle::new(colors::LIMIT, "limit").with_line_width(1.0);
        vis.plot_series(&span, &[torque_max, torque_max], &limit)
            .plot_series(&span, &[-torque_max, -torque_max], &limit);
    }
    vis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        (1..=10)
            .map(|i| Sample {
                time: i as f64 * 0.1,
                theta: 0.1 * i as f64,
                theta_dot: 0.0,
                torque: 1.0,
                setpoint: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_series_style() {
        let style = SeriesStyle::new(colors::RED, "Test").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::RED);
    }

    #[test]
    fn test_angle_plot_series() {
        let vis = angle_plot(&samples());
        assert_eq!(vis.series_count(), 2);
        assert_eq!(vis.y_range, Some((-180.0, 180.0)));
    }

    #[test]
    fn test_torque_plot_limits() {
        assert_eq!(torque_plot(&samples(), 10.0).series_count(), 3);
        assert_eq!(torque_plot(&[], 10.0).series_count(), 1);
    }
}
