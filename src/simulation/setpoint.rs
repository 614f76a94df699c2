//! Free-form setpoint text input
//!
//! Text is read as an angle in degrees, converted to radians and wrapped into
//! (-PI, PI]. Anything that is not a finite number is rejected with
//! [`InputParseError`] and the controller keeps its previous setpoint.

use std::str::FromStr;

use tracing::warn;

use crate::common::{normalize_angle, InputParseError, LqrResult, TorqueController};

/// Parse degrees text into a wrapped angle in radians
pub fn parse_setpoint(text: &str) -> Result<f64, InputParseError> {
    let degrees: f64 = text
        .trim()
        .parse()
        .map_err(|_| InputParseError { input: text.to_string() })?;
    if !degrees.is_finite() {
        return Err(InputParseError { input: text.to_string() });
    }
    Ok(normalize_angle(degrees.to_radians()))
}

/// Parse `text` and re-target `controller`, returning the applied angle [rad]
///
/// A parse failure leaves the controller untouched and is returned as
/// `LqrError::InputParse`; controller failures propagate unchanged.
pub fn apply_setpoint_text<C>(controller: &mut C, text: &str) -> LqrResult<f64>
where
    C: TorqueController + ?Sized,
{
    let theta = match parse_setpoint(text) {
        Ok(theta) => theta,
        Err(e) => {
            warn!(
                input = text,
                "invalid setpoint input, keeping {:.2} deg",
                controller.setpoint().to_degrees()
            );
            return Err(e.into());
        }
    };
    controller.set_setpoint(theta)?;
    Ok(theta)
}

/// Setpoint text submitted at a simulated time
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSetpoint {
    pub time: f64,
    pub text: String,
}

impl ScheduledSetpoint {
    pub fn new(time: f64, text: &str) -> Self {
        Self { time, text: text.to_string() }
    }
}

/// `<time_s>:<text>`, e.g. `2.5:90`. The text part is kept verbatim.
impl FromStr for ScheduledSetpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time, text) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <time_s>:<degrees>, got {:?}", s))?;
        let time: f64 = time
            .trim()
            .parse()
            .map_err(|_| format!("invalid time {:?} in {:?}", time, s))?;
        if !time.is_finite() || time < 0.0 {
            return Err(format!("time must be finite and non-negative in {:?}", s));
        }
        Ok(ScheduledSetpoint::new(time, text))
    }
}
