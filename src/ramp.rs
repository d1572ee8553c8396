//! Sub-second motion curves for the second hand.
//!
//! Each curve maps a sub-frame index `i` in `0..frame_rate` to the fraction
//! of the way the hand has travelled from one second mark to the next.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RampCurve {
    /// Never stops; the hand sweeps at constant speed.
    ContinuousSweep,
    /// Linear advance over the first third of the second, then a pause.
    LinearHold,
    /// Single sinusoidal ease.
    Sinusoid,
    /// Sum of two phase-shifted sinusoids.
    DualSinusoid,
    /// Clockwork motor: accelerate, cruise, decelerate, rest.
    Clockwork,
    /// Clockwork with a longer cruise phase.
    #[default]
    ClockworkLong,
}

impl RampCurve {
    pub const ALL: [Self; 6] = [
        Self::ContinuousSweep,
        Self::LinearHold,
        Self::Sinusoid,
        Self::DualSinusoid,
        Self::Clockwork,
        Self::ClockworkLong,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::ContinuousSweep => "continuous-sweep",
            Self::LinearHold => "linear-hold",
            Self::Sinusoid => "sinusoid",
            Self::DualSinusoid => "dual-sinusoid",
            Self::Clockwork => "clockwork",
            Self::ClockworkLong => "clockwork-long",
        }
    }

    /// Raw curve value at `x` in `[0, 1)`, before normalization.
    fn eval(self, x: f64) -> f64 {
        match self {
            Self::ContinuousSweep => x,
            Self::LinearHold => {
                if x <= 0.35 {
                    2.86 * x
                } else {
                    1.0
                }
            }
            Self::Sinusoid => {
                if x <= 0.68 {
                    ((9.0 * x + PI).sin() + 9.0 * x) / (2.0 * PI)
                } else {
                    1.0
                }
            }
            Self::DualSinusoid => {
                if x <= 0.721 {
                    ((9.0 * x + PI).sin() + 0.7 * (9.0 * x + 0.85 * PI).sin() + 17.0 * x - 0.316)
                        / (3.79 * PI)
                } else {
                    1.0
                }
            }
            Self::Clockwork => {
                if x <= 0.3 {
                    3.5 * x * x
                } else if x <= 0.6 {
                    1.7 * x - 0.195
                } else if x <= 0.8 {
                    1.7 * x - 0.625 * x * x
                } else {
                    1.0
                }
            }
            Self::ClockworkLong => {
                if x <= 0.3 {
                    3.5 * x * x
                } else if x <= 0.622 {
                    1.7 * x - 0.195
                } else if x <= 0.793 {
                    1.7 * x - 0.625 * x * x + 0.0453
                } else {
                    1.0
                }
            }
        }
    }

    /// Progress values for every sub-frame of one second.
    ///
    /// The result starts at exactly 0, never decreases, stays within
    /// `[0, 1]`, and holds at exactly 1 once a curve reaches its rest phase.
    pub fn ramp(self, frame_rate: u32) -> Vec<f64> {
        let fps = f64::from(frame_rate);
        let mut values = Vec::with_capacity(frame_rate as usize);
        let mut floor = 0.0f64;
        for i in 0..frame_rate {
            let raw = if i == 0 { 0.0 } else { round4(self.eval(f64::from(i) / fps)) };
            floor = floor.max(raw.clamp(0.0, 1.0));
            values.push(floor);
        }
        values
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

impl fmt::Display for RampCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RampCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|curve| curve.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|c| c.name()).collect();
                format!("unknown curve '{s}', expected one of: {}", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_starts_at_zero_and_never_decreases() {
        for curve in RampCurve::ALL {
            for fps in [1, 2, 5, 24, 30, 60, 144, 1200] {
                let ramp = curve.ramp(fps);
                assert_eq!(ramp.len(), fps as usize);
                assert_eq!(ramp[0], 0.0, "{curve} @ {fps}");
                for pair in ramp.windows(2) {
                    assert!(pair[0] <= pair[1], "{curve} @ {fps}: {pair:?}");
                }
                assert!(*ramp.last().unwrap() <= 1.0);
            }
        }
    }

    #[test]
    fn hold_phase_is_exactly_one() {
        let cases = [
            (RampCurve::LinearHold, 0.35),
            (RampCurve::Sinusoid, 0.68),
            (RampCurve::DualSinusoid, 0.721),
            (RampCurve::Clockwork, 0.8),
            (RampCurve::ClockworkLong, 0.793),
        ];
        for (curve, hold) in cases {
            let fps = 30;
            for (i, v) in curve.ramp(fps).into_iter().enumerate() {
                if i as f64 / fps as f64 > hold {
                    assert_eq!(v, 1.0, "{curve} frame {i}");
                }
            }
        }
    }

    #[test]
    fn continuous_sweep_is_linear() {
        let ramp = RampCurve::ContinuousSweep.ramp(4);
        assert_eq!(ramp, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn clockwork_dip_is_flattened() {
        // the deceleration branch starts below the cruise branch's end value
        let ramp = RampCurve::Clockwork.ramp(100);
        assert_eq!(ramp[60], 0.825);
        assert_eq!(ramp[61], 0.825);
        assert_eq!(ramp[62], 0.825);
        assert!(ramp[70] > 0.825);
    }

    #[test]
    fn parses_names() {
        assert_eq!("sinusoid".parse::<RampCurve>(), Ok(RampCurve::Sinusoid));
        assert_eq!(
            RampCurve::ClockworkLong.to_string().parse::<RampCurve>(),
            Ok(RampCurve::ClockworkLong)
        );
        assert!("bounce".parse::<RampCurve>().is_err());
    }
}
