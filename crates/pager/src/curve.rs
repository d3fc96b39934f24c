use strum::{Display, EnumIter, EnumString};

/// Easing applied to an animated page change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum Curve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    FastOutSlowIn,
    Decelerate,
}

impl Curve {
    /// Maps linear progress in `[0, 1]` to eased progress. Endpoints are exact.
    pub fn transform(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => t,
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, t),
            Self::Decelerate => {
                let inverse = 1.0 - t;
                1.0 - inverse * inverse
            }
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, fraction: f64) -> f64 {
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;
    let derivative = |t: f64| (3.0 * ax * t + 2.0 * bx) * t + cx;

    let mut t = fraction;
    for _ in 0..8 {
        let x = sample(ax, bx, cx, t) - fraction;
        if x.abs() < 1e-9 {
            return sample(ay, by, cy, t);
        }
        let dx = derivative(t);
        if dx.abs() < 1e-9 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = fraction;
    for _ in 0..64 {
        let x = sample(ax, bx, cx, t);
        if (x - fraction).abs() < 1e-9 {
            break;
        }
        if x < fraction {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    sample(ay, by, cy, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_endpoints_are_exact() {
        for curve in Curve::iter() {
            assert_eq!(curve.transform(0.0), 0.0, "{curve}");
            assert_eq!(curve.transform(1.0), 1.0, "{curve}");
            assert_eq!(curve.transform(-3.0), 0.0, "{curve}");
            assert_eq!(curve.transform(7.0), 1.0, "{curve}");
        }
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in Curve::iter() {
            let mut last = 0.0;
            for i in 1..=100 {
                let value = curve.transform(i as f64 / 100.0);
                assert!(value >= last - 1e-9, "{curve} at {i}");
                last = value;
            }
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let mid = Curve::EaseInOut.transform(0.5);
        assert!((mid - 0.5).abs() < 1e-6);
        assert!(Curve::EaseIn.transform(0.25) < 0.25);
        assert!(Curve::EaseOut.transform(0.25) > 0.25);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Curve::from_str("ease_in_out").unwrap(), Curve::EaseInOut);
        assert_eq!(Curve::from_str("FAST_OUT_SLOW_IN").unwrap(), Curve::FastOutSlowIn);
        assert_eq!(Curve::Decelerate.to_string(), "decelerate");
        assert!(Curve::from_str("bouncy").is_err());
    }
}
