use crate::{
    error::{CuelineError, CuelineResult},
    value::Value,
};

/// Storage key for a control point: time quantized to 1/4096 s buckets.
///
/// Two times in the same bucket address the same point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey(i64);

impl TimeKey {
    /// Smallest time step two points can be apart, in seconds.
    pub const QUANTUM: f64 = 1.0 / 4096.0;

    pub fn from_time(time: f64) -> Self {
        Self((time / Self::QUANTUM).floor() as i64)
    }
}

/// Interpolation kernel for the segment a point opens on its right.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PointKind {
    /// Hold the point's value until the next point.
    Constant,
    /// Straight line to the next point.
    Linear,
    /// Cubic Hermite, slopes estimated from the neighbors.
    Smooth,
    /// Ease blend of the two linear extrapolations, slopes estimated from
    /// the neighbors.
    Symmetric,
    /// Ease blend with a caller-supplied slope, in value units per second.
    SymmetricUser { slope: Value },
    /// Cubic Hermite with caller-supplied incoming and outgoing slopes.
    Hermite { tangent_in: Value, tangent_out: Value },
    /// Uniform 4-point Catmull-Rom over one extra neighbor on each side.
    Spline4,
    /// Uniform 6-point Lagrange over two extra neighbors on each side.
    Spline6,
}

impl PointKind {
    pub fn symmetric_user(slope: impl Into<Value>) -> Self {
        Self::SymmetricUser {
            slope: slope.into(),
        }
    }

    pub fn hermite(tangent_in: impl Into<Value>, tangent_out: impl Into<Value>) -> Self {
        Self::Hermite {
            tangent_in: tangent_in.into(),
            tangent_out: tangent_out.into(),
        }
    }

    pub(crate) fn check_dims(&self, dims: usize) -> CuelineResult<()> {
        match self {
            Self::SymmetricUser { slope } => {
                if slope.dims() != dims {
                    return Err(CuelineError::invalid_argument(
                        "SymmetricUser slope must match the timeline dimensions",
                    ));
                }
            }
            Self::Hermite {
                tangent_in,
                tangent_out,
            } => {
                if tangent_in.dims() != dims || tangent_out.dims() != dims {
                    return Err(CuelineError::invalid_argument(
                        "Hermite tangents must match the timeline dimensions",
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn resized(self, dims: usize) -> Self {
        match self {
            Self::SymmetricUser { slope } => Self::SymmetricUser {
                slope: slope.resized(dims),
            },
            Self::Hermite {
                tangent_in,
                tangent_out,
            } => Self::Hermite {
                tangent_in: tangent_in.resized(dims),
                tangent_out: tangent_out.resized(dims),
            },
            other => other,
        }
    }

    pub(crate) fn sliced(self, first: usize, count: usize) -> Self {
        match self {
            Self::SymmetricUser { slope } => Self::SymmetricUser {
                slope: slope.sliced(first, count),
            },
            Self::Hermite {
                tangent_in,
                tangent_out,
            } => Self::Hermite {
                tangent_in: tangent_in.sliced(first, count),
                tangent_out: tangent_out.sliced(first, count),
            },
            other => other,
        }
    }
}

/// A keyed value on a timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlPoint {
    pub time: f64, // finite; exact, the key only buckets it
    pub value: Value,
    pub kind: PointKind,
}

impl ControlPoint {
    pub fn key(&self) -> TimeKey {
        TimeKey::from_time(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_bucket_by_quantum() {
        assert_eq!(TimeKey::from_time(1.0), TimeKey::from_time(1.0001));
        assert_ne!(TimeKey::from_time(1.0), TimeKey::from_time(1.0 + TimeKey::QUANTUM));
        assert_eq!(TimeKey::from_time(0.0), TimeKey::from_time(TimeKey::QUANTUM * 0.5));
    }

    #[test]
    fn negative_times_keep_bucket_order() {
        let a = TimeKey::from_time(-0.3);
        let b = TimeKey::from_time(-0.2);
        let c = TimeKey::from_time(0.2);
        assert!(a < b);
        assert!(b < c);
        assert_ne!(
            TimeKey::from_time(-TimeKey::QUANTUM * 0.5),
            TimeKey::from_time(TimeKey::QUANTUM * 0.5)
        );
    }

    #[test]
    fn kind_dims_checks_cover_tangents() {
        let slope2 = Value::from([1.0, 0.0]);
        assert!(PointKind::symmetric_user(slope2).check_dims(2).is_ok());
        assert!(PointKind::symmetric_user(slope2).check_dims(3).is_err());
        assert!(PointKind::hermite(slope2, slope2).check_dims(2).is_ok());
        assert!(PointKind::hermite(1.0, slope2).check_dims(2).is_err());
        assert!(PointKind::Linear.check_dims(4).is_ok());
    }

    #[test]
    fn resize_and_slice_carry_tangents() {
        let kind = PointKind::hermite([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        match kind.resized(2) {
            PointKind::Hermite {
                tangent_in,
                tangent_out,
            } => {
                assert_eq!(tangent_in.as_slice(), &[1.0, 2.0]);
                assert_eq!(tangent_out.as_slice(), &[4.0, 5.0]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match kind.sliced(1, 2) {
            PointKind::Hermite {
                tangent_in,
                tangent_out,
            } => {
                assert_eq!(tangent_in.as_slice(), &[2.0, 3.0]);
                assert_eq!(tangent_out.as_slice(), &[5.0, 6.0]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
