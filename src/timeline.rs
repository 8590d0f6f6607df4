use std::collections::BTreeMap;
use std::ops::Bound;

use crate::{
    error::{CuelineError, CuelineResult},
    interp::{self, Window},
    point::{ControlPoint, PointKind, TimeKey},
    value::{MAX_DIMENSIONS, Sample, Value},
};

/// A multi-dimensional keyframed curve: ordered control points, each with a
/// vector value and an interpolation kernel, answering value and derivative
/// queries at arbitrary times.
///
/// Times quantize to [`TimeKey::QUANTUM`] buckets, so two points can never
/// sit closer than one bucket; adding into an occupied bucket replaces the
/// point there. Queries before the first point and after the last clamp to
/// the end values.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    dims: usize, // 1..=MAX_DIMENSIONS
    points: BTreeMap<TimeKey, ControlPoint>,
}

impl Timeline {
    /// Sampling width used by [`Timeline::derivative`], in seconds.
    pub const DEFAULT_DERIVATIVE_RANGE: f64 = 0.01;

    pub fn new(dims: usize) -> CuelineResult<Self> {
        if dims < 1 || dims > MAX_DIMENSIONS {
            return Err(CuelineError::out_of_range(format!(
                "Timeline dimensions must be within 1..={MAX_DIMENSIONS}"
            )));
        }
        Ok(Self {
            dims,
            points: BTreeMap::new(),
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the first point, 0.0 when empty.
    pub fn start(&self) -> f64 {
        self.first_point().map_or(0.0, |p| p.time)
    }

    /// Time of the last point, 0.0 when empty.
    pub fn end(&self) -> f64 {
        self.last_point().map_or(0.0, |p| p.time)
    }

    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    /// Inserts a point, replacing whatever occupied its time bucket.
    pub fn add(
        &mut self,
        time: f64,
        value: impl Into<Value>,
        kind: PointKind,
    ) -> CuelineResult<&mut Self> {
        if !time.is_finite() {
            return Err(CuelineError::invalid_argument("point time must be finite"));
        }
        let value = value.into();
        if value.dims() != self.dims {
            return Err(CuelineError::invalid_argument(format!(
                "point value has {} components, timeline has {}",
                value.dims(),
                self.dims
            )));
        }
        kind.check_dims(self.dims)?;
        let point = ControlPoint { time, value, kind };
        self.points.insert(point.key(), point);
        Ok(self)
    }

    /// Inserts a point that inherits the kind of the point at or before
    /// `time` (the first point's kind when prepending,
    /// [`PointKind::Symmetric`] into an empty timeline). Kinds that carry
    /// slopes inherit as their estimated-slope counterpart.
    pub fn add_auto(&mut self, time: f64, value: impl Into<Value>) -> CuelineResult<&mut Self> {
        let kind = self.inherited_kind(time);
        self.add(time, value, kind)
    }

    fn inherited_kind(&self, time: f64) -> PointKind {
        let donor = self
            .points
            .range(..=TimeKey::from_time(time))
            .next_back()
            .map(|(_, p)| p.kind)
            .or_else(|| self.first_point().map(|p| p.kind)); // prepends inherit forward
        match donor {
            Some(PointKind::SymmetricUser { .. }) => PointKind::Symmetric,
            Some(PointKind::Hermite { .. }) => PointKind::Smooth,
            Some(kind) => kind,
            None => PointKind::Symmetric,
        }
    }

    /// Removes and returns the point in `time`'s bucket.
    pub fn remove(&mut self, time: f64) -> Option<ControlPoint> {
        if !time.is_finite() {
            return None;
        }
        self.points.remove(&TimeKey::from_time(time))
    }

    /// Removes every point with `start <= time < end` (bucketed), returning
    /// how many were dropped.
    pub fn remove_range(&mut self, start: f64, end: f64) -> usize {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return 0;
        }
        let lo = TimeKey::from_time(start);
        let hi = TimeKey::from_time(end);
        let before = self.points.len();
        self.points.retain(|key, _| *key < lo || *key >= hi);
        before - self.points.len()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Displaces every point by `offset` seconds. All-or-nothing: fails
    /// without touching the timeline if any shifted time leaves f64 range.
    pub fn shift_time(&mut self, offset: f64) -> CuelineResult<()> {
        if !offset.is_finite() {
            return Err(CuelineError::invalid_argument("time offset must be finite"));
        }
        if self.points.values().any(|p| !(p.time + offset).is_finite()) {
            return Err(CuelineError::invalid_argument(
                "time offset overflows a point time",
            ));
        }
        // points that collide after quantization merge, the later one wins
        self.points = std::mem::take(&mut self.points)
            .into_values()
            .map(|mut p| {
                p.time += offset;
                (p.key(), p)
            })
            .collect();
        Ok(())
    }

    /// Changes the component count of the timeline and of every stored
    /// value and tangent, truncating or zero-extending.
    #[tracing::instrument(skip(self))]
    pub fn set_dimensions(&mut self, dims: usize) -> CuelineResult<()> {
        if dims < 1 || dims > MAX_DIMENSIONS {
            return Err(CuelineError::out_of_range(format!(
                "Timeline dimensions must be within 1..={MAX_DIMENSIONS}"
            )));
        }
        if dims == self.dims {
            return Ok(());
        }
        for point in self.points.values_mut() {
            point.value = point.value.resized(dims);
            point.kind = point.kind.resized(dims);
        }
        self.dims = dims;
        Ok(())
    }

    /// The value at `time`. Total: empty timelines yield the zero vector,
    /// times outside the keyed range clamp to the end values.
    pub fn value(&self, time: f64) -> Value {
        let (Some(first), Some(last)) = (self.first_point(), self.last_point()) else {
            return Value::zero(self.dims);
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let key = TimeKey::from_time(time);
        let mut before = self.points.range(..=key);
        let Some((_, p0)) = before.next_back() else {
            return first.value; // query sits left of every bucket
        };
        let mut after = self.points.range((Bound::Excluded(key), Bound::Unbounded));
        let Some((_, p1)) = after.next() else {
            return last.value; // query sits in the final bucket
        };
        let prev = before.next_back().map(|(_, p)| p);
        let prev2 = before.next_back().map(|(_, p)| p);
        let next = after.next().map(|(_, p)| p);
        let next2 = after.next().map(|(_, p)| p);

        interp::segment_value(
            &Window {
                prev2,
                prev,
                p0,
                p1,
                next,
                next2,
            },
            time,
        )
    }

    /// Centered finite difference of [`Timeline::value`] over
    /// [`Timeline::DEFAULT_DERIVATIVE_RANGE`].
    pub fn derivative(&self, time: f64) -> Value {
        self.derivative_with(time, Self::DEFAULT_DERIVATIVE_RANGE)
    }

    /// Centered finite difference over `range` seconds. Ranges below
    /// [`TimeKey::QUANTUM`], NaN included, clamp to the quantum.
    pub fn derivative_with(&self, time: f64, range: f64) -> Value {
        let h = range.max(TimeKey::QUANTUM) * 0.5;
        (self.value(time + h) - self.value(time - h)) / (2.0 * h)
    }

    /// [`Timeline::value`] narrowed to the host-boundary shape.
    pub fn sample(&self, time: f64) -> Sample {
        Sample::from(self.value(time))
    }

    /// [`Timeline::derivative`] narrowed to the host-boundary shape.
    pub fn sample_derivative(&self, time: f64) -> Sample {
        Sample::from(self.derivative(time))
    }

    /// The distinct time of every point, ascending.
    pub fn times(&self) -> impl Iterator<Item = f64> {
        self.points.values().map(|p| p.time)
    }

    /// Every point, ascending by time.
    pub fn points(&self) -> impl Iterator<Item = &ControlPoint> {
        self.points.values()
    }

    /// The point in `time`'s bucket, if any.
    pub fn get(&self, time: f64) -> Option<&ControlPoint> {
        if !time.is_finite() {
            return None;
        }
        self.points.get(&TimeKey::from_time(time))
    }

    /// The point nearest to `time`, the earlier one on ties.
    pub fn closest(&self, time: f64) -> Option<&ControlPoint> {
        if !time.is_finite() {
            return None;
        }
        let key = TimeKey::from_time(time);
        let below = self.points.range(..=key).next_back().map(|(_, p)| p);
        let above = self
            .points
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(_, p)| p);
        match (below, above) {
            (Some(b), Some(a)) => {
                if (time - b.time).abs() <= (a.time - time).abs() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (pick, None) | (None, pick) => pick,
        }
    }

    /// Component-wise minimum and maximum over the control-point values in
    /// `[start, end]` (bucketed, inclusive). Interpolated overshoot between
    /// points is not considered.
    pub fn min_max(&self, start: f64, end: f64) -> Option<(Value, Value)> {
        if !start.is_finite() || !end.is_finite() || end < start {
            return None;
        }
        let lo = TimeKey::from_time(start);
        let hi = TimeKey::from_time(end);
        let mut values = self.points.range(lo..=hi).map(|(_, p)| p.value);
        let head = values.next()?;
        let mut min = head;
        let mut max = head;
        for v in values {
            min = min.component_min(v);
            max = max.component_max(v);
        }
        Some((min, max))
    }

    /// An independent 1-dimensional timeline of component `index`.
    pub fn project(&self, index: usize) -> CuelineResult<Timeline> {
        self.slice(index, 1)
    }

    /// An independent timeline of components `first..first + count`, with
    /// tangents carried through component-wise.
    #[tracing::instrument(skip(self))]
    pub fn slice(&self, first: usize, count: usize) -> CuelineResult<Timeline> {
        if first >= self.dims || count < 1 || count > self.dims - first {
            return Err(CuelineError::out_of_range(format!(
                "component slice first={first} count={count} exceeds {} dimensions",
                self.dims
            )));
        }
        let points = self
            .points
            .iter()
            .map(|(key, p)| {
                (
                    *key,
                    ControlPoint {
                        time: p.time,
                        value: p.value.sliced(first, count),
                        kind: p.kind.sliced(first, count),
                    },
                )
            })
            .collect();
        Ok(Timeline {
            dims: count,
            points,
        })
    }

    fn first_point(&self) -> Option<&ControlPoint> {
        self.points.values().next()
    }

    fn last_point(&self) -> Option<&ControlPoint> {
        self.points.values().next_back()
    }
}

impl serde::Serialize for Timeline {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Timeline", 2)?;
        s.serialize_field("dimensions", &self.dims)?;
        s.serialize_field("points", &self.points.values().collect::<Vec<_>>())?;
        s.end()
    }
}

impl<'de> serde::Deserialize<'de> for Timeline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Repr {
            dimensions: usize,
            #[serde(default)]
            points: Vec<ControlPoint>,
        }

        // rebuilt through add() so stored invariants hold for any input
        let repr = Repr::deserialize(deserializer)?;
        let mut timeline = Timeline::new(repr.dimensions).map_err(serde::de::Error::custom)?;
        for p in repr.points {
            timeline
                .add(p.time, p.value, p.kind)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(kind: PointKind) -> Timeline {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(0.0, 0.0, kind)
            .unwrap()
            .add(1.0, 10.0, PointKind::Linear)
            .unwrap();
        tl
    }

    #[test]
    fn rejects_dimensions_outside_bounds() {
        assert!(Timeline::new(0).is_err());
        assert!(Timeline::new(5).is_err());
        assert_eq!(Timeline::new(4).unwrap().dims(), 4);
    }

    #[test]
    fn empty_timeline_queries_are_zero() {
        let tl = Timeline::new(2).unwrap();
        assert!(tl.is_empty());
        assert_eq!(tl.len(), 0);
        assert_eq!(tl.start(), 0.0);
        assert_eq!(tl.end(), 0.0);
        assert_eq!(tl.duration(), 0.0);
        assert_eq!(tl.value(5.0).as_slice(), &[0.0, 0.0]);
        assert_eq!(tl.derivative(5.0).as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn linear_midpoint_is_exact() {
        let tl = ramp(PointKind::Linear);
        assert_eq!(tl.value(0.5)[0], 5.0);
    }

    #[test]
    fn constant_holds_until_the_next_point() {
        let tl = ramp(PointKind::Constant);
        assert_eq!(tl.value(0.999)[0], 0.0);
        assert_eq!(tl.value(1.0)[0], 10.0);
    }

    #[test]
    fn queries_clamp_outside_the_keyed_range() {
        let tl = ramp(PointKind::Linear);
        assert_eq!(tl.value(-100.0)[0], 0.0);
        assert_eq!(tl.value(101.0)[0], 10.0);
    }

    #[test]
    fn re_add_replaces_the_point() {
        let mut tl = ramp(PointKind::Linear);
        tl.add(0.0, 4.0, PointKind::Constant).unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.value(0.5)[0], 4.0); // constant now holds
    }

    #[test]
    fn times_in_one_bucket_share_a_point() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(1.0, 1.0, PointKind::Linear)
            .unwrap()
            .add(1.0001, 2.0, PointKind::Linear)
            .unwrap();
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.value(1.0)[0], 2.0);
    }

    #[test]
    fn add_validates_dimensions_and_time() {
        let mut tl = Timeline::new(2).unwrap();
        assert!(tl.add(0.0, 1.0, PointKind::Linear).is_err());
        assert!(
            tl.add(0.0, [1.0, 2.0], PointKind::symmetric_user(1.0))
                .is_err()
        );
        assert!(tl.add(f64::NAN, [1.0, 2.0], PointKind::Linear).is_err());
        assert!(tl.is_empty()); // nothing was stored along the way
        assert!(tl.add(0.0, [1.0, 2.0], PointKind::Linear).is_ok());
    }

    #[test]
    fn add_auto_inherits_the_preceding_kind() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add_auto(0.0, 1.0).unwrap();
        assert_eq!(tl.get(0.0).map(|p| p.kind), Some(PointKind::Symmetric));

        tl.add(1.0, 2.0, PointKind::Constant).unwrap();
        tl.add_auto(2.0, 3.0).unwrap();
        assert_eq!(tl.get(2.0).map(|p| p.kind), Some(PointKind::Constant));

        tl.add(3.0, 4.0, PointKind::hermite(0.0, 0.0)).unwrap();
        tl.add_auto(4.0, 5.0).unwrap();
        assert_eq!(tl.get(4.0).map(|p| p.kind), Some(PointKind::Smooth));
    }

    #[test]
    fn add_auto_prepend_inherits_from_the_first_point() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(1.0, 2.0, PointKind::Constant).unwrap();
        tl.add_auto(0.0, 1.0).unwrap();
        assert_eq!(tl.get(0.0).map(|p| p.kind), Some(PointKind::Constant));

        let mut tl = Timeline::new(1).unwrap();
        tl.add(1.0, 2.0, PointKind::hermite(0.0, 0.0)).unwrap();
        tl.add_auto(0.0, 1.0).unwrap();
        assert_eq!(tl.get(0.0).map(|p| p.kind), Some(PointKind::Smooth));
    }

    #[test]
    fn remove_returns_the_bucketed_point() {
        let mut tl = ramp(PointKind::Linear);
        let removed = tl.remove(1.00001).unwrap(); // same bucket as 1.0
        assert_eq!(removed.time, 1.0);
        assert_eq!(tl.len(), 1);
        assert!(tl.remove(1.0).is_none());
        assert!(tl.remove(f64::NAN).is_none());
    }

    #[test]
    fn remove_range_is_half_open() {
        let mut tl = Timeline::new(1).unwrap();
        for t in 0..4 {
            tl.add(t as f64, t as f64, PointKind::Linear).unwrap();
        }
        assert_eq!(tl.remove_range(1.0, 3.0), 2);
        let times: Vec<f64> = tl.times().collect();
        assert_eq!(times, vec![0.0, 3.0]);
        assert_eq!(tl.remove_range(3.0, 1.0), 0);
    }

    #[test]
    fn clear_empties_the_timeline() {
        let mut tl = ramp(PointKind::Linear);
        tl.clear();
        assert!(tl.is_empty());
        assert_eq!(tl.value(0.5)[0], 0.0);
    }

    #[test]
    fn shift_time_displaces_every_point() {
        let mut tl = ramp(PointKind::Linear);
        tl.shift_time(0.5).unwrap();
        let times: Vec<f64> = tl.times().collect();
        assert_eq!(times, vec![0.5, 1.5]);
        assert_eq!(tl.value(1.0)[0], 5.0);
    }

    #[test]
    fn shift_time_is_all_or_nothing() {
        let mut tl = ramp(PointKind::Linear);
        assert!(tl.shift_time(f64::NAN).is_err());
        tl.add(f64::MAX, 1.0, PointKind::Linear).unwrap();
        assert!(tl.shift_time(f64::MAX).is_err());
        assert_eq!(tl.start(), 0.0); // untouched
    }

    #[test]
    fn set_dimensions_roundtrips_kept_components() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(0.0, 7.0, PointKind::hermite(1.0, 2.0))
            .unwrap()
            .add(1.0, 9.0, PointKind::Linear)
            .unwrap();

        tl.set_dimensions(3).unwrap();
        assert_eq!(tl.dims(), 3);
        assert_eq!(tl.value(0.0).as_slice(), &[7.0, 0.0, 0.0]);
        match tl.get(0.0).map(|p| p.kind) {
            Some(PointKind::Hermite { tangent_in, .. }) => {
                assert_eq!(tangent_in.as_slice(), &[1.0, 0.0, 0.0]);
            }
            other => panic!("unexpected kind {other:?}"),
        }

        tl.set_dimensions(1).unwrap();
        assert_eq!(tl.value(0.0).as_slice(), &[7.0]);
        assert!(tl.set_dimensions(0).is_err());
    }

    #[test]
    fn derivative_recovers_the_linear_slope() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(0.0, 0.0, PointKind::Linear)
            .unwrap()
            .add(1.0, 4.0, PointKind::Linear)
            .unwrap();
        assert!((tl.derivative(0.5)[0] - 4.0).abs() < 1e-9);
        // sub-quantum and non-finite ranges clamp instead of exploding
        assert!((tl.derivative_with(0.5, 0.0)[0] - 4.0).abs() < 1e-9);
        assert!((tl.derivative_with(0.5, f64::NAN)[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn projection_is_independent_of_the_source() {
        let mut tl = Timeline::new(3).unwrap();
        tl.add(0.0, [1.0, 2.0, 3.0], PointKind::Linear)
            .unwrap()
            .add(1.0, [4.0, 5.0, 6.0], PointKind::Linear)
            .unwrap();

        let mut y = tl.project(1).unwrap();
        assert_eq!(y.dims(), 1);
        assert_eq!(y.value(0.5)[0], 3.5);

        y.add(2.0, 9.0, PointKind::Linear).unwrap();
        assert_eq!(tl.len(), 2); // source untouched
        tl.clear();
        assert_eq!(y.len(), 3); // projection untouched

        assert!(tl.project(3).is_err());
    }

    #[test]
    fn slice_carries_tangent_components() {
        let mut tl = Timeline::new(3).unwrap();
        tl.add(0.0, [1.0, 2.0, 3.0], PointKind::hermite([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]))
            .unwrap();
        let sliced = tl.slice(1, 2).unwrap();
        match sliced.get(0.0).map(|p| p.kind) {
            Some(PointKind::Hermite {
                tangent_in,
                tangent_out,
            }) => {
                assert_eq!(tangent_in.as_slice(), &[2.0, 3.0]);
                assert_eq!(tangent_out.as_slice(), &[5.0, 6.0]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(tl.slice(2, 2).is_err());
        assert!(tl.slice(0, 0).is_err());
    }

    #[test]
    fn closest_picks_the_nearer_side() {
        let mut tl = Timeline::new(1).unwrap();
        tl.add(0.0, 0.0, PointKind::Linear)
            .unwrap()
            .add(1.0, 1.0, PointKind::Linear)
            .unwrap();
        assert_eq!(tl.closest(0.2).map(|p| p.time), Some(0.0));
        assert_eq!(tl.closest(0.9).map(|p| p.time), Some(1.0));
        assert_eq!(tl.closest(0.5).map(|p| p.time), Some(0.0)); // tie -> earlier
        assert_eq!(tl.closest(50.0).map(|p| p.time), Some(1.0));
        assert!(Timeline::new(1).unwrap().closest(0.0).is_none());
    }

    #[test]
    fn min_max_covers_the_bucketed_window() {
        let mut tl = Timeline::new(2).unwrap();
        tl.add(0.0, [1.0, 5.0], PointKind::Linear)
            .unwrap()
            .add(1.0, [3.0, -2.0], PointKind::Linear)
            .unwrap()
            .add(2.0, [-4.0, 0.0], PointKind::Linear)
            .unwrap();

        let (min, max) = tl.min_max(0.0, 1.5).unwrap();
        assert_eq!(min.as_slice(), &[1.0, -2.0]);
        assert_eq!(max.as_slice(), &[3.0, 5.0]);

        assert!(tl.min_max(5.0, 6.0).is_none());
        assert!(tl.min_max(1.0, 0.0).is_none());
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let tl = ramp(PointKind::Linear);
        let mut copy = tl.clone();
        assert_eq!(copy, tl);
        copy.add(0.5, 3.0, PointKind::Constant).unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.value(0.75)[0], 7.5); // still the plain ramp
    }

    #[test]
    fn json_round_trip_preserves_the_timeline() {
        let mut tl = Timeline::new(2).unwrap();
        tl.add(0.0, [0.0, 1.0], PointKind::Smooth)
            .unwrap()
            .add(1.0, [2.0, 3.0], PointKind::symmetric_user([0.5, 0.5]))
            .unwrap()
            .add(2.0, [4.0, -1.0], PointKind::Constant)
            .unwrap();

        let json = serde_json::to_string(&tl).unwrap();
        let back: Timeline = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tl);
    }

    #[test]
    fn deserialization_revalidates_invariants() {
        assert!(serde_json::from_str::<Timeline>(r#"{"dimensions":9,"points":[]}"#).is_err());
        assert!(
            serde_json::from_str::<Timeline>(
                r#"{"dimensions":2,"points":[{"time":0.0,"value":[1.0],"kind":"Linear"}]}"#
            )
            .is_err()
        );
        let empty: Timeline = serde_json::from_str(r#"{"dimensions":3}"#).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.dims(), 3);
    }
}
