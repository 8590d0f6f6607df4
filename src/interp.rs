use crate::{
    point::{ControlPoint, PointKind},
    value::Value,
};

/// Neighborhood of the segment under evaluation. `p0` and `p1` bracket the
/// query time; the optional slots widen outward as far as the timeline has
/// points. Six points is the most any kernel looks at.
pub(crate) struct Window<'a> {
    pub prev2: Option<&'a ControlPoint>,
    pub prev: Option<&'a ControlPoint>,
    pub p0: &'a ControlPoint,
    pub p1: &'a ControlPoint,
    pub next: Option<&'a ControlPoint>,
    pub next2: Option<&'a ControlPoint>,
}

/// Evaluates the segment at `time`, dispatching on the kind of the point
/// that opens it. `time` outside `[p0.time, p1.time]` clamps.
pub(crate) fn segment_value(w: &Window<'_>, time: f64) -> Value {
    let dt = w.p1.time - w.p0.time; // > 0, keys are strictly ordered in time
    let u = ((time - w.p0.time) / dt).clamp(0.0, 1.0);

    match w.p0.kind {
        PointKind::Constant => w.p0.value,
        PointKind::Linear => w.p0.value * (1.0 - u) + w.p1.value * u,
        PointKind::Smooth | PointKind::Hermite { .. } => hermite(w, u),
        PointKind::Symmetric | PointKind::SymmetricUser { .. } => symmetric(w, u),
        PointKind::Spline4 => spline4_window(w, u),
        PointKind::Spline6 => spline6_window(w, u),
    }
}

// Cubic Hermite basis over the segment slopes. Slopes are value units per
// second, so they scale by the segment span inside the basis.
fn hermite(w: &Window<'_>, u: f64) -> Value {
    let dt = w.p1.time - w.p0.time;
    let m0 = outgoing_slope(w.prev, w.p0, w.p1);
    let m1 = incoming_slope(w.p0, w.p1, w.next);
    let u2 = u * u;
    let u3 = u2 * u;
    let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
    let h10 = u3 - 2.0 * u2 + u;
    let h01 = 3.0 * u2 - 2.0 * u3;
    let h11 = u3 - u2;
    w.p0.value * h00 + m0 * (h10 * dt) + w.p1.value * h01 + m1 * (h11 * dt)
}

// Smoothstep-weighted blend of the linear extrapolations from both ends.
fn symmetric(w: &Window<'_>, u: f64) -> Value {
    let dt = w.p1.time - w.p0.time;
    let m0 = outgoing_slope(w.prev, w.p0, w.p1);
    let m1 = incoming_slope(w.p0, w.p1, w.next);
    let f = u * u * (3.0 - 2.0 * u);
    let from_p0 = w.p0.value + m0 * (u * dt);
    let from_p1 = w.p1.value - m1 * ((1.0 - u) * dt);
    from_p0 * (1.0 - f) + from_p1 * f
}

fn spline4_window(w: &Window<'_>, u: f64) -> Value {
    match (w.prev, w.next) {
        (Some(prev), Some(next)) => spline4(prev.value, w.p0.value, w.p1.value, next.value, u),
        // not enough neighbors for the 4-point fit
        _ => hermite(w, u),
    }
}

fn spline4(y0: Value, y1: Value, y2: Value, y3: Value, u: f64) -> Value {
    let a0 = y0 * -0.5 + y1 * 1.5 - y2 * 1.5 + y3 * 0.5;
    let a1 = y0 - y1 * 2.5 + y2 * 2.0 - y3 * 0.5;
    let a2 = (y2 - y0) * 0.5;
    ((a0 * u + a1) * u + a2) * u + y1
}

fn spline6_window(w: &Window<'_>, u: f64) -> Value {
    match (w.prev2, w.prev, w.next, w.next2) {
        (Some(a), Some(b), Some(c), Some(d)) => {
            lagrange6([a.value, b.value, w.p0.value, w.p1.value, c.value, d.value], u)
        }
        // degrade toward the ends of the sequence
        _ => spline4_window(w, u),
    }
}

// 6-point Lagrange interpolation on the uniform grid -2..=3, evaluated
// inside the central cell.
fn lagrange6(y: [Value; 6], u: f64) -> Value {
    const DENOM: [f64; 6] = [-120.0, 24.0, -12.0, 12.0, -24.0, 120.0];
    let d = [u + 2.0, u + 1.0, u, u - 1.0, u - 2.0, u - 3.0];

    let mut acc = Value::zero(y[2].dims());
    for i in 0..6 {
        let mut basis = 1.0;
        for (j, dj) in d.iter().enumerate() {
            if j != i {
                basis *= dj;
            }
        }
        acc = acc + y[i] * (basis / DENOM[i]);
    }
    acc
}

/// Slope leaving `p` into the segment toward `next`. Points that carry a
/// slope contribute it to any adjacent segment; the rest are estimated.
fn outgoing_slope(prev: Option<&ControlPoint>, p: &ControlPoint, next: &ControlPoint) -> Value {
    match p.kind {
        PointKind::SymmetricUser { slope } => slope,
        PointKind::Hermite { tangent_out, .. } => tangent_out,
        _ => estimated_slope(prev, p, Some(next)),
    }
}

/// Slope entering `p` out of the segment from `prev`.
fn incoming_slope(prev: &ControlPoint, p: &ControlPoint, next: Option<&ControlPoint>) -> Value {
    match p.kind {
        PointKind::SymmetricUser { slope } => slope,
        PointKind::Hermite { tangent_in, .. } => tangent_in,
        _ => estimated_slope(Some(prev), p, next),
    }
}

// Catmull-Rom estimate: successor minus predecessor over their time span,
// one-sided where a neighbor is missing.
fn estimated_slope(
    prev: Option<&ControlPoint>,
    p: &ControlPoint,
    next: Option<&ControlPoint>,
) -> Value {
    match (prev, next) {
        (Some(a), Some(b)) => (b.value - a.value) / (b.time - a.time),
        (None, Some(b)) => (b.value - p.value) / (b.time - p.time),
        (Some(a), None) => (p.value - a.value) / (p.time - a.time),
        (None, None) => Value::zero(p.value.dims()),
    }
}
