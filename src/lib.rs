//! Multi-dimensional keyframed timelines.
//!
//! A [`Timeline`] is an ordered set of time-tagged control points, each with
//! a small vector [`Value`] and a per-point interpolation kernel
//! ([`PointKind`]), answering [`Timeline::value`] and
//! [`Timeline::derivative`] queries at arbitrary times.
//!
//! The moving parts:
//!
//! - **Quantized keys**: point times bucket to 1/4096 s
//!   ([`TimeKey::QUANTUM`]); adding into an occupied bucket replaces the
//!   point there.
//! - **Per-segment kernels**: the point on the left of a segment picks the
//!   kernel, so constant, linear, Hermite and spline stretches mix freely on
//!   one timeline. Kernels that need neighbors the sequence cannot provide
//!   degrade to the next simpler kernel instead of failing.
//! - **Total queries**: evaluation never errors; times outside the keyed
//!   range clamp to the end values and the empty timeline reads as zero.
//! - **Projection**: [`Timeline::project`] and [`Timeline::slice`] split off
//!   independent lower-dimensional copies, tangents included.
//!
//! Errors ([`CuelineError`]) only arise while building or reshaping a
//! timeline: dimension mismatches, non-finite times, out-of-range
//! projections.
#![forbid(unsafe_code)]

pub mod error;
pub mod point;
pub mod timeline;
pub mod value;

mod interp;

pub use error::{CuelineError, CuelineResult};
pub use point::{ControlPoint, PointKind, TimeKey};
pub use timeline::Timeline;
pub use value::{MAX_DIMENSIONS, Sample, Value};
