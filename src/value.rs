use crate::error::{CuelineError, CuelineResult};

/// Largest number of components a timeline value can carry.
pub const MAX_DIMENSIONS: usize = 4;

/// A fixed-capacity vector of 1 to [`MAX_DIMENSIONS`] components.
///
/// Serializes as a bare JSON array of exactly `dims` numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value {
    data: [f64; MAX_DIMENSIONS], // components at and past dims are zero
    dims: usize,                 // 1..=MAX_DIMENSIONS
}

impl Value {
    /// Builds a value from `1..=MAX_DIMENSIONS` components.
    pub fn from_slice(components: &[f64]) -> CuelineResult<Self> {
        if components.is_empty() || components.len() > MAX_DIMENSIONS {
            return Err(CuelineError::out_of_range(format!(
                "Value needs 1..={MAX_DIMENSIONS} components, got {}",
                components.len()
            )));
        }
        let mut data = [0.0; MAX_DIMENSIONS];
        data[..components.len()].copy_from_slice(components);
        Ok(Self {
            data,
            dims: components.len(),
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data[..self.dims]
    }

    // dims must already be validated by the caller
    pub(crate) fn zero(dims: usize) -> Self {
        Self {
            data: [0.0; MAX_DIMENSIONS],
            dims,
        }
    }

    // truncates or zero-extends to dims components
    pub(crate) fn resized(self, dims: usize) -> Self {
        let kept = self.dims.min(dims);
        let mut data = [0.0; MAX_DIMENSIONS];
        data[..kept].copy_from_slice(&self.data[..kept]);
        Self { data, dims }
    }

    // callers hold first + count <= dims
    pub(crate) fn sliced(self, first: usize, count: usize) -> Self {
        let mut data = [0.0; MAX_DIMENSIONS];
        data[..count].copy_from_slice(&self.data[first..first + count]);
        Self { data, dims: count }
    }

    pub(crate) fn component_min(self, other: Self) -> Self {
        let dims = self.dims.max(other.dims);
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..dims {
            data[i] = self.data[i].min(other.data[i]);
        }
        Self { data, dims }
    }

    pub(crate) fn component_max(self, other: Self) -> Self {
        let dims = self.dims.max(other.dims);
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..dims {
            data[i] = self.data[i].max(other.data[i]);
        }
        Self { data, dims }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self {
            data: [x, 0.0, 0.0, 0.0],
            dims: 1,
        }
    }
}

impl From<[f64; 1]> for Value {
    fn from(c: [f64; 1]) -> Self {
        Self {
            data: [c[0], 0.0, 0.0, 0.0],
            dims: 1,
        }
    }
}

impl From<[f64; 2]> for Value {
    fn from(c: [f64; 2]) -> Self {
        Self {
            data: [c[0], c[1], 0.0, 0.0],
            dims: 2,
        }
    }
}

impl From<[f64; 3]> for Value {
    fn from(c: [f64; 3]) -> Self {
        Self {
            data: [c[0], c[1], c[2], 0.0],
            dims: 3,
        }
    }
}

impl From<[f64; 4]> for Value {
    fn from(c: [f64; 4]) -> Self {
        Self { data: c, dims: 4 }
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        let dims = self.dims.max(rhs.dims);
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..dims {
            data[i] = self.data[i] + rhs.data[i];
        }
        Self { data, dims }
    }
}

impl std::ops::Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        let dims = self.dims.max(rhs.dims);
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..dims {
            data[i] = self.data[i] - rhs.data[i];
        }
        Self { data, dims }
    }
}

impl std::ops::Mul<f64> for Value {
    type Output = Value;

    fn mul(self, rhs: f64) -> Value {
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..self.dims {
            data[i] = self.data[i] * rhs;
        }
        Self {
            data,
            dims: self.dims,
        }
    }
}

impl std::ops::Div<f64> for Value {
    type Output = Value;

    fn div(self, rhs: f64) -> Value {
        let mut data = [0.0; MAX_DIMENSIONS];
        for i in 0..self.dims {
            data[i] = self.data[i] / rhs;
        }
        Self {
            data,
            dims: self.dims,
        }
    }
}

impl std::ops::Index<usize> for Value {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.as_slice()[index]
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.as_slice())
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let components = Vec::<f64>::deserialize(deserializer)?;
        Self::from_slice(&components).map_err(serde::de::Error::custom)
    }
}

/// What a host boundary observes: a bare number for 1-dimensional values,
/// an array otherwise.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Sample {
    Scalar(f64),
    Vector(Value),
}

impl From<Value> for Sample {
    fn from(v: Value) -> Self {
        if v.dims() == 1 {
            Self::Scalar(v[0])
        } else {
            Self::Vector(v)
        }
    }
}
