//! Typed copies of engine variables.
//!
//! Matrices are stored record-major: element `(row, col)` of a `[rows, cols]`
//! buffer lives at `row * cols + col`, which is the engine's column-major
//! `(cols, rows)` layout read back without transposing.

use crate::error::{MfError, MfResult};
use crate::numeric::{Real, ensure_integral};

/// Element type of a raw buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Double,
    Int,
    Bool,
    Text,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Double => "double",
            DType::Int => "int",
            DType::Bool => "bool",
            DType::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Double(Vec<f64>),
    Int(Vec<i32>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl RawData {
    fn len(&self) -> usize {
        match self {
            RawData::Double(v) => v.len(),
            RawData::Int(v) => v.len(),
            RawData::Bool(v) => v.len(),
            RawData::Text(v) => v.len(),
        }
    }

    fn dtype(&self) -> DType {
        match self {
            RawData::Double(_) => DType::Double,
            RawData::Int(_) => DType::Int,
            RawData::Bool(_) => DType::Bool,
            RawData::Text(_) => DType::Text,
        }
    }
}

/// A shaped, typed buffer as exchanged with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffer {
    shape: Vec<usize>,
    data: RawData,
}

impl RawBuffer {
    /// Build a buffer, checking that `shape` covers exactly the data.
    pub fn new(shape: Vec<usize>, data: RawData) -> MfResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(MfError::ShapeMismatch {
                what: "raw buffer".to_string(),
                expected: shape,
                actual: vec![data.len()],
            });
        }
        Ok(Self { shape, data })
    }

    pub fn doubles(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: RawData::Double(values),
        }
    }

    pub fn ints(values: Vec<i32>) -> Self {
        Self {
            shape: vec![values.len()],
            data: RawData::Int(values),
        }
    }

    pub fn texts<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        Self {
            shape: vec![values.len()],
            data: RawData::Text(values),
        }
    }

    pub fn bools(values: Vec<bool>) -> Self {
        Self {
            shape: vec![values.len()],
            data: RawData::Bool(values),
        }
    }

    /// A `[rows, cols]` double matrix from row slices.
    pub fn double_matrix(rows: usize, cols: usize, values: Vec<f64>) -> MfResult<Self> {
        Self::new(vec![rows, cols], RawData::Double(values))
    }

    pub fn scalar_double(v: f64) -> Self {
        Self::doubles(vec![v])
    }

    pub fn scalar_int(v: i32) -> Self {
        Self::ints(vec![v])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &RawData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RawData {
        &mut self.data
    }

    /// Width of a record-major matrix; 1 for vectors.
    pub fn cols(&self) -> usize {
        if self.shape.len() > 1 {
            self.shape[1..].iter().product()
        } else {
            1
        }
    }

    /// Number of records (leading dimension).
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn as_doubles(&self) -> MfResult<&[f64]> {
        match &self.data {
            RawData::Double(v) => Ok(v),
            other => Err(type_mismatch("buffer", DType::Double, other.dtype())),
        }
    }

    pub fn as_ints(&self) -> MfResult<&[i32]> {
        match &self.data {
            RawData::Int(v) => Ok(v),
            other => Err(type_mismatch("buffer", DType::Int, other.dtype())),
        }
    }

    pub fn as_texts(&self) -> MfResult<&[String]> {
        match &self.data {
            RawData::Text(v) => Ok(v),
            other => Err(type_mismatch("buffer", DType::Text, other.dtype())),
        }
    }

    /// Numeric element at flat position `i`, widening ints and bools.
    pub fn get_f64(&self, i: usize) -> MfResult<Real> {
        let len = self.len();
        let oob = || MfError::IndexOutOfRange {
            what: "raw buffer element",
            index: i,
            len,
        };
        match &self.data {
            RawData::Double(v) => v.get(i).copied().ok_or_else(oob),
            RawData::Int(v) => v.get(i).map(|&x| x as Real).ok_or_else(oob),
            RawData::Bool(v) => v.get(i).map(|&b| if b { 1.0 } else { 0.0 }).ok_or_else(oob),
            RawData::Text(_) => Err(type_mismatch("buffer", DType::Double, DType::Text)),
        }
    }

    /// Integer element at flat position `i`.
    pub fn get_i32(&self, i: usize) -> MfResult<i32> {
        match &self.data {
            RawData::Int(v) => v.get(i).copied().ok_or(MfError::IndexOutOfRange {
                what: "raw buffer element",
                index: i,
                len: v.len(),
            }),
            RawData::Double(_) | RawData::Bool(_) => ensure_integral(self.get_f64(i)?, "element"),
            RawData::Text(_) => Err(type_mismatch("buffer", DType::Int, DType::Text)),
        }
    }

    /// Store a numeric value at flat position `i`, narrowing for int buffers.
    pub fn set_f64(&mut self, i: usize, value: Real) -> MfResult<()> {
        let len = self.len();
        if i >= len {
            return Err(MfError::IndexOutOfRange {
                what: "raw buffer element",
                index: i,
                len,
            });
        }
        match &mut self.data {
            RawData::Double(v) => v[i] = value,
            RawData::Int(v) => v[i] = ensure_integral(value, "element")?,
            RawData::Bool(v) => v[i] = value != 0.0,
            RawData::Text(_) => return Err(type_mismatch("buffer", DType::Text, DType::Double)),
        }
        Ok(())
    }

    pub fn set_i32(&mut self, i: usize, value: i32) -> MfResult<()> {
        self.set_f64(i, value as Real)
    }

    pub fn set_text(&mut self, i: usize, value: &str) -> MfResult<()> {
        match &mut self.data {
            RawData::Text(v) => {
                let len = v.len();
                let slot = v.get_mut(i).ok_or(MfError::IndexOutOfRange {
                    what: "raw buffer element",
                    index: i,
                    len,
                })?;
                *slot = value.to_string();
                Ok(())
            }
            other => Err(type_mismatch("buffer", other.dtype(), DType::Text)),
        }
    }

    /// Check that `other` may replace this buffer in place.
    pub fn ensure_same_layout(&self, other: &RawBuffer, what: &str) -> MfResult<()> {
        if self.shape != other.shape {
            return Err(MfError::ShapeMismatch {
                what: what.to_string(),
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        if self.dtype() != other.dtype() {
            return Err(type_mismatch(what, self.dtype(), other.dtype()));
        }
        Ok(())
    }
}

pub fn type_mismatch(what: &str, expected: DType, actual: DType) -> MfError {
    MfError::TypeMismatch {
        what: what.to_string(),
        expected: expected.name(),
        actual: actual.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inconsistent_shape() {
        let err = RawBuffer::new(vec![2, 3], RawData::Double(vec![0.0; 5])).unwrap_err();
        assert!(matches!(err, MfError::ShapeMismatch { .. }));
    }

    #[test]
    fn matrix_is_record_major() {
        let m = RawBuffer::double_matrix(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        // row 1, col 2
        assert_eq!(m.get_f64(3 + 2).unwrap(), 6.0);
    }

    #[test]
    fn int_buffers_reject_fractional_writes() {
        let mut b = RawBuffer::ints(vec![0, 0]);
        b.set_f64(1, 4.0).unwrap();
        assert_eq!(b.as_ints().unwrap(), &[0, 4]);
        assert!(matches!(
            b.set_f64(0, 0.5),
            Err(MfError::TypeMismatch { .. })
        ));
        assert!(matches!(
            b.set_f64(2, 1.0),
            Err(MfError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn layout_check_compares_shape_and_type() {
        let a = RawBuffer::doubles(vec![1.0, 2.0]);
        assert!(a.ensure_same_layout(&RawBuffer::doubles(vec![0.0, 0.0]), "x").is_ok());
        assert!(matches!(
            a.ensure_same_layout(&RawBuffer::doubles(vec![0.0]), "x"),
            Err(MfError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            a.ensure_same_layout(&RawBuffer::ints(vec![0, 0]), "x"),
            Err(MfError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn text_access() {
        let mut t = RawBuffer::texts(["WEL", "DRN"]);
        t.set_text(1, "GHB").unwrap();
        assert_eq!(t.as_texts().unwrap(), &["WEL".to_string(), "GHB".to_string()]);
        assert!(t.get_f64(0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn record_major_set_touches_one_cell(
            rows in 1usize..8,
            cols in 1usize..5,
            pick in any::<(usize, usize)>(),
            value in -1e6f64..1e6,
        ) {
            let (i, j) = (pick.0 % rows, pick.1 % cols);
            let start: Vec<f64> = (0..rows * cols).map(|k| k as f64).collect();
            let mut m = RawBuffer::double_matrix(rows, cols, start.clone()).unwrap();
            m.set_f64(i * cols + j, value).unwrap();

            prop_assert_eq!(m.get_f64(i * cols + j).unwrap(), value);
            for (k, &v) in start.iter().enumerate() {
                if k != i * cols + j {
                    prop_assert_eq!(m.get_f64(k).unwrap(), v);
                }
            }
            prop_assert!(m.get_f64(rows * cols).is_err());
        }
    }
}
