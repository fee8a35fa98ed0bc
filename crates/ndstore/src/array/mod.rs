//! The `NdArray` value type.
//!
//! An `NdArray` owns its shape and a flat row-major buffer of `f64`. The
//! element at multi-index `(i0, .., i{r-1})` lives at
//! `i0 * strides[0] + .. + i{r-1} * 1`, where `strides[k]` is the product of
//! the extents after `k`. A rank-0 array is a scalar backed by one element.
mod range;
mod transpose;

use std::error::Error;
use std::fmt;
use std::ops::{Index, IndexMut};

use ndarray::{ArrayD, IxDyn};

#[derive(Clone, Debug, PartialEq)]
pub struct NdArray {
    dims: Vec<usize>,
    data: Vec<f64>,
}

/// Number of elements described by `dims`. The empty product is 1.
pub fn element_count(dims: &[usize]) -> usize {
    dims.iter().product()
}

impl NdArray {
    /// Allocates a zero-filled array of the given shape.
    pub fn new(dims: &[usize]) -> Self {
        Self::with_data(dims, None)
    }

    /// Builds an array over a caller-supplied buffer, or allocates one when
    /// `data` is `None`.
    ///
    /// Panics if the buffer length does not match the element count of `dims`.
    /// Use [`NdArray::from_shape_vec`] when the length is not known to match.
    pub fn with_data(dims: &[usize], data: Option<Vec<f64>>) -> Self {
        let len = element_count(dims);
        let data = match data {
            Some(buffer) => {
                assert_eq!(
                    buffer.len(),
                    len,
                    "buffer of length {} does not fit shape {:?}",
                    buffer.len(),
                    dims
                );
                buffer
            }
            None => vec![0.0; len],
        };
        Self {
            dims: dims.to_vec(),
            data,
        }
    }

    pub fn from_shape_vec(dims: &[usize], data: Vec<f64>) -> Result<Self, ShapeError> {
        let expected = element_count(dims);
        if data.len() != expected {
            return Err(ShapeError {
                dims: dims.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self {
            dims: dims.to_vec(),
            data,
        })
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            data: vec![value],
        }
    }

    /// A fresh array with the same shape as `other`. Values are not copied.
    pub fn clone_shape(other: &NdArray) -> Self {
        Self::new(&other.dims)
    }

    /// True when both arrays have the same rank and the same extent in every
    /// dimension.
    pub fn conformant(a: &NdArray, b: &NdArray) -> bool {
        a.dims == b.dims
    }

    pub fn is_conformant(&self, other: &NdArray) -> bool {
        Self::conformant(self, other)
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.rank()];
        for k in (0..self.rank().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * self.dims[k + 1];
        }
        strides
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Flat offset of a multi-index, or `None` when the index has the wrong
    /// rank or falls outside the array.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.rank() {
            return None;
        }
        let mut offset = 0;
        for (&i, &extent) in index.iter().zip(self.dims.iter()) {
            if i >= extent {
                return None;
            }
            offset = offset * extent + i;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset(index).map(|offset| self.data[offset])
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.dims, self.data)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    pub fn to_ndarray(&self) -> ArrayD<f64> {
        // The buffer length always matches the shape.
        ArrayD::from_shape_vec(IxDyn(&self.dims), self.data.clone())
            .unwrap_or_else(|_| unreachable!("NdArray buffer does not match its shape"))
    }

    pub(crate) fn replace_parts(&mut self, dims: Vec<usize>, data: Vec<f64>) {
        debug_assert_eq!(element_count(&dims), data.len());
        self.dims = dims;
        self.data = data;
    }
}

impl From<ArrayD<f64>> for NdArray {
    fn from(value: ArrayD<f64>) -> Self {
        let dims = value.shape().to_vec();
        let data = match value.as_slice() {
            Some(contiguous) => contiguous.to_vec(),
            None => value.iter().copied().collect(),
        };
        Self { dims, data }
    }
}

impl Index<&[usize]> for NdArray {
    type Output = f64;

    fn index(&self, index: &[usize]) -> &Self::Output {
        let offset = self
            .offset(index)
            .unwrap_or_else(|| panic!("index {:?} out of bounds for shape {:?}", index, self.dims));
        &self.data[offset]
    }
}

impl IndexMut<&[usize]> for NdArray {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        let offset = self
            .offset(index)
            .unwrap_or_else(|| panic!("index {:?} out of bounds for shape {:?}", index, self.dims));
        &mut self.data[offset]
    }
}

#[derive(Debug, Clone)]
pub struct ShapeError {
    dims: Vec<usize>,
    len: usize,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid shape {:?} for buffer of length {}",
            self.dims, self.len
        )
    }
}

impl Error for ShapeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_matches_product_of_dims() {
        for dims in [vec![], vec![0], vec![7], vec![2, 3], vec![3, 4, 5], vec![2, 0, 9]] {
            let a = NdArray::new(&dims);
            assert_eq!(a.rank(), dims.len());
            assert_eq!(a.len(), dims.iter().product::<usize>());
        }
    }

    #[test]
    fn scalar_has_one_element() {
        let a = NdArray::scalar(4.5);
        assert_eq!(a.rank(), 0);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(&[]), Some(4.5));
    }

    #[test]
    fn with_data_takes_the_buffer() {
        let a = NdArray::with_data(&[2, 2], Some(vec![1.0, 2.0, 3.0, 4.0]));
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        let b = NdArray::with_data(&[2, 2], None);
        assert_eq!(b.as_slice(), &[0.0; 4]);
    }

    #[test]
    #[should_panic(expected = "does not fit shape")]
    fn with_data_rejects_wrong_length() {
        NdArray::with_data(&[2, 3], Some(vec![0.0; 5]));
    }

    #[test]
    fn from_shape_vec_reports_mismatch() {
        let err = NdArray::from_shape_vec(&[2, 3], vec![0.0; 4]).unwrap_err();
        assert_eq!(err.to_string(), "invalid shape [2, 3] for buffer of length 4");
    }

    #[test]
    fn clone_shape_does_not_copy_values() {
        let a = NdArray::with_data(&[3], Some(vec![1.0, 2.0, 3.0]));
        let b = NdArray::clone_shape(&a);
        assert!(b.is_conformant(&a));
        assert_eq!(b.as_slice(), &[0.0; 3]);
    }

    #[test]
    fn conformant_is_order_sensitive() {
        let a = NdArray::new(&[2, 3]);
        let b = NdArray::new(&[3, 2]);
        let c = NdArray::new(&[2, 3, 1]);
        assert!(NdArray::conformant(&a, &NdArray::new(&[2, 3])));
        assert!(!NdArray::conformant(&a, &b));
        assert!(!NdArray::conformant(&a, &c));
    }

    #[test]
    fn strides_and_offsets_are_row_major() {
        let mut a = NdArray::new(&[3, 4, 5]);
        assert_eq!(a.strides(), vec![20, 5, 1]);
        assert_eq!(a.offset(&[1, 2, 3]), Some(33));
        assert_eq!(a.offset(&[3, 0, 0]), None);
        assert_eq!(a.offset(&[1, 2]), None);
        a[&[2, 3, 4][..]] = 9.0;
        assert_eq!(a.as_slice()[59], 9.0);
    }

    #[test]
    fn ndarray_conversion_keeps_layout() {
        let a = NdArray::with_data(&[2, 3], Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let nd = a.to_ndarray();
        assert_eq!(nd[[1, 0]], 4.0);
        let back = NdArray::from(nd.reversed_axes());
        assert_eq!(back.dims(), &[3, 2]);
        assert_eq!(back.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
