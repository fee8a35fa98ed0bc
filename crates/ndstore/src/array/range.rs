//! Minimum and maximum of an array's values.
use super::NdArray;

impl NdArray {
    /// Minimum and maximum value in a single linear pass.
    ///
    /// Panics when the array has no elements. NaN never compares smaller or
    /// larger, so a NaN is only reported if it is the first element.
    pub fn range(&self) -> (f64, f64) {
        self.try_range().expect("no elements in array")
    }

    pub fn try_range(&self) -> Option<(f64, f64)> {
        let (&first, rest) = self.as_slice().split_first()?;
        let mut min = first;
        let mut max = first;
        for &value in rest {
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_min_and_max() {
        let a = NdArray::with_data(&[5], Some(vec![3.5, -1.0, 7.2, 7.2, 0.0]));
        assert_eq!(a.range(), (-1.0, 7.2));
    }

    #[test]
    fn single_element_is_both_ends() {
        assert_eq!(NdArray::scalar(2.25).range(), (2.25, 2.25));
        let a = NdArray::with_data(&[1, 1], Some(vec![-8.0]));
        assert_eq!(a.range(), (-8.0, -8.0));
    }

    #[test]
    fn nan_is_skipped_after_the_first_element() {
        let a = NdArray::with_data(&[3], Some(vec![1.0, f64::NAN, -4.0]));
        assert_eq!(a.range(), (-4.0, 1.0));

        let leading = NdArray::with_data(&[2], Some(vec![f64::NAN, 3.0]));
        let (min, max) = leading.range();
        assert!(min.is_nan());
        assert!(max.is_nan());
    }

    #[test]
    fn empty_array_has_no_range() {
        assert_eq!(NdArray::new(&[4, 0]).try_range(), None);
    }

    #[test]
    #[should_panic(expected = "no elements in array")]
    fn empty_array_range_panics() {
        NdArray::new(&[0]).range();
    }
}
