//! Full axis-reversal transpose.
//!
//! Dimension `k` of the source becomes dimension `rank - 1 - k` of the
//! result. The copy walks the source from the outermost dimension inwards;
//! one unit step along source dimension `d` moves `prod_after(d)` elements in
//! the source and `prod_before(d)` elements in the destination.
use super::NdArray;

fn rtranspose(
    curdim: usize,
    dims: &[usize],
    curindex: usize,
    curindex_t: usize,
    data: &[f64],
    data_t: &mut [f64],
) {
    let rank = dims.len();
    if rank == 0 {
        data_t[0] = data[0];
        return;
    }

    let prod_before: usize = dims[..curdim].iter().product();
    let prod_after: usize = dims[curdim + 1..].iter().product();

    if curdim == rank - 1 {
        for i in 0..dims[curdim] {
            data_t[curindex_t + i * prod_before] = data[curindex + i];
        }
    } else {
        for i in 0..dims[curdim] {
            rtranspose(
                curdim + 1,
                dims,
                curindex + i * prod_after,
                curindex_t + i * prod_before,
                data,
                data_t,
            );
        }
    }
}

impl NdArray {
    /// Reverses the dimension order in place, e.g. `[2, 3]` becomes `[3, 2]`.
    ///
    /// Applying it twice restores the original array.
    pub fn transpose(&mut self) {
        let mut data_t = vec![0.0; self.len()];
        if !data_t.is_empty() {
            rtranspose(0, self.dims(), 0, 0, self.as_slice(), &mut data_t);
        }
        let mut dims = self.dims().to_vec();
        dims.reverse();
        self.replace_parts(dims, data_t);
    }

    pub fn transposed(&self) -> NdArray {
        let mut out = self.clone();
        out.transpose();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(dims: &[usize]) -> NdArray {
        let len = dims.iter().product::<usize>();
        NdArray::with_data(dims, Some((0..len).map(|v| v as f64).collect()))
    }

    #[test]
    fn transposes_two_by_three() {
        let mut a = NdArray::with_data(&[2, 3], Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        a.transpose();
        assert_eq!(a.dims(), &[3, 2]);
        assert_eq!(a.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn scalar_and_vector_are_unchanged() {
        let mut s = NdArray::scalar(-2.0);
        s.transpose();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.as_slice(), &[-2.0]);

        let mut v = iota(&[5]);
        v.transpose();
        assert_eq!(v.dims(), &[5]);
        assert_eq!(v.as_slice(), iota(&[5]).as_slice());
    }

    #[test]
    fn rank_three_moves_every_element() {
        let a = iota(&[2, 3, 4]);
        let t = a.transposed();
        assert_eq!(t.dims(), &[4, 3, 2]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(t.get(&[k, j, i]), a.get(&[i, j, k]));
                }
            }
        }
    }

    #[test]
    fn matches_ndarray_axis_reversal() {
        for dims in [vec![3, 1, 2, 4], vec![2, 2, 2, 2, 3], vec![1, 7]] {
            let a = iota(&dims);
            let expected = NdArray::from(a.to_ndarray().reversed_axes());
            assert_eq!(a.transposed(), expected);
        }
    }

    #[test]
    fn transpose_is_an_involution() {
        for dims in [vec![], vec![6], vec![2, 5], vec![3, 4, 5], vec![2, 1, 3, 2]] {
            let a = iota(&dims);
            let mut b = a.clone();
            b.transpose();
            b.transpose();
            assert!(b.is_conformant(&a));
            assert_eq!(b.as_slice(), a.as_slice());
        }
    }

    #[test]
    fn zero_extent_reverses_dims_only() {
        let mut a = NdArray::new(&[2, 0, 3]);
        a.transpose();
        assert_eq!(a.dims(), &[3, 0, 2]);
        assert!(a.is_empty());
    }
}
