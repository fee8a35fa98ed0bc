use super::ContainerError;
use crate::array::element_count;

/// Rectangular selection within a dataset: `count[k]` consecutive indices
/// starting at `offset[k]` along every dimension `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperslab {
    pub offset: Vec<usize>,
    pub count: Vec<usize>,
}

impl Hyperslab {
    pub fn all(dims: &[usize]) -> Self {
        Self {
            offset: vec![0; dims.len()],
            count: dims.to_vec(),
        }
    }

    /// Selects index `index` of dimension `dim` and everything along the
    /// other dimensions.
    pub fn single_index(dims: &[usize], dim: usize, index: usize) -> Self {
        let mut slab = Self::all(dims);
        slab.offset[dim] = index;
        slab.count[dim] = 1;
        slab
    }

    pub fn element_count(&self) -> usize {
        element_count(&self.count)
    }

    pub fn check(&self, dims: &[usize]) -> Result<(), ContainerError> {
        let fits = self.offset.len() == dims.len()
            && self.count.len() == dims.len()
            && self
                .offset
                .iter()
                .zip(&self.count)
                .zip(dims)
                .all(|((&offset, &count), &extent)| {
                    offset.checked_add(count).map_or(false, |end| end <= extent)
                });
        if fits {
            Ok(())
        } else {
            Err(ContainerError::SelectionOutOfBounds {
                dims: dims.to_vec(),
                offset: self.offset.clone(),
                count: self.count.clone(),
            })
        }
    }
}

/// Shape of the memory buffer on the other side of a transfer. The whole
/// space is always selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySpace {
    pub dims: Vec<usize>,
}

impl MemorySpace {
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    pub fn element_count(&self) -> usize {
        element_count(&self.dims)
    }
}
