//! Extents, indices and rectangular index spaces
//!
//! An [`Extent`] is the shape of an N-dimensional array; an [`Index`] names
//! one element of it. [`IndexSpace`] adds row-major linearization and an
//! enumeration that yields every index of the extent exactly once.
//!
//! ```text
//! extent (2, 3)        linear
//! ┌─────┬─────┬─────┐
//! │ 0,0 │ 0,1 │ 0,2 │   0 1 2
//! ├─────┼─────┼─────┤
//! │ 1,0 │ 1,1 │ 1,2 │   3 4 5
//! └─────┴─────┴─────┘
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Shape of an N-dimensional array; every component is positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent<const N: usize> {
    dims: [usize; N],
}

impl<const N: usize> Extent<N> {
    /// Create an extent
    ///
    /// # Errors
    ///
    /// [`Error::InvalidExtent`] for rank 0, a zero component, or an element
    /// count that overflows `usize`.
    pub fn new(dims: [usize; N]) -> Result<Self> {
        if N == 0 {
            return Err(Error::InvalidExtent("rank must be at least 1".into()));
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(Error::InvalidExtent(format!(
                "dimension {axis} of {dims:?} must be positive"
            )));
        }
        if dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)).is_none() {
            return Err(Error::InvalidExtent(format!("element count of {dims:?} overflows")));
        }
        Ok(Self { dims })
    }

    /// Create an extent from signed components, rejecting negatives
    pub fn from_signed(dims: [i64; N]) -> Result<Self> {
        let mut unsigned = [0usize; N];
        for (axis, (&d, slot)) in dims.iter().zip(unsigned.iter_mut()).enumerate() {
            *slot = usize::try_from(d)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| Error::InvalidExtent(format!("dimension {axis} of {dims:?} must be positive")))?;
        }
        Self::new(unsigned)
    }

    pub fn dims(&self) -> &[usize; N] {
        &self.dims
    }

    pub const fn rank(&self) -> usize {
        N
    }

    /// Product of all components
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn contains(&self, index: &Index<N>) -> bool {
        index.0.iter().zip(&self.dims).all(|(&i, &d)| i < d)
    }
}

impl<const N: usize> fmt::Display for Extent<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (axis, d) in self.dims.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> TryFrom<[usize; N]> for Extent<N> {
    type Error = Error;

    fn try_from(dims: [usize; N]) -> Result<Self> {
        Self::new(dims)
    }
}

/// Position of one element within an [`Extent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index<const N: usize>(pub [usize; N]);

impl<const N: usize> Index<N> {
    pub const fn new(coords: [usize; N]) -> Self {
        Self(coords)
    }

    pub fn coords(&self) -> &[usize; N] {
        &self.0
    }
}

impl<const N: usize> From<[usize; N]> for Index<N> {
    fn from(coords: [usize; N]) -> Self {
        Self(coords)
    }
}

impl<const N: usize> std::ops::Index<usize> for Index<N> {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        &self.0[axis]
    }
}

/// Row-major iteration domain over an [`Extent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpace<const N: usize> {
    extent: Extent<N>,
    strides: [usize; N],
}

impl<const N: usize> IndexSpace<N> {
    pub fn new(extent: Extent<N>) -> Self {
        let mut strides = [1usize; N];
        for axis in (0..N.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * extent.dims[axis + 1];
        }
        Self { extent, strides }
    }

    pub fn extent(&self) -> Extent<N> {
        self.extent
    }

    /// Number of indices in the space
    pub fn size(&self) -> usize {
        self.extent.size()
    }

    pub fn strides(&self) -> &[usize; N] {
        &self.strides
    }

    /// Row-major position of `index`, or `None` when it lies outside the extent
    pub fn linearize(&self, index: &Index<N>) -> Option<usize> {
        self.extent
            .contains(index)
            .then(|| index.0.iter().zip(&self.strides).map(|(i, s)| i * s).sum())
    }

    /// Index at row-major position `linear`
    pub fn delinearize(&self, linear: usize) -> Option<Index<N>> {
        (linear < self.size()).then(|| self.index_at(linear))
    }

    /// `linear` must be below `size()`
    pub(crate) fn index_at(&self, mut linear: usize) -> Index<N> {
        let mut coords = [0usize; N];
        for (coord, &stride) in coords.iter_mut().zip(&self.strides) {
            *coord = linear / stride;
            linear %= stride;
        }
        Index(coords)
    }

    /// Every index of the space, once each, in row-major order
    pub fn iter(&self) -> Indices<N> {
        Indices {
            space: *self,
            next: 0,
            end: self.size(),
        }
    }
}

impl<const N: usize> IntoIterator for &IndexSpace<N> {
    type Item = Index<N>;
    type IntoIter = Indices<N>;

    fn into_iter(self) -> Indices<N> {
        self.iter()
    }
}

/// Iterator returned by [`IndexSpace::iter`]
#[derive(Debug, Clone)]
pub struct Indices<const N: usize> {
    space: IndexSpace<N>,
    next: usize,
    end: usize,
}

impl<const N: usize> Iterator for Indices<N> {
    type Item = Index<N>;

    fn next(&mut self) -> Option<Index<N>> {
        if self.next == self.end {
            return None;
        }
        let index = self.space.index_at(self.next);
        self.next += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for Indices<N> {}
