//! Element types storable in a [`SharedArray`](crate::SharedArray)

use std::fmt::Debug;

/// Plain-old-data element with a well-defined all-zero value
///
/// Implemented for every `bytemuck::Pod` type that can cross threads, which
/// covers the integer and floating-point primitives.
pub trait Element: bytemuck::Pod + Send + Sync + PartialEq + Debug + 'static {}

impl<T> Element for T where T: bytemuck::Pod + Send + Sync + PartialEq + Debug + 'static {}
