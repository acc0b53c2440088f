//! Whole-array verification

use crate::array::SharedArray;
use crate::element::Element;
use crate::error::Result;

/// True if every element of `array` equals `expected`
///
/// Fences first and requires read access. The first mismatch is logged at
/// `warn` with its row-major position.
pub fn matches_expected<T: Element, const N: usize>(array: &SharedArray<T, N>, expected: T) -> Result<bool> {
    let values = array.to_vec()?;

    match values.iter().position(|v| *v != expected) {
        None => Ok(true),
        Some(linear) => {
            let index = array.index_space().delinearize(linear);
            tracing::warn!(
                handle = %array.buffer_handle(),
                index = ?index.map(|i| i.0),
                actual = ?values[linear],
                expected = ?expected,
                mismatches = values.iter().filter(|v| **v != expected).count(),
                "array_verification_failed"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessType;
    use crate::accelerator::Accelerator;
    use crate::error::Error;
    use crate::extent::{Extent, Index};

    #[test]
    fn test_matches_expected() {
        let acc = Accelerator::new_cpu().unwrap();
        let mut arr = SharedArray::<f64, 2>::new(Extent::new([3, 3]).unwrap(), &acc.default_view(), AccessType::ReadWrite)
            .unwrap();
        arr.fill(2.5).unwrap();
        assert!(matches_expected(&arr, 2.5).unwrap());

        arr.write(Index([2, 1]), 0.0).unwrap();
        assert!(!matches_expected(&arr, 2.5).unwrap());
    }

    #[test]
    fn test_requires_read_access() {
        let acc = Accelerator::new_cpu().unwrap();
        let arr = SharedArray::<i32, 1>::new(Extent::new([4]).unwrap(), &acc.default_view(), AccessType::Write).unwrap();
        assert!(matches!(matches_expected(&arr, 0), Err(Error::AccessDenied { .. })));
    }
}
