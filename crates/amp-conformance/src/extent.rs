//! Randomized extents

use crate::error::{HarnessError, Result};
use amp_core::Extent;
use rand::Rng;

/// Random extent whose every component lies in `1..=max_dim_size`
pub fn random_extent<const N: usize>(rng: &mut impl Rng, max_dim_size: usize) -> Result<Extent<N>> {
    if max_dim_size == 0 {
        return Err(HarnessError::InvalidConfig("max dimension size must be positive".into()));
    }

    let mut dims = [1usize; N];
    for d in dims.iter_mut() {
        *d = rng.gen_range(1..=max_dim_size);
    }
    Ok(Extent::new(dims)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_extent_respects_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let extent = random_extent::<3>(&mut rng, 6).unwrap();
            assert!(extent.dims().iter().all(|&d| (1..=6).contains(&d)));
        }
    }

    #[test]
    fn test_bound_applies_per_axis() {
        let mut rng = StdRng::seed_from_u64(1);
        let largest = (0..500)
            .flat_map(|_| *random_extent::<2>(&mut rng, 256).unwrap().dims())
            .max()
            .unwrap();
        assert!(largest > 16 && largest <= 256);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = random_extent::<2>(&mut StdRng::seed_from_u64(42), 256).unwrap();
        let b = random_extent::<2>(&mut StdRng::seed_from_u64(42), 256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_bound_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_extent::<1>(&mut rng, 0).is_err());
    }
}
