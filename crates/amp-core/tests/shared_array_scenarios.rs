//! Integration tests for host/device sharing of one array
//!
//! Each test drives the public API the way a conformance harness does: host
//! writes, asynchronous dispatch, implicit fencing on the next host access.

use amp_core::{
    fence, matches_expected, parallel_for_each, AccessType, Accelerator, DeviceConfig, Dispatch, Error, Extent, Index,
    SharedArray, StorageMode,
};

fn add_one<const N: usize>(arr: &SharedArray<i32, N>) -> amp_core::Result<()> {
    let dev = arr.device_view();
    parallel_for_each(arr.accelerator_view(), arr.extent(), &[arr], move |idx| {
        dev.update(idx, |v| v + 1)
    })?;
    Ok(())
}

#[test]
fn test_single_round_host_and_device_increments() -> amp_core::Result<()> {
    amp_tracing::init_test_tracing();
    let acc = Accelerator::new_cpu()?;
    let mut arr = SharedArray::<i32, 2>::new(Extent::new([4, 4])?, &acc.default_view(), AccessType::ReadWrite)?;

    arr.fill(100)?;
    add_one(&arr)?;
    arr.increment_all(1)?;

    assert!(matches_expected(&arr, 102)?);
    Ok(())
}

#[test]
fn test_hundred_rounds_reach_300() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let mut arr = SharedArray::<i32, 2>::new(Extent::new([4, 4])?, &acc.default_view(), AccessType::ReadWrite)?;

    arr.fill(100)?;
    for _ in 0..100 {
        add_one(&arr)?;
        arr.increment_all(1)?;
    }

    assert!(matches_expected(&arr, 300)?);
    Ok(())
}

#[test]
fn test_device_only_array_denies_host_access() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let mut arr = SharedArray::<i32, 2>::new(Extent::new([4, 4])?, &acc.default_view(), AccessType::None)?;

    assert_eq!(arr.storage_kind(), StorageMode::DeviceOnly);
    assert!(matches!(arr.read(Index([0, 0])), Err(Error::AccessDenied { .. })));
    assert!(matches!(arr.write(Index([0, 0]), 1), Err(Error::AccessDenied { .. })));
    assert!(matches!(arr.increment_all(1), Err(Error::AccessDenied { .. })));

    // The device still has full access to its own storage.
    add_one(&arr)?;
    arr.fence();
    Ok(())
}

#[test]
fn test_host_access_without_zero_copy_is_refused() -> amp_core::Result<()> {
    let acc = Accelerator::with_config(DeviceConfig::without_zero_copy())?;
    assert!(!acc.supports_cpu_shared_memory());

    let extent = Extent::new([4, 4])?;
    for access in [AccessType::Read, AccessType::Write, AccessType::ReadWrite] {
        let err = SharedArray::<i32, 2>::new(extent, &acc.default_view(), access).unwrap_err();
        assert_eq!(err, Error::HostSharedMemoryUnsupported);
    }

    let device_only = SharedArray::<i32, 2>::new(extent, &acc.default_view(), AccessType::None)?;
    assert_eq!(device_only.storage_kind(), StorageMode::DeviceOnly);
    Ok(())
}

#[test]
fn test_write_then_kernel_add_is_order_independent() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let extent = Extent::new([9, 7, 3])?;
    let mut arr = SharedArray::<i32, 3>::new(extent, &acc.default_view(), AccessType::ReadWrite)?;

    for idx in arr.index_space().iter() {
        arr.write(idx, 40)?;
    }
    add_one(&arr)?;

    for idx in arr.index_space().iter() {
        assert_eq!(arr.read(idx)?, 41);
    }
    Ok(())
}

#[test]
fn test_fence_is_idempotent() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let mut arr = SharedArray::<u64, 1>::new(Extent::new([128])?, &acc.default_view(), AccessType::ReadWrite)?;
    arr.fill(5)?;

    let dev = arr.device_view();
    Dispatch::new(arr.accelerator_view(), arr.extent())
        .touching(&arr)
        .launch(move |idx| dev.update(idx, |v| v * 2))?;

    fence(&arr);
    let once = arr.to_vec()?;
    fence(&arr);
    fence(&arr);
    assert_eq!(arr.to_vec()?, once);
    assert!(once.iter().all(|&v| v == 10));
    Ok(())
}

#[test]
fn test_allocation_failure_is_reported() {
    let acc = Accelerator::with_config(DeviceConfig {
        memory_bytes: 256,
        ..DeviceConfig::default()
    })
    .unwrap();

    let err = SharedArray::<f32, 2>::new(Extent::new([16, 16]).unwrap(), &acc.default_view(), AccessType::ReadWrite)
        .unwrap_err();
    assert!(matches!(err, Error::AllocationFailed { bytes: 1024, .. }));
}

#[test]
fn test_independent_views_share_one_array() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let view = acc.default_view();
    let side = acc.create_view()?;
    let extent = Extent::new([64])?;
    let arr = SharedArray::<i32, 1>::new(extent, &view, AccessType::Read)?;

    // Two views write disjoint halves concurrently; fencing covers both.
    let (lo, hi) = (arr.device_view(), arr.device_view());
    let half = Extent::new([32])?;
    parallel_for_each(&view, half, &[&arr], move |idx| lo.set(idx, 1))?;
    parallel_for_each(&side, half, &[&arr], move |idx| hi.set(Index([idx[0] + 32]), 2))?;

    let values = arr.to_vec()?;
    assert!(values[..32].iter().all(|&v| v == 1));
    assert!(values[32..].iter().all(|&v| v == 2));
    Ok(())
}

#[test]
fn test_view_wait_drains_queue() -> amp_core::Result<()> {
    let acc = Accelerator::new_cpu()?;
    let view = acc.default_view();
    let arr = SharedArray::<u32, 2>::new(Extent::new([8, 8])?, &view, AccessType::Read)?;

    for _ in 0..10 {
        let dev = arr.device_view();
        parallel_for_each(&view, arr.extent(), &[&arr], move |idx| dev.update(idx, |v| v + 3))?;
    }
    view.wait();

    assert_eq!(view.pending_dispatches(), 0);
    assert!(matches_expected(&arr, 30)?);
    Ok(())
}

#[test]
#[should_panic(expected = "accelerator fault")]
fn test_kernel_panic_is_fatal_at_fence() {
    amp_tracing::init_test_tracing();
    let acc = Accelerator::new_cpu().unwrap();
    let arr =
        SharedArray::<i32, 1>::new(Extent::new([4]).unwrap(), &acc.default_view(), AccessType::ReadWrite).unwrap();

    let dev = arr.device_view();
    parallel_for_each(arr.accelerator_view(), Extent::new([8]).unwrap(), &[&arr], move |idx| {
        dev.update(idx, |v| v + 1)
    })
    .unwrap();

    let _ = arr.read(Index([0]));
}
