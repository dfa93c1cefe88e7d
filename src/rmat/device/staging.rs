use std::sync::{
    Arc, RwLockReadGuard,
    atomic::{AtomicUsize, Ordering},
};

use log::debug;

use crate::{
    buffer::{BufferDesc, HostMat, MatCell},
    rmat::{
        adapter::Adapter,
        device::{WriteTracker, config::StagingConfig},
        view::{Access, View},
    },
    utils::{error::RMatError, expect_msg::ExpectMsg},
};

/// Adapter that stages backend storage through a private host copy.
///
/// Every read re-copies the backend into the staging buffer. A write view
/// exposes the staging buffer, reshaped to the backend's current descriptor,
/// and copies it back to the backend on release. Views borrow the staging
/// buffer until they are dropped, so a write view cannot overlap any other
/// view; such an access panics.
pub struct StagingAdapter {
    device: Arc<MatCell>,
    host: MatCell,
    config: StagingConfig,
    syncs: AtomicUsize,
    writes: WriteTracker,
}

impl StagingAdapter {
    pub fn new(device: Arc<MatCell>) -> Self {
        let host = MatCell::new(device.snapshot());
        Self {
            device,
            host,
            config: StagingConfig::default(),
            syncs: AtomicUsize::new(0),
            writes: WriteTracker::default(),
        }
    }

    pub fn with_config(device: Arc<MatCell>, config: StagingConfig) -> Result<Self, RMatError> {
        let config = config.build()?;
        let host = {
            let backend = device.try_read()?;
            let mut host = config.staging_buffer(backend.desc());
            backend.copy_to(&mut host);
            host
        };

        Ok(Self {
            device,
            host: MatCell::new(host),
            config,
            syncs: AtomicUsize::new(0),
            writes: WriteTracker::default(),
        })
    }

    pub fn device(&self) -> &Arc<MatCell> {
        &self.device
    }

    pub fn config(&self) -> StagingConfig {
        self.config
    }

    /// Backend to staging copies made so far.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::Acquire)
    }

    /// Staging to backend copies made so far.
    pub fn write_back_count(&self) -> usize {
        self.writes.completed()
    }

    // Give the staging buffer the backend's shape, keeping it when it already matches
    fn reshape(&self, host: &mut HostMat, desc: BufferDesc) {
        if host.desc() != desc {
            debug!("Staging buffer reshaped from {} to {}", host.desc(), desc);
            *host = self.config.staging_buffer(desc);
        }
    }

    fn sync_from_device(&self) -> Result<RwLockReadGuard<'_, HostMat>, RMatError> {
        {
            let device = self.device.try_read()?;
            let mut host = self.host.try_write()?;
            self.reshape(&mut host, device.desc());
            device.copy_to(&mut host);

            let n = self.syncs.fetch_add(1, Ordering::AcqRel) + 1;
            debug!("Staged {} from backend (sync #{})", device.desc(), n);
        }
        self.host.try_read()
    }

    fn write_back(&self, host: &HostMat) {
        let mut device = self
            .device
            .try_write()
            .expect_msg("Cannot write staged data back to the backend");
        host.copy_to(&mut device);

        let n = self.writes.release();
        debug!("Wrote staged {} back to backend (write #{})", host.desc(), n);
    }
}

impl Adapter for StagingAdapter {
    fn access(&self, access: Access) -> View<'_> {
        match access {
            Access::Read => {
                let host = self
                    .sync_from_device()
                    .expect_msg("Cannot stage backend for reading");
                unsafe { View::new(host.desc(), host.as_ptr(), host.step()) }.holding(host)
            }
            Access::Write => {
                let mut host = self
                    .host
                    .try_write()
                    .expect_msg("Cannot open staging buffer for writing");
                // shape only, the contents are whatever the consumer writes
                self.reshape(&mut host, self.desc());
                let (desc, data, step) = (host.desc(), host.as_mut_ptr(), host.step());

                self.writes.open();
                unsafe { View::with_callback(desc, data, step, move || self.write_back(&host)) }
            }
        }
    }

    fn desc(&self) -> BufferDesc {
        self.device
            .try_read()
            .expect_msg("Cannot describe backend storage")
            .desc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ElemType;

    fn device() -> Arc<MatCell> {
        let desc = BufferDesc::new(ElemType::U8C1, 4, 4);
        let bytes = (100..116).collect();
        Arc::new(MatCell::new(HostMat::from_bytes(desc, bytes).unwrap()))
    }

    #[test]
    fn read_view_points_at_staging() {
        let device = device();
        let adapter = StagingAdapter::new(device.clone());
        let view = adapter.access(Access::Read);

        assert_ne!(view.ptr(), device.try_read().unwrap().as_ptr());
        assert_eq!(HostMat::from_view(&view), device.snapshot());
        assert_eq!(adapter.sync_count(), 1);
    }

    #[test]
    fn every_read_resyncs() {
        let device = device();
        let adapter = StagingAdapter::new(device.clone());
        drop(adapter.access(Access::Read));

        // backend changes behind the adapter's back
        device.try_write().unwrap().fill(7);

        let view = adapter.access(Access::Read);
        assert_eq!(view.row(2), &[7; 4]);
        assert_eq!(adapter.sync_count(), 2);
    }

    #[test]
    fn write_reaches_backend_only_on_release() {
        let device = device();
        let original = device.snapshot();
        let adapter = StagingAdapter::new(device.clone());
        {
            let mut view = adapter.access(Access::Write);
            view.data_mut().unwrap().fill(1);
            assert_eq!(device.snapshot(), original);
            assert_eq!(adapter.write_back_count(), 0);
        }
        assert_eq!(adapter.write_back_count(), 1);
        assert_eq!(device.snapshot().row(3), &[1; 4]);
    }

    #[test]
    fn aligned_staging_reports_padded_step() {
        let device = device();
        let config = StagingConfig { row_alignment: 32 };
        let adapter = StagingAdapter::with_config(device.clone(), config).unwrap();

        let view = adapter.access(Access::Read);
        assert_eq!(view.step(), 32);
        assert_eq!(view.desc(), adapter.desc());
        assert_eq!(HostMat::from_view(&view), device.snapshot());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StagingConfig { row_alignment: 0 };
        assert!(StagingAdapter::with_config(device(), config).is_err());
    }

    #[test]
    #[should_panic(expected = "in use by another view")]
    fn read_cannot_resync_under_a_live_read() {
        let adapter = StagingAdapter::new(device());
        let _first = adapter.access(Access::Read);
        let _second = adapter.access(Access::Read);
    }

    #[test]
    #[should_panic(expected = "in use by another view")]
    fn write_while_reading_panics() {
        let adapter = StagingAdapter::new(device());
        let _read = adapter.access(Access::Read);
        let _write = adapter.access(Access::Write);
    }

    #[test]
    #[should_panic(expected = "in use by another view")]
    fn second_write_view_panics() {
        let adapter = StagingAdapter::new(device());
        let _first = adapter.access(Access::Write);
        let _second = adapter.access(Access::Write);
    }

    #[test]
    fn read_contents_stay_put_until_dropped() {
        let device = device();
        let adapter = StagingAdapter::new(device.clone());
        let view = adapter.access(Access::Read);
        let before = view.row(0).to_vec();

        device.try_write().unwrap().fill(9);
        assert_eq!(view.row(0), before.as_slice());
        drop(view);

        assert_eq!(adapter.access(Access::Read).row(0), &[9; 4]);
    }

    #[test]
    fn write_follows_backend_reshape() {
        let device = device();
        let adapter = StagingAdapter::new(device.clone());

        let wide = BufferDesc::new(ElemType::U8C1, 2, 8);
        *device.try_write().unwrap() = HostMat::new(wide);

        let mut view = adapter.access(Access::Write);
        assert_eq!(view.desc(), wide);
        assert_eq!(view.step(), 8);
        view.data_mut().unwrap().fill(4);
        drop(view);

        let backend = device.snapshot();
        assert_eq!(backend.desc(), wide);
        assert_eq!(backend.to_dense_bytes(), vec![4; 16]);
        assert_eq!(adapter.sync_count(), 0);
    }
}
