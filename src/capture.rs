// capture.rs - Capture adapter seam
// Purpose: one raw sensor reading per call, repeatable without extra setup

use crate::errors::CollectorResult;
use crate::point_cloud::PointCloud;

/// Produces raw readings from the sensing scene.
///
/// `Ok(None)` is a null reading (the sensor produced nothing at all).
/// `Ok(Some(cloud))` may still be an empty, invalid cloud. `Err` means the
/// capture infrastructure itself failed and the run must stop.
pub trait CaptureAdapter {
    fn capture_sample(&mut self) -> CollectorResult<Option<PointCloud>>;
}

impl<C: CaptureAdapter + ?Sized> CaptureAdapter for &mut C {
    fn capture_sample(&mut self) -> CollectorResult<Option<PointCloud>> {
        (**self).capture_sample()
    }
}

impl<C: CaptureAdapter + ?Sized> CaptureAdapter for Box<C> {
    fn capture_sample(&mut self) -> CollectorResult<Option<PointCloud>> {
        (**self).capture_sample()
    }
}
