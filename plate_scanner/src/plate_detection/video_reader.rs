use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;
use opencv::prelude::VideoCaptureTrait;
use opencv::prelude::VideoCaptureTraitConst;
use opencv::videoio::VideoCapture;
use opencv::videoio::CAP_ANY;
use opencv::videoio::CAP_PROP_BRIGHTNESS;
use opencv::videoio::CAP_PROP_EXPOSURE;
use opencv::videoio::CAP_PROP_FRAME_HEIGHT;
use opencv::videoio::CAP_PROP_FRAME_WIDTH;

use tracing::debug;
use tracing::warn;

use crate::config::CameraConfig;
use crate::error::ScannerError;

/// Something that hands out one frame per loop iteration.
pub trait FrameSource {
    /// Returns `None` when no frame could be retrieved. Callers stop on `None`.
    fn read_frame(&mut self) -> Option<Mat>;

    /// Releases the underlying device. Calling it again is a no-op.
    fn release(&mut self);
}

pub struct CameraReader {
    capture: VideoCapture,
    released: bool,
}

impl CameraReader {
    pub fn open(config: &CameraConfig) -> Result<Self, ScannerError> {
        let capture = VideoCapture::new(config.index, CAP_ANY)?;
        if !capture.is_opened()? {
            warn!(index = config.index, "camera could not be opened");
        }

        let mut reader = Self {
            capture,
            released: false,
        };
        reader.hint(CAP_PROP_FRAME_WIDTH, "width", config.width as f64);
        reader.hint(CAP_PROP_FRAME_HEIGHT, "height", config.height as f64);
        reader.hint(CAP_PROP_BRIGHTNESS, "brightness", config.brightness);
        reader.hint(CAP_PROP_EXPOSURE, "exposure", config.exposure);
        debug!(index = config.index, "camera opened");
        Ok(reader)
    }

    // Drivers are free to ignore any of these.
    fn hint(&mut self, prop: i32, name: &str, value: f64) {
        match self.capture.set(prop, value) {
            Ok(true) => debug!(property = name, value, "camera property set"),
            Ok(false) => debug!(property = name, value, "camera ignored property"),
            Err(e) => debug!(property = name, value, error = %e, "camera rejected property"),
        }
    }
}

impl FrameSource for CameraReader {
    fn read_frame(&mut self) -> Option<Mat> {
        let mut image = Mat::default();
        match self.capture.read(&mut image) {
            Ok(true) if !image.empty() => Some(image),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "camera read failed");
                None
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("releasing camera");
        if let Err(e) = self.capture.release() {
            warn!(error = %e, "camera release failed");
        }
    }
}

impl Drop for CameraReader {
    fn drop(&mut self) {
        self.release();
    }
}
