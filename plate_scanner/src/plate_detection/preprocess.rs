use opencv::core::Size;
use opencv::core::BORDER_DEFAULT;
use opencv::imgproc::cvt_color;
use opencv::imgproc::equalize_hist;
use opencv::imgproc::gaussian_blur;
use opencv::imgproc::COLOR_BGR2GRAY;
use opencv::prelude::Mat;

use crate::config::BLUR_KERNEL;
use crate::error::ScannerError;

/// Grayscale, equalize, then a fixed 5x5 Gaussian blur.
pub fn preprocess(frame: &Mat) -> Result<Mat, ScannerError> {
    let mut grey = Mat::default();
    cvt_color(frame, &mut grey, COLOR_BGR2GRAY, 0)?;

    let mut equalized = Mat::default();
    equalize_hist(&grey, &mut equalized)?;

    let mut blurred = Mat::default();
    gaussian_blur(
        &equalized,
        &mut blurred,
        Size::new(BLUR_KERNEL, BLUR_KERNEL),
        0.0,
        0.0,
        BORDER_DEFAULT,
    )?;
    Ok(blurred)
}
