use opencv::core::Point;
use opencv::core::Rect;
use opencv::core::Scalar;
use opencv::imgproc::put_text;
use opencv::imgproc::rectangle_points;
use opencv::imgproc::FILLED;
use opencv::imgproc::FONT_HERSHEY_COMPLEX_SMALL;
use opencv::imgproc::LINE_8;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;

use crate::error::ScannerError;

pub const PLATE_LABEL: &str = "Number Plate";
pub const SAVED_LABEL: &str = "Plate Saved";

const LABEL_OFFSET_PX: i32 = 5;
const BOX_THICKNESS_PX: i32 = 2;

// BGR
fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}
fn magenta() -> Scalar {
    Scalar::new(255.0, 0.0, 255.0, 0.0)
}
fn red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

pub fn plate_area(plate: &Rect) -> i64 {
    plate.width as i64 * plate.height as i64
}

/// Draws every detection larger than `min_area` onto `image` and returns the
/// matching crops, in the order the detections were given.
///
/// Crops come from the frame as it was before any drawing, so saved plates
/// never carry the overlay.
pub fn annotate_plates(
    image: &mut Mat,
    detections: &[Rect],
    min_area: i32,
) -> Result<Vec<Mat>, ScannerError> {
    let mut crops = Vec::new();
    if !detections
        .iter()
        .any(|plate| plate_area(plate) > min_area as i64)
    {
        return Ok(crops);
    }

    let original = image.try_clone()?;
    for plate in detections {
        if plate_area(plate) <= min_area as i64 {
            continue;
        }

        crops.push(original.apply_1(*plate)?.try_clone()?);

        rectangle_points(
            image,
            Point::new(plate.x, plate.y),
            Point::new(plate.x + plate.width, plate.y + plate.height),
            green(),
            BOX_THICKNESS_PX,
            LINE_8,
            0,
        )?;
        put_text(
            image,
            PLATE_LABEL,
            Point::new(plate.x, plate.y - LABEL_OFFSET_PX),
            FONT_HERSHEY_COMPLEX_SMALL,
            1.0,
            magenta(),
            2,
            LINE_8,
            false,
        )?;
    }
    Ok(crops)
}

/// Full-width confirmation banner shown once a plate has been written.
pub fn draw_saved_banner(image: &mut Mat) -> Result<(), ScannerError> {
    let width = image.cols();
    rectangle_points(
        image,
        Point::new(0, 200),
        Point::new(width, 300),
        green(),
        FILLED,
        LINE_8,
        0,
    )?;
    put_text(
        image,
        SAVED_LABEL,
        Point::new(150, 265),
        FONT_HERSHEY_COMPLEX_SMALL,
        2.0,
        red(),
        2,
        LINE_8,
        false,
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use opencv::core::Vec3b;
    use opencv::core::VecN;
    use opencv::core::CV_8UC3;
    use opencv::prelude::*;

    /// 640x480 frame where every pixel encodes its own coordinates.
    pub(crate) fn patterned_frame() -> Mat {
        let mut frame =
            Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(0.0)).unwrap();
        for row in 0..480 {
            for col in 0..640 {
                *frame.at_2d_mut::<Vec3b>(row, col).unwrap() =
                    VecN([(row % 200) as u8, 40, (col % 200) as u8]);
            }
        }
        frame
    }

    fn pixel(image: &Mat, row: i32, col: i32) -> [u8; 3] {
        image.at_2d::<Vec3b>(row, col).unwrap().0
    }

    #[test]
    fn area_is_width_times_height() {
        assert_eq!(plate_area(&Rect::new(10, 10, 50, 50)), 2500);
        assert_eq!(plate_area(&Rect::new(0, 0, 10, 10)), 100);
    }

    #[test]
    fn large_detection_is_boxed_and_cropped() {
        let original = patterned_frame();
        let mut image = original.try_clone().unwrap();

        let crops = annotate_plates(&mut image, &[Rect::new(10, 10, 50, 50)], 500).unwrap();

        assert_eq!(crops.len(), 1);
        // box corners
        assert_eq!(pixel(&image, 10, 10), [0, 255, 0]);
        assert_eq!(pixel(&image, 60, 60), [0, 255, 0]);
        assert_eq!(pixel(&image, 10, 35), [0, 255, 0]);
        // interior untouched
        assert_eq!(pixel(&image, 35, 35), pixel(&original, 35, 35));

        let roi = &crops[0];
        assert_eq!(roi.rows(), 50);
        assert_eq!(roi.cols(), 50);
        for row in 0..50 {
            for col in 0..50 {
                assert_eq!(pixel(roi, row, col), pixel(&original, row + 10, col + 10));
            }
        }
    }

    #[test]
    fn small_detection_is_ignored() {
        let original = patterned_frame();
        let mut image = original.try_clone().unwrap();

        let crops = annotate_plates(&mut image, &[Rect::new(0, 0, 10, 10)], 500).unwrap();

        assert!(crops.is_empty());
        assert_eq!(
            image.data_bytes().unwrap(),
            original.data_bytes().unwrap()
        );
    }

    #[test]
    fn area_equal_to_threshold_is_ignored() {
        let mut image = patterned_frame();
        let crops = annotate_plates(&mut image, &[Rect::new(100, 100, 25, 20)], 500).unwrap();
        assert!(crops.is_empty());
    }

    #[test]
    fn crops_follow_detection_order() {
        let original = patterned_frame();
        let mut image = original.try_clone().unwrap();
        let detections = [
            Rect::new(100, 100, 60, 20),
            Rect::new(5, 5, 4, 4),
            Rect::new(300, 250, 80, 30),
        ];

        let crops = annotate_plates(&mut image, &detections, 500).unwrap();

        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].cols(), 60);
        assert_eq!(crops[1].cols(), 80);
        assert_eq!(pixel(&crops[1], 0, 0), pixel(&original, 250, 300));
        assert_eq!(pixel(&image, 250, 300), [0, 255, 0]);
    }

    #[test]
    fn overlapping_boxes_do_not_leak_into_crops() {
        let original = patterned_frame();
        let mut image = original.try_clone().unwrap();
        let detections = [Rect::new(100, 100, 60, 40), Rect::new(120, 110, 60, 40)];

        let crops = annotate_plates(&mut image, &detections, 500).unwrap();

        // first box's right edge runs through the second crop
        assert_eq!(pixel(&image, 120, 160), [0, 255, 0]);
        assert_eq!(pixel(&crops[1], 10, 40), pixel(&original, 120, 160));
    }

    #[test]
    fn banner_spans_full_width() {
        let mut image = patterned_frame();
        draw_saved_banner(&mut image).unwrap();

        assert_eq!(pixel(&image, 210, 0), [0, 255, 0]);
        assert_eq!(pixel(&image, 290, 639), [0, 255, 0]);
        assert_ne!(pixel(&image, 100, 320), [0, 255, 0]);
    }
}
