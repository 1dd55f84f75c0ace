use std::path::Path;
use std::path::PathBuf;

use opencv::core::Rect;
use opencv::core::Size;
use opencv::core::Vector;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::CascadeClassifierTrait;
use opencv::prelude::CascadeClassifierTraitConst;
use opencv::prelude::Mat;

use tracing::info;

use crate::config::DetectorConfig;
use crate::error::ScannerError;

/// Finds candidate plate rectangles in a preprocessed grey frame.
///
/// The returned order carries no meaning and overlapping boxes are left as
/// they are.
pub trait PlateDetector {
    fn detect(&mut self, grey: &Mat) -> Result<Vec<Rect>, ScannerError>;
}

pub struct HaarPlateDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
}

impl HaarPlateDetector {
    pub fn load(
        path: &Path,
        scale_factor: f64,
        min_neighbors: i32,
    ) -> Result<Self, ScannerError> {
        let load_error = |reason: String| ScannerError::ClassifierLoad {
            path: PathBuf::from(path),
            reason,
        };

        if !path.is_file() {
            return Err(load_error("no such file".to_string()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| load_error("path is not valid UTF-8".to_string()))?;
        let classifier = CascadeClassifier::new(path_str).map_err(|e| load_error(e.to_string()))?;
        if classifier.empty().map_err(|e| load_error(e.to_string()))? {
            return Err(load_error("classifier is empty".to_string()));
        }

        info!(path = %path.display(), scale_factor, min_neighbors, "plate cascade loaded");
        Ok(Self {
            classifier,
            scale_factor,
            min_neighbors,
        })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, ScannerError> {
        Self::load(
            &config.cascade_path,
            config.scale_factor,
            config.min_neighbors,
        )
    }
}

impl PlateDetector for HaarPlateDetector {
    fn detect(&mut self, grey: &Mat) -> Result<Vec<Rect>, ScannerError> {
        let mut plates = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            grey,
            &mut plates,
            self.scale_factor,
            self.min_neighbors,
            0,
            Size::default(),
            Size::default(),
        )?;
        Ok(plates.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::HaarPlateDetector;
    use crate::config::{MIN_NEIGHBORS, SCALE_FACTOR};
    use crate::error::ScannerError;

    use std::io::Write;

    #[test]
    fn missing_cascade_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haarcascade_missing.xml");

        let err = HaarPlateDetector::load(&path, SCALE_FACTOR, MIN_NEIGHBORS)
            .err()
            .unwrap();
        match err {
            ScannerError::ClassifierLoad { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unparseable_cascade_fails_fast() {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        writeln!(file, "<?xml version=\"1.0\"?>\n<opencv_storage>\n</opencv_storage>").unwrap();

        let err = HaarPlateDetector::load(file.path(), SCALE_FACTOR, MIN_NEIGHBORS)
            .err()
            .unwrap();
        assert!(matches!(err, ScannerError::ClassifierLoad { .. }));
        assert!(err.to_string().contains("could not be loaded"));
    }
}
