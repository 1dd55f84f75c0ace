use std::fs;
use std::path::Path;
use std::path::PathBuf;

use opencv::core::Vector;
use opencv::imgcodecs::imwrite;
use opencv::prelude::Mat;

use tracing::debug;

use crate::error::ScannerError;

pub struct PlateSaver {
    dir: PathBuf,
}

impl PlateSaver {
    /// Makes sure `dir` exists. Only the leaf directory is created; its parent
    /// must already be there.
    pub fn prepare(dir: impl AsRef<Path>) -> Result<Self, ScannerError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir(&dir).map_err(|source| ScannerError::OutputDir {
                path: dir.clone(),
                source,
            })?;
            debug!(dir = %dir.display(), "created output directory");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(format!("scanned_img_{}.jpg", index))
    }

    pub fn write(&self, index: u32, plate: &Mat) -> Result<PathBuf, ScannerError> {
        let path = self.path_for(index);
        let name = path
            .to_str()
            .ok_or_else(|| ScannerError::PlateWrite(path.clone()))?;
        if !imwrite(name, plate, &Vector::<i32>::new())? {
            return Err(ScannerError::PlateWrite(path));
        }
        Ok(path)
    }
}
