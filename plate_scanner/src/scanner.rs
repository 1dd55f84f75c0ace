//! The capture loop: read a frame, look for plates, show the overlay and
//! save the current plate when asked to.
//!
//! The loop is either running or stopped. It stops when the camera stops
//! delivering frames, when the result window is closed, or right after one
//! plate has been saved. Camera and windows are released exactly once on
//! every one of those paths, and also when an error or a panic unwinds
//! through [`PlateScanner`].

use std::path::PathBuf;

use opencv::prelude::Mat;

use tracing::error;
use tracing::info;
use tracing::trace;

use crate::config::DetectorConfig;
use crate::error::ScannerError;
use crate::plate_detection::bounding_box_render::annotate_plates;
use crate::plate_detection::bounding_box_render::draw_saved_banner;
use crate::plate_detection::display::RESULT_WINDOW;
use crate::plate_detection::display::ROI_WINDOW;
use crate::plate_detection::display::SAVED_WINDOW;
use crate::plate_detection::preprocess::preprocess;
use crate::plate_detection::Display;
use crate::plate_detection::FrameSource;
use crate::plate_detection::InputEvent;
use crate::plate_detection::PlateDetector;
use crate::plate_detection::PlateSaver;

pub const FRAME_POLL_MS: i32 = 1;
pub const SAVED_PAUSE_MS: i32 = 500;

/// State that outlives a single iteration.
#[derive(Default)]
pub struct ScanState {
    /// Crop of the last detection that passed the area filter. It is kept
    /// across frames without detections, so a save may write a plate seen
    /// several frames ago.
    pub roi: Option<Mat>,
    /// Number of plates written so far; names the next file.
    pub saved: u32,
    pub frames: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Saved(PathBuf),
    CaptureFailed,
    WindowClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(ScanOutcome),
}

#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    pub min_area: i32,
}

impl From<&DetectorConfig> for ScanSettings {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            min_area: config.min_area,
        }
    }
}

pub struct PlateScanner<S: FrameSource, D: Display, P: PlateDetector> {
    source: S,
    display: D,
    detector: P,
    saver: PlateSaver,
    settings: ScanSettings,
    released: bool,
}

impl<S: FrameSource, D: Display, P: PlateDetector> PlateScanner<S, D, P> {
    pub fn new(
        source: S,
        display: D,
        detector: P,
        saver: PlateSaver,
        settings: ScanSettings,
    ) -> Self {
        Self {
            source,
            display,
            detector,
            saver,
            settings,
            released: false,
        }
    }

    /// Runs until the loop stops, then releases camera and windows.
    pub fn run(&mut self, state: &mut ScanState) -> Result<ScanOutcome, ScannerError> {
        let outcome = self.run_until_stopped(state);
        self.release();
        outcome
    }

    fn run_until_stopped(&mut self, state: &mut ScanState) -> Result<ScanOutcome, ScannerError> {
        loop {
            if let Step::Stop(outcome) = self.step(state)? {
                return Ok(outcome);
            }
        }
    }

    /// One iteration of the loop.
    pub fn step(&mut self, state: &mut ScanState) -> Result<Step, ScannerError> {
        let Some(mut image) = self.source.read_frame() else {
            error!(frames = state.frames, "Failed to capture image.");
            return Ok(Step::Stop(ScanOutcome::CaptureFailed));
        };
        state.frames += 1;

        let grey = preprocess(&image)?;
        let detections = self.detector.detect(&grey)?;
        trace!(frame = state.frames, detections = detections.len(), "detected");

        for plate in annotate_plates(&mut image, &detections, self.settings.min_area)? {
            self.display.show(ROI_WINDOW, &plate)?;
            state.roi = Some(plate);
        }
        self.display.show(RESULT_WINDOW, &image)?;

        match self.display.poll(FRAME_POLL_MS)? {
            InputEvent::Save => match self.save(state, &mut image)? {
                Some(path) => Ok(Step::Stop(ScanOutcome::Saved(path))),
                None => Ok(Step::Continue),
            },
            InputEvent::Quit => Ok(Step::Stop(ScanOutcome::WindowClosed)),
            InputEvent::None => Ok(Step::Continue),
        }
    }

    fn save(
        &mut self,
        state: &mut ScanState,
        image: &mut Mat,
    ) -> Result<Option<PathBuf>, ScannerError> {
        let Some(plate) = state.roi.as_ref() else {
            trace!("save requested before any plate was seen");
            return Ok(None);
        };

        let path = self.saver.write(state.saved, plate)?;
        draw_saved_banner(image)?;
        self.display.show(SAVED_WINDOW, image)?;
        self.display.poll(SAVED_PAUSE_MS)?;
        state.saved += 1;

        info!(path = %path.display(), saved = state.saved, "plate saved");
        Ok(Some(path))
    }

    /// Releases camera and windows. Only the first call has any effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        self.display.close_all();
    }
}

impl<S: FrameSource, D: Display, P: PlateDetector> Drop for PlateScanner<S, D, P> {
    fn drop(&mut self) {
        self.release();
    }
}
