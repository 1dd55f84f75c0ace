use opencv::highgui::destroy_all_windows;
use opencv::highgui::get_window_property;
use opencv::highgui::imshow;
use opencv::highgui::wait_key;
use opencv::highgui::WND_PROP_VISIBLE;
use opencv::prelude::Mat;

use tracing::debug;
use tracing::warn;

use crate::error::ScannerError;

pub const RESULT_WINDOW: &str = "Result";
pub const ROI_WINDOW: &str = "ROI";
pub const SAVED_WINDOW: &str = "Results";

const SAVE_KEY: u8 = b's';

/// User input observed during one keyboard poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Save,
    Quit,
    None,
}

impl InputEvent {
    /// Maps a raw key code as returned by the window system. Only the low
    /// byte is significant.
    pub fn from_key_code(code: i32) -> Self {
        if code >= 0 && (code & 0xFF) as u8 == SAVE_KEY {
            InputEvent::Save
        } else {
            InputEvent::None
        }
    }
}

pub trait Display {
    fn show(&mut self, window: &str, image: &Mat) -> Result<(), ScannerError>;

    /// Waits up to `timeout_ms` for input.
    fn poll(&mut self, timeout_ms: i32) -> Result<InputEvent, ScannerError>;

    /// Closes every window. Calling it again is a no-op.
    fn close_all(&mut self);
}

#[derive(Default)]
pub struct HighGuiDisplay {
    result_shown: bool,
    closed: bool,
}

impl HighGuiDisplay {
    fn result_window_closed(&self) -> bool {
        if !self.result_shown {
            return false;
        }
        match get_window_property(RESULT_WINDOW, WND_PROP_VISIBLE) {
            Ok(visible) => visible < 1.0,
            Err(_) => false,
        }
    }
}

impl Display for HighGuiDisplay {
    fn show(&mut self, window: &str, image: &Mat) -> Result<(), ScannerError> {
        imshow(window, image)?;
        if window == RESULT_WINDOW {
            self.result_shown = true;
        }
        Ok(())
    }

    fn poll(&mut self, timeout_ms: i32) -> Result<InputEvent, ScannerError> {
        let key = wait_key(timeout_ms)?;
        match InputEvent::from_key_code(key) {
            InputEvent::None if self.result_window_closed() => Ok(InputEvent::Quit),
            event => Ok(event),
        }
    }

    fn close_all(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("closing windows");
        if let Err(e) = destroy_all_windows() {
            warn!(error = %e, "failed to close windows");
        }
    }
}

impl Drop for HighGuiDisplay {
    fn drop(&mut self) {
        self.close_all();
    }
}
