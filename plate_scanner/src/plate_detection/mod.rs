pub mod bounding_box_render;
pub mod display;
pub mod plate_detector;
pub mod plate_saver;
pub mod preprocess;
pub mod video_reader;

pub use display::{Display, HighGuiDisplay, InputEvent};
pub use plate_detector::{HaarPlateDetector, PlateDetector};
pub use plate_saver::PlateSaver;
pub use video_reader::{CameraReader, FrameSource};
