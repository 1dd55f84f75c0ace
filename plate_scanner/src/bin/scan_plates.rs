use std::path::Path;
use std::process::ExitCode;

use plate_scanner::config::Config;
use plate_scanner::plate_detection::{CameraReader, HaarPlateDetector, HighGuiDisplay, PlateSaver};
use plate_scanner::scanner::{PlateScanner, ScanOutcome, ScanSettings, ScanState};
use plate_scanner::ScannerError;

use tracing::{error, info};

const CONFIG_FILE: &str = "plate_scanner.toml";

fn setup_and_run(config: &Config) -> Result<ScanOutcome, ScannerError> {
    let detector = HaarPlateDetector::from_config(&config.detector)?;
    let saver = PlateSaver::prepare(&config.output.dir)?;
    info!(dir = %saver.dir().display(), "plates will be saved here");
    // An unusable camera is reported by the first failed read.
    let camera = CameraReader::open(&config.camera)?;

    let mut scanner = PlateScanner::new(
        camera,
        HighGuiDisplay::default(),
        detector,
        saver,
        ScanSettings::from(&config.detector),
    );
    let mut state = ScanState::default();
    scanner.run(&mut state)
}

fn main() -> ExitCode {
    let config = match Config::load_or_default(Path::new(CONFIG_FILE)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {CONFIG_FILE}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match config.logging.filter() {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("Failed to load config from {CONFIG_FILE}: {e}");
                return ExitCode::FAILURE;
            }
        },
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        camera = config.camera.index,
        width = config.camera.width,
        height = config.camera.height,
        cascade = %config.detector.cascade_path.display(),
        "starting plate scanner, press 's' to save a plate"
    );

    match setup_and_run(&config) {
        Ok(ScanOutcome::Saved(path)) => {
            info!(path = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Ok(ScanOutcome::CaptureFailed) => {
            info!("camera stopped delivering frames");
            ExitCode::SUCCESS
        }
        Ok(ScanOutcome::WindowClosed) => {
            info!("window closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "plate scanner failed");
            ExitCode::FAILURE
        }
    }
}
