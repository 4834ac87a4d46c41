//! OSD Telemetry Extractor
//!
//! Reads GPS, altitude, battery and signal-quality values out of the
//! on-screen display burned into video frames. Cropped OSD regions are
//! run through an OCR engine and the recognized text is parsed with regexes.

pub mod config;
pub mod ocr;
pub mod paths;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub use config::{load_config, ExtractorConfig, OcrBackend};
pub use ocr::{
    OcrsEngine, OsdExtractor, RecognitionEngine, TelemetryField, TelemetryRecord,
    TesseractEngine, TextRecognizer,
};

/// Logs a message to both stderr and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("osd_telemetry.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
