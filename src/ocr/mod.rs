pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod tesseract;
pub mod extract;

pub use setup::ensure_models;
pub use preprocess::{prepare_for_ocr, DEFAULT_SCALE_FACTOR};
pub use engine::{OcrsEngine, RecognitionEngine, TextRecognizer};
pub use tesseract::TesseractEngine;
pub use extract::{parse_telemetry, TelemetryField, TelemetryParser, TelemetryRecord};

use anyhow::{anyhow, Result};
use image::DynamicImage;

use crate::config::ExtractorConfig;
use preprocess::is_empty_image;

/// Reads telemetry from the top and bottom OSD regions of a frame.
///
/// Owns the recognizer for its whole lifetime; build it once at startup and
/// reuse it for every frame. Calls are sequential and blocking. Sharing one
/// extractor across threads needs external locking unless the recognizer is
/// known to be safe for concurrent use.
pub struct OsdExtractor<R: TextRecognizer> {
    recognizer: R,
    parser: TelemetryParser,
    scale_factor: f32,
}

impl OsdExtractor<RecognitionEngine> {
    /// Builds the configured engine once. Fails if it cannot start.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let engine = RecognitionEngine::from_config(config)?;
        Self::with_scale_factor(engine, config.scale_factor)
    }
}

impl<R: TextRecognizer> OsdExtractor<R> {
    pub fn new(recognizer: R) -> Result<Self> {
        Self::with_scale_factor(recognizer, DEFAULT_SCALE_FACTOR)
    }

    /// Fails unless `scale_factor` is a finite, positive number.
    pub fn with_scale_factor(recognizer: R, scale_factor: f32) -> Result<Self> {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(anyhow!("Invalid scale factor: {}", scale_factor));
        }

        Ok(Self {
            recognizer,
            parser: TelemetryParser::new()?,
            scale_factor,
        })
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Preprocesses one region and returns its text, fragments joined by spaces.
    ///
    /// Absent or zero-sized images short-circuit to an empty string without
    /// calling the recognizer.
    pub fn ocr_image(&self, img: Option<&DynamicImage>) -> Result<String> {
        let img = match img {
            Some(img) if !is_empty_image(Some(img)) => img,
            _ => return Ok(String::new()),
        };

        let prepared = prepare_for_ocr(img, self.scale_factor);
        let fragments = self.recognizer.recognize(&prepared)?;

        Ok(fragments.join(" "))
    }

    /// Text handed to the parser: top text, one space, bottom text.
    pub fn combined_text(
        &self,
        top: Option<&DynamicImage>,
        bottom: Option<&DynamicImage>,
    ) -> Result<String> {
        let text_top = self.ocr_image(top)?;
        let text_bottom = self.ocr_image(bottom)?;
        Ok(format!("{} {}", text_top, text_bottom))
    }

    /// Extracts telemetry from the top and bottom OSD crops of one frame.
    pub fn extract(
        &self,
        top: Option<&DynamicImage>,
        bottom: Option<&DynamicImage>,
    ) -> Result<TelemetryRecord> {
        let combined = self.combined_text(top, bottom)?;
        Ok(self.parser.parse(&combined))
    }
}
