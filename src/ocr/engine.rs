//! Recognition engine handle.
//!
//! The default backend keeps ocrs detection and recognition models loaded in
//! memory for its whole lifetime, so the model load is paid once at startup.

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;

use super::setup::{find_models_dir, DETECTION_MODEL, RECOGNITION_MODEL};
use super::tesseract::TesseractEngine;
use crate::config::{ExtractorConfig, OcrBackend};
use crate::log;

/// Anything that can turn a grayscale image into text.
///
/// Returns grouped text fragments with no geometry or confidence.
pub trait TextRecognizer {
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>>;
}

/// ocrs engine with both models resident in memory.
pub struct OcrsEngine {
    engine: OcrEngine,
    verbose: bool,
}

impl OcrsEngine {
    /// Loads the detection and recognition models from `models_dir`.
    pub fn new(models_dir: &Path, verbose: bool) -> Result<Self> {
        let detection_path = models_dir.join(DETECTION_MODEL);
        let recognition_path = models_dir.join(RECOGNITION_MODEL);

        log(&format!("Loading OCR detection model from {}", detection_path.display()));
        let detection_model = Model::load_file(&detection_path).with_context(|| {
            format!("Failed to load detection model from {}", detection_path.display())
        })?;

        log(&format!("Loading OCR recognition model from {}", recognition_path.display()));
        let recognition_model = Model::load_file(&recognition_path).with_context(|| {
            format!("Failed to load recognition model from {}", recognition_path.display())
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .context("Failed to create OCR engine")?;

        log("OCR engine ready");
        Ok(Self { engine, verbose })
    }

    /// Resolves the models directory from config and loads the models.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let models_dir = find_models_dir(config.models_dir.as_deref())
            .context("Failed to locate OCR models")?;
        Self::new(&models_dir, config.verbose)
    }
}

impl TextRecognizer for OcrsEngine {
    /// One fragment per detected text line, in reading order.
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>> {
        let rgb = DynamicImage::ImageLuma8(img.clone()).into_rgb8();
        let (width, height) = rgb.dimensions();

        let img_source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .context("Failed to create image source")?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .context("Failed to prepare OCR input")?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .context("Failed to detect words")?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .context("Failed to recognize text")?;

        let lines: Vec<String> = line_texts
            .iter()
            .flatten()
            .map(|line| line.to_string().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        if self.verbose {
            log(&format!(
                "OCR: {} word regions, {} text lines ({}x{})",
                word_rects.len(),
                lines.len(),
                width,
                height
            ));
        }

        Ok(lines)
    }
}

/// The engine selected by [`ExtractorConfig::backend`].
pub enum RecognitionEngine {
    Ocrs(OcrsEngine),
    Tesseract(TesseractEngine),
}

impl RecognitionEngine {
    /// Builds the configured backend. Failure here is fatal for the caller.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        match config.backend {
            OcrBackend::Ocrs => Ok(Self::Ocrs(OcrsEngine::from_config(config)?)),
            OcrBackend::Tesseract => Ok(Self::Tesseract(TesseractEngine::new(config)?)),
        }
    }
}

impl TextRecognizer for RecognitionEngine {
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>> {
        match self {
            Self::Ocrs(engine) => engine.recognize(img),
            Self::Tesseract(engine) => engine.recognize(img),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_models_dir_fails() {
        let dir = tempdir().unwrap();
        let config = ExtractorConfig {
            models_dir: Some(dir.path().join("nowhere")),
            ..ExtractorConfig::default()
        };
        let err = RecognitionEngine::from_config(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to locate OCR models"));
    }

    #[test]
    fn test_corrupt_model_fails_to_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DETECTION_MODEL), b"not a model").unwrap();
        fs::write(dir.path().join(RECOGNITION_MODEL), b"not a model").unwrap();

        let err = OcrsEngine::new(dir.path(), false).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to load detection model"));
    }

    #[test]
    fn test_tesseract_backend_selected() {
        let dir = tempdir().unwrap();
        let config = ExtractorConfig {
            backend: OcrBackend::Tesseract,
            tesseract_path: Some(dir.path().join("missing-tesseract")),
            ..ExtractorConfig::default()
        };
        let err = RecognitionEngine::from_config(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to locate Tesseract"));
    }
}
