//! Configuration for the OCR engine and preprocessing.
//!
//! Loads settings from config.json at startup. Every field has a default so
//! a partial file (or no file at all) still yields a working setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which recognition engine backs the extractor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// In-process ocrs models, loaded once at startup
    #[default]
    Ocrs,
    /// External tesseract executable, one process per image
    Tesseract,
}

/// Engine and preprocessing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Recognition engine
    #[serde(default)]
    pub backend: OcrBackend,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
    /// Tesseract language codes, joined with `+` on the command line
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Tesseract: use every available core (OpenMP); false pins it to one thread.
    /// The ocrs backend always runs its multithreaded CPU kernels.
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,
    /// Forward engine diagnostics to the log
    #[serde(default)]
    pub verbose: bool,
    /// Upscale factor applied to both dimensions before recognition
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// Tesseract page segmentation mode (6 = single uniform block of text)
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u8,
    /// Explicit path to the tesseract executable
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    /// Fetch missing model files before building the engine
    #[serde(default = "default_download_missing_models")]
    pub download_missing_models: bool,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_use_gpu() -> bool {
    true
}

fn default_scale_factor() -> f32 {
    1.2
}

fn default_page_segmentation_mode() -> u8 {
    6
}

fn default_download_missing_models() -> bool {
    true
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::default(),
            models_dir: None,
            languages: default_languages(),
            use_gpu: default_use_gpu(),
            verbose: false,
            scale_factor: default_scale_factor(),
            page_segmentation_mode: default_page_segmentation_mode(),
            tesseract_path: None,
            tessdata_dir: None,
            download_missing_models: default_download_missing_models(),
        }
    }
}

/// Loads configuration from the given path or returns defaults.
pub fn load_config(config_path: &Path) -> ExtractorConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log(&format!("Config loaded from {}", config_path.display()));
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    ExtractorConfig::default()
}
