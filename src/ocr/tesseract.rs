//! Tesseract backend, run as an external process per call.

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::engine::TextRecognizer;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::config::ExtractorConfig;
use crate::log;

/// Tesseract, run as an external process.
///
/// Construction resolves the executable and language data once. Each
/// `recognize` call starts a fresh process, which reads the trained data again.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: PathBuf,
    languages: String,
    page_segmentation_mode: u8,
    use_gpu: bool,
    verbose: bool,
}

impl TesseractEngine {
    /// Builds the engine from config. Fails if Tesseract or language data is missing.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        if config.languages.is_empty() {
            return Err(anyhow!("No OCR languages configured"));
        }

        let executable = find_tesseract_executable(config.tesseract_path.as_deref())
            .context("Failed to locate Tesseract")?;
        let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.languages)
            .context("Failed to locate Tesseract language data")?;
        let languages = config.languages.join("+");

        log(&format!(
            "Tesseract engine ready: {} (tessdata: {}, languages: {})",
            executable.display(),
            tessdata.display(),
            languages
        ));

        Ok(Self {
            executable,
            tessdata,
            languages,
            page_segmentation_mode: config.page_segmentation_mode,
            use_gpu: config.use_gpu,
            verbose: config.verbose,
        })
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();
        let tsv_path = format!("{}.tsv", output_base);

        let mut command = Command::new(&self.executable);
        command
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .arg("tsv");
        if !self.use_gpu {
            command.env("OMP_THREAD_LIMIT", "1");
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if self.verbose && !output.stderr.is_empty() {
            log(&format!(
                "Tesseract: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let tsv_content = if output.status.success() {
            std::fs::read_to_string(&tsv_path)
                .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(anyhow!("Tesseract failed: {}", stderr.trim()))
        };

        // Tesseract may leave output behind even when it fails
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_paragraphs(&tsv_content?))
    }
}

/// Groups Tesseract TSV word rows into paragraph strings.
///
/// Words sharing a `(block_num, par_num)` pair form one paragraph; lines
/// inside a paragraph are flattened with single spaces.
fn parse_tsv_paragraphs(tsv: &str) -> Vec<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current_key: Option<(i32, i32)> = None;
    let mut current_words: Vec<&str> = Vec::new();

    for line in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        let block_num: i32 = fields[2].parse().unwrap_or(-1);
        let par_num: i32 = fields[3].parse().unwrap_or(-1);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() {
            continue;
        }

        let key = (block_num, par_num);
        if current_key != Some(key) {
            if !current_words.is_empty() {
                paragraphs.push(current_words.join(" "));
                current_words.clear();
            }
            current_key = Some(key);
        }
        current_words.push(text);
    }

    if !current_words.is_empty() {
        paragraphs.push(current_words.join(" "));
    }

    paragraphs
}
