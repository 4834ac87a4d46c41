use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{ExtractorConfig, OcrBackend};
use crate::log;
use crate::paths::{get_bundled_models_dir, get_models_dir, get_tesseract_dir};

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const OCRS_MODELS_REPO: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

fn executable_name() -> &'static str {
    if cfg!(windows) { "tesseract.exe" } else { "tesseract" }
}

fn traineddata_file(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// True if `dir` holds a `.traineddata` file for every language.
pub fn has_language_data(dir: &Path, languages: &[String]) -> bool {
    !languages.is_empty()
        && languages
            .iter()
            .all(|lang| dir.join(traineddata_file(lang)).exists())
}

fn runs_ok(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then common paths.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if runs_ok(path) {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tesseract executable does not run: {}",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() && runs_ok(&local_exe) {
        return Ok(local_exe);
    }

    let on_path = PathBuf::from("tesseract");
    if runs_ok(&on_path) {
        return Ok(on_path);
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() && runs_ok(&p) {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory that covers every configured language.
pub fn find_tessdata_dir(configured: Option<&Path>, languages: &[String]) -> Result<PathBuf> {
    if let Some(dir) = configured {
        if has_language_data(dir, languages) {
            return Ok(dir.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tessdata directory {} is missing data for [{}]",
            dir.display(),
            languages.join(", ")
        ));
    }

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_language_data(&local_tessdata, languages) {
        return Ok(local_tessdata);
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_language_data(&p, languages) {
            return Ok(p);
        }
        let p = p.join("tessdata");
        if has_language_data(&p, languages) {
            return Ok(p);
        }
    }

    for path in COMMON_TESSDATA_DIRS {
        let p = PathBuf::from(path);
        if has_language_data(&p, languages) {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "tessdata directory not found. Please ensure {} is available.",
        languages
            .iter()
            .map(|lang| traineddata_file(lang))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

/// True if `dir` holds both ocrs models.
pub fn has_ocrs_models(dir: &Path) -> bool {
    dir.join(DETECTION_MODEL).exists() && dir.join(RECOGNITION_MODEL).exists()
}

/// Finds the ocrs models: configured dir, per-user dir, then `<exe_dir>/models`.
pub fn find_models_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        if has_ocrs_models(dir) {
            return Ok(dir.to_path_buf());
        }
        return Err(anyhow!(
            "Configured models directory {} is missing {} or {}",
            dir.display(),
            DETECTION_MODEL,
            RECOGNITION_MODEL
        ));
    }

    for dir in [get_models_dir(), get_bundled_models_dir()] {
        if has_ocrs_models(&dir) {
            return Ok(dir);
        }
    }

    Err(anyhow!(
        "OCR models not found. Please place {} and {} in {}.",
        DETECTION_MODEL,
        RECOGNITION_MODEL,
        get_models_dir().display()
    ))
}

/// Makes sure the configured backend's model files can be found.
///
/// Missing files are downloaded into the per-user data dir. Does nothing when
/// the files are already present, when downloading is disabled, or when an
/// explicit directory is configured.
pub fn ensure_models(config: &ExtractorConfig) -> Result<()> {
    match config.backend {
        OcrBackend::Ocrs => ensure_ocrs_models(config),
        OcrBackend::Tesseract => ensure_tessdata(config),
    }
}

fn ensure_ocrs_models(config: &ExtractorConfig) -> Result<()> {
    if find_models_dir(config.models_dir.as_deref()).is_ok() {
        return Ok(());
    }

    if !config.download_missing_models || config.models_dir.is_some() {
        return Ok(());
    }

    let models_dir = get_models_dir();
    fs::create_dir_all(&models_dir)
        .with_context(|| format!("Failed to create {}", models_dir.display()))?;

    for file_name in [DETECTION_MODEL, RECOGNITION_MODEL] {
        if !models_dir.join(file_name).exists() {
            download_file(OCRS_MODELS_REPO, &models_dir, file_name)?;
        }
    }

    log(&format!("OCR models ready at: {}", models_dir.display()));
    Ok(())
}

fn ensure_tessdata(config: &ExtractorConfig) -> Result<()> {
    if find_tessdata_dir(config.tessdata_dir.as_deref(), &config.languages).is_ok() {
        return Ok(());
    }

    if !config.download_missing_models || config.tessdata_dir.is_some() {
        return Ok(());
    }

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;

    for language in &config.languages {
        let file_name = traineddata_file(language);
        if !tessdata_dir.join(&file_name).exists() {
            download_file(TESSDATA_REPO, &tessdata_dir, &file_name)?;
        }
    }

    log(&format!("Tessdata ready at: {}", tessdata_dir.display()));
    Ok(())
}

/// Downloads `<repo>/<file_name>` into `dest_dir`.
fn download_file(repo: &str, dest_dir: &Path, file_name: &str) -> Result<()> {
    let url = format!("{}/{}", repo, file_name);
    let dest = dest_dir.join(file_name);

    log(&format!("Downloading {}...", file_name));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "osd-telemetry")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;

    // Write under a temporary name so a failed download never looks complete
    let partial = dest_dir.join(format!("{}.part", file_name));
    let mut file = fs::File::create(&partial)?;
    file.write_all(&bytes)?;
    drop(file);
    fs::rename(&partial, &dest)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}
