//! OSD Telemetry Extractor
//!
//! Reads the top and bottom OSD crops of a frame from disk and prints the
//! recognized telemetry as JSON.
//!
//! Usage: `osd-telemetry <top-image> <bottom-image>`

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use osd_telemetry::{load_config, log, ocr, paths, OsdExtractor};

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (top_path, bottom_path) = match args.as_slice() {
        [top, bottom] => (Path::new(top), Path::new(bottom)),
        _ => return Err(anyhow!("Usage: osd-telemetry <top-image> <bottom-image>")),
    };

    // Ensure output directories exist
    paths::ensure_directories()?;

    let config = load_config(&paths::get_config_path());

    if let Err(e) = ocr::ensure_models(&config) {
        log(&format!("Warning: Failed to fetch OCR models: {}", e));
    }

    // Engine construction failure is fatal
    let extractor = OsdExtractor::from_config(&config).context("Failed to start OCR engine")?;

    let top = image::open(top_path)
        .with_context(|| format!("Failed to load {}", top_path.display()))?;
    let bottom = image::open(bottom_path)
        .with_context(|| format!("Failed to load {}", bottom_path.display()))?;

    let record = extractor.extract(Some(&top), Some(&bottom))?;
    log(&format!(
        "Extracted {} field(s) from {} + {}",
        record.len(),
        top_path.display(),
        bottom_path.display()
    ));

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
