use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the config file path: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the per-user directory holding downloaded Tesseract data.
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("osd-telemetry")
        .join("tesseract")
}

/// Returns the per-user directory holding downloaded ocrs models.
pub fn get_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("osd-telemetry")
        .join("models")
}

/// Returns the bundled models directory: `<exe_dir>/models/`
pub fn get_bundled_models_dir() -> PathBuf {
    get_exe_dir().join("models")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_under_exe_dir() {
        assert!(get_logs_dir().starts_with(get_exe_dir()));
        assert!(get_config_path().starts_with(get_exe_dir()));
        assert!(get_config_path().ends_with("config.json"));
    }

    #[test]
    fn test_tesseract_dir_is_namespaced() {
        let dir = get_tesseract_dir();
        assert!(dir.ends_with("osd-telemetry/tesseract"));
        assert!(get_models_dir().ends_with("osd-telemetry/models"));
        assert!(get_bundled_models_dir().starts_with(get_exe_dir()));
    }
}
