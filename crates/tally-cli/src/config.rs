use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory of reference images, one JPEG per identity.
    pub faces_dir: PathBuf,
    /// Path to the attendance ledger JSON file.
    pub ledger_path: PathBuf,
    /// Path to the ArcFace ONNX model.
    pub model_path: PathBuf,
    /// Cosine similarity threshold for a positive match.
    pub similarity_threshold: f32,
}

impl Config {
    /// Load configuration from `TALLY_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("tally");

        Self {
            camera_device: std::env::var("TALLY_CAMERA_DEVICE")
                .unwrap_or_else(|_| tally_hw::DEFAULT_DEVICE.to_string()),
            faces_dir: std::env::var("TALLY_FACES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("faces")),
            ledger_path: std::env::var("TALLY_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("attendance.json")),
            model_path: std::env::var("TALLY_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("models/w600k_r50.onnx")),
            similarity_threshold: env_f32(
                "TALLY_SIMILARITY_THRESHOLD",
                tally_oracle::DEFAULT_SIMILARITY_THRESHOLD,
            ),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
