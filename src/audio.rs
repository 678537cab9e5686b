//! Audio normalization via ffmpeg and on-disk artifact handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

/// Capability to normalize downloaded audio into the fixed target format
#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    /// Convert `src` into the target container/codec at `dst`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] if the conversion fails
    async fn convert(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Normalizes audio by shelling out to ffmpeg.
///
/// Target format is M4A: AAC at 64 kbit/s, 44.1 kHz, stereo. Voice notes
/// arrive as OGG/Opus with an `.oga` extension, so the OGG demuxer is forced
/// for those inputs.
pub struct FfmpegNormalizer {
    binary: String,
}

impl FfmpegNormalizer {
    /// Create a normalizer using `ffmpeg` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Create a normalizer using a specific ffmpeg binary
    #[must_use]
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn convert(&self, src: &Path, dst: &Path) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command.arg("-y");

        let is_ogg = src
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("oga") || ext.eq_ignore_ascii_case("ogg"));
        if is_ogg {
            command.args(["-f", "ogg"]);
        }

        command
            .arg("-i")
            .arg(src)
            .args(["-acodec", "aac", "-b:a", "64k", "-ar", "44100", "-ac", "2"])
            .arg(dst);

        let output = command
            .output()
            .await
            .map_err(|e| Error::Audio(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            return Err(Error::Audio(format!(
                "ffmpeg exited with code {code}: {stderr}"
            )));
        }

        tracing::debug!(
            src = %src.display(),
            dst = %dst.display(),
            "audio normalized"
        );
        Ok(())
    }
}

/// Builds artifact paths under the downloads directory and sweeps stale files.
///
/// Raw downloads awaiting conversion land in `temp/`; normalized files land
/// in the downloads directory itself. Both are created at construction.
#[derive(Debug, Clone)]
pub struct MediaStore {
    download_dir: PathBuf,
    temp_dir: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `download_dir`, creating directories as needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self> {
        let download_dir = download_dir.into();
        let temp_dir = download_dir.join("temp");
        std::fs::create_dir_all(&download_dir)?;
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            download_dir,
            temp_dir,
        })
    }

    /// Path for a raw download awaiting conversion
    #[must_use]
    pub fn temp_path(&self, message_id: i64, extension: &str) -> PathBuf {
        self.temp_dir
            .join(format!("{}.{extension}", artifact_stem(message_id)))
    }

    /// Path for a normalized (or already-normalized) audio file
    #[must_use]
    pub fn final_path(&self, message_id: i64) -> PathBuf {
        self.download_dir
            .join(format!("{}.m4a", artifact_stem(message_id)))
    }

    /// Remove files older than `max_age` from both directories.
    ///
    /// Best-effort: every failure is logged and skipped, and the sweep never
    /// fails the caller. Returns the number of files removed.
    pub fn cleanup_old_files(&self, max_age: Duration) -> usize {
        let mut removed = 0;

        for dir in [&self.download_dir, &self.temp_dir] {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "cannot read artifact dir");
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }

                let age = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| modified.elapsed().ok());

                if age.is_some_and(|age| age > max_age) {
                    match std::fs::remove_file(&path) {
                        Ok(()) => {
                            removed += 1;
                            tracing::info!(path = %path.display(), "removed old audio file");
                        }
                        Err(err) => {
                            tracing::warn!(path = %path.display(), error = %err, "failed to remove old audio file");
                        }
                    }
                }
            }
        }

        removed
    }
}

/// `voice_{timestamp}_{message_id}` stem shared by all artifacts of one message
fn artifact_stem(message_id: i64) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("voice_{timestamp}_{message_id}")
}
