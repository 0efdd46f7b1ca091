use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::info;

use crate::uploaded_image::{ImageUploadError, UploadedImage};

/// Directory holding the photographs attached to attendance rows.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<name>_<roll>_<YYYYmmdd_HHMMSS>.jpg`, with path separators and other
    /// unsafe characters replaced.
    pub fn file_name(name: &str, roll_no: &str, uploaded_at: NaiveDateTime) -> String {
        format!(
            "{}_{}_{}.jpg",
            sanitize(name),
            sanitize(roll_no),
            uploaded_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn save(&self, image: &UploadedImage, file_name: &str) -> Result<PathBuf, ImageUploadError> {
        let path = self.dir.join(file_name);
        image.save_as_jpeg(&path)?;
        Ok(path)
    }

    /// Removes every stored photo and leaves an empty directory behind.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        std::fs::create_dir_all(&self.dir)?;
        info!("Cleared photo store {}", self.dir.display());
        Ok(())
    }
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
