//! Temporary render assets.

use std::io::Write;
use std::path::Path;

use tempfile::TempPath;
use tracing::debug;

use crate::error::MediaResult;

/// Subtitle file written next to the render output for burn-in.
///
/// Removed on [`SubtitleAsset::release`] or drop; removal errors are ignored.
#[derive(Debug)]
pub struct SubtitleAsset {
    path: TempPath,
}

impl SubtitleAsset {
    /// Write `contents` to a new `captions_*.srt` file in `dir`.
    pub fn write(dir: &Path, contents: &str) -> MediaResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("captions_")
            .suffix(".srt")
            .tempfile_in(dir)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!("Wrote subtitle asset {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now.
    pub fn release(self) {
        let shown = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            debug!("Ignoring subtitle cleanup failure for {}: {}", shown, e);
        }
    }
}
