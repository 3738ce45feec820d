//! ffmpeg-backed transcoding: intermediate re-encode, fixed-length splitting,
//! and lossless per-segment conversion.
//!
//! Every operation shells out through the `CommandExecutor` seam; any non-zero
//! exit from the tool is fatal and carries its stderr.

use crate::error::{Result, SegscribeError};
use crate::media::command::CommandExecutor;
use std::path::{Path, PathBuf};

/// Zero-padded segment file prefix. Three digits keep lexical order equal to
/// chronological order for up to 1000 segments.
const SEGMENT_FILE_PREFIX: &str = "segment_";

/// Transcoder that uses a CommandExecutor for tool invocation.
pub struct Transcoder<E: CommandExecutor> {
    executor: E,
}

impl<E: CommandExecutor> Transcoder<E> {
    /// Create a new Transcoder with the given executor.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Re-encode a source asset to a widely decodable MP3, dropping any video
    /// stream. Returns the path of the intermediate file inside `out_dir`.
    pub fn to_intermediate(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source");
        let output = out_dir.join(format!("{stem}.mp3"));

        self.executor.execute(
            "ffmpeg",
            &[
                "-i",
                &source.display().to_string(),
                "-vn",
                "-acodec",
                "libmp3lame",
                &output.display().to_string(),
            ],
        )?;

        Ok(output)
    }

    /// Split an intermediate file into fixed-length chunks inside `out_dir`.
    ///
    /// Chunks are named `segment_NNN.mp3` so lexical sort order equals
    /// chronological order; the returned paths are sorted. The last chunk may
    /// be shorter than `segment_secs`.
    pub fn split(
        &self,
        intermediate: &Path,
        segment_secs: u64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let pattern = out_dir.join(format!("{SEGMENT_FILE_PREFIX}%03d.mp3"));

        self.executor.execute(
            "ffmpeg",
            &[
                "-i",
                &intermediate.display().to_string(),
                "-f",
                "segment",
                "-segment_time",
                &segment_secs.to_string(),
                "-c",
                "copy",
                &pattern.display().to_string(),
            ],
        )?;

        let mut segments: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(SEGMENT_FILE_PREFIX) && n.ends_with(".mp3"))
            })
            .collect();
        segments.sort();

        if segments.is_empty() {
            return Err(SegscribeError::Transcode {
                message: format!(
                    "segment split of {} produced no output files",
                    intermediate.display()
                ),
            });
        }

        Ok(segments)
    }

    /// Re-encode one segment to FLAC, the lossless codec the recognition
    /// backend requires. Output sits next to the input with a .flac extension.
    pub fn to_lossless(&self, segment: &Path) -> Result<PathBuf> {
        let output = segment.with_extension("flac");

        self.executor.execute(
            "ffmpeg",
            &[
                "-i",
                &segment.display().to_string(),
                "-acodec",
                "flac",
                &output.display().to_string(),
            ],
        )?;

        Ok(output)
    }
}
