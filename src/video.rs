//! Video platform detection and yt-dlp integration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use crate::error::ExtractError;
use crate::model::VideoMetadata;
use crate::subtitles::clean_subtitles;

/// Supported short-video platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
    Facebook,
}

/// Domains handled by the video path. Matched against the parsed hostname
/// (exact or dot-separated suffix), never by substring, so lookalike hosts
/// and query-string tricks do not qualify.
const VIDEO_DOMAINS: [(&str, Platform); 7] = [
    ("tiktok.com", Platform::Tiktok),
    ("vm.tiktok.com", Platform::Tiktok),
    ("instagram.com", Platform::Instagram),
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("facebook.com", Platform::Facebook),
    ("fb.watch", Platform::Facebook),
];

impl Platform {
    /// Classify a URL by hostname. `None` for anything that is not a
    /// supported video platform.
    pub fn detect(url: &str) -> Option<Platform> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();

        VIDEO_DOMAINS.iter().find_map(|(domain, platform)| {
            (host == *domain || host.ends_with(&format!(".{domain}"))).then_some(*platform)
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the fields we read from `yt-dlp --dump-json`.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    title: Option<String>,
    description: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    tags: Option<Vec<String>>,
}

/// Wrapper around the yt-dlp binary.
///
/// The metadata probe and the caption fetch are separate invocations with
/// separate timeouts; either can fail without affecting the other, and their
/// results are merged into one [`VideoMetadata`].
pub struct VideoTool {
    metadata_timeout: Duration,
    download_timeout: Duration,
}

impl VideoTool {
    pub fn new(metadata_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            metadata_timeout,
            download_timeout,
        }
    }

    /// Collect whatever metadata and captions are available for `url`.
    /// Probe failures degrade to an emptier result, never to an error.
    pub async fn probe(
        &self,
        url: &str,
        platform: Option<Platform>,
        temp_dir: &Path,
    ) -> VideoMetadata {
        let mut metadata = VideoMetadata {
            platform: platform.map(|p| p.as_str().to_string()),
            ..Default::default()
        };

        match self
            .run(&["--no-download", "--dump-json", "--", url], self.metadata_timeout)
            .await
        {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stdout = stdout.trim();
                if !stdout.is_empty() {
                    match serde_json::from_str::<ProbeOutput>(stdout) {
                        Ok(probe) => {
                            metadata.title = probe.title;
                            metadata.description = probe.description;
                            metadata.uploader = probe.uploader.or(probe.channel);
                            metadata.duration = probe.duration.map(|d| d as u64);
                            metadata.tags = probe.tags.unwrap_or_default();
                            info!("metadata extracted: {:?}", metadata.title);
                        }
                        Err(e) => warn!("could not parse metadata JSON: {e}"),
                    }
                }
            }
            Ok(output) => warn!("metadata probe exited with {}", output.status),
            Err(e) => warn!("metadata probe failed: {e}"),
        }

        // Captions come from a second call; they are often missing even when
        // metadata is present
        match self.fetch_captions(url, temp_dir).await {
            Ok(Some(subtitles)) => {
                info!("subtitles extracted: {} characters", subtitles.chars().count());
                metadata.subtitles = Some(subtitles);
            }
            Ok(None) => debug!("no usable subtitles for {url}"),
            Err(e) => warn!("caption fetch failed: {e}"),
        }

        metadata
    }

    async fn fetch_captions(
        &self,
        url: &str,
        temp_dir: &Path,
    ) -> Result<Option<String>, ExtractError> {
        let sub_base = temp_dir.join("subs");
        let sub_arg = sub_base.to_string_lossy().into_owned();

        let output = self
            .run(
                &[
                    "--skip-download",
                    "--write-subs",
                    "--write-auto-subs",
                    "--sub-lang",
                    "de,en",
                    "--sub-format",
                    "vtt/srt/best",
                    "-o",
                    &sub_arg,
                    "--",
                    url,
                ],
                self.metadata_timeout,
            )
            .await?;

        if !output.status.success() {
            debug!("caption probe exited with {}", output.status);
        }

        for ext in [".vtt", ".srt", ".de.vtt", ".en.vtt", ".de.srt", ".en.srt"] {
            let path = temp_dir.join(format!("subs{ext}"));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                let raw = tokio::fs::read(&path).await?;
                return Ok(clean_subtitles(&String::from_utf8_lossy(&raw)));
            }
        }

        Ok(None)
    }

    /// Download the video behind `url` to `output_path`.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<PathBuf, ExtractError> {
        let out_arg = output_path.to_string_lossy().into_owned();

        let output = self
            .run(
                &[
                    "-f",
                    "best[ext=mp4]/best",
                    "--no-playlist",
                    "-o",
                    &out_arg,
                    "--",
                    url,
                ],
                self.download_timeout,
            )
            .await?;

        if output.status.success() && tokio::fs::try_exists(output_path).await.unwrap_or(false) {
            let size = tokio::fs::metadata(output_path)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            info!("video downloaded: {} ({}KB)", output_path.display(), size / 1024);
            return Ok(output_path.to_path_buf());
        }

        warn!(
            "yt-dlp download error: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Err(ExtractError::NoContent("video download failed".to_string()))
    }

    /// Run yt-dlp with a timeout. The trailing `--` in every argument list
    /// keeps URLs from being parsed as flags.
    async fn run(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<std::process::Output, ExtractError> {
        let mut cmd = Command::new("yt-dlp");
        cmd.args(args).kill_on_drop(true);

        tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                ExtractError::ToolUnavailable(format!(
                    "yt-dlp timed out after {}s",
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractError::ToolUnavailable("yt-dlp is not installed".to_string())
                } else {
                    ExtractError::Io(e)
                }
            })
    }
}
