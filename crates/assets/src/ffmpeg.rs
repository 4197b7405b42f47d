//! Helpers for the ffmpeg/ffprobe command-line tools.

use std::path::Path;
use std::process::{Command, Stdio};

use storyreel_common::error::{ReelError, ReelResult};

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Measure the container duration of a media file in seconds.
pub async fn probe_duration_secs(path: &Path) -> ReelResult<f64> {
    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| ReelError::audio(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ReelError::audio(format!(
            "ffprobe failed on {} (status {}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    parse_probe_duration(&raw).ok_or_else(|| {
        ReelError::audio(format!(
            "ffprobe reported no usable duration for {}: {:?}",
            path.display(),
            raw.trim()
        ))
    })
}

/// Parse the first line of `ffprobe ... format=duration` output.
pub fn parse_probe_duration(raw: &str) -> Option<f64> {
    let value = raw.lines().next()?.trim().parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Quote a path for an ffmpeg concat list (`file '...'`).
pub fn concat_list_entry(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', r"'\''");
    format!("file '{escaped}'")
}

/// Tail of captured stderr, trimmed for error messages.
pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(8);
    lines[start..].join("\n")
}
