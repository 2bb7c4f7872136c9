use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use tokio::process;

use crate::errors::{BotError, BotResult};

pub const OUTPUT_FORMAT: &str = "mp4";

/// What to cut and where the tool should put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSpec {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub output_dir: PathBuf,
    pub format: &'static str,
    pub no_playlist: bool,
}

/// Identity the tool assigned to the produced file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClipMeta {
    pub id: String,
    pub ext: String,
}

/// External downloader/transcoder
#[async_trait]
pub trait ClipTool: Send + Sync {
    async fn fetch(&self, spec: &ClipSpec) -> BotResult<ClipMeta>;
}

/// `yt-dlp` with `ffmpeg` as the external downloader
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::with_program("yt-dlp")
    }
}

impl YtDlp {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn output_template(dir: &Path) -> String {
    format!("{}/%(id)s.%(ext)s", dir.display())
}

fn build_clip_command(program: &Path, spec: &ClipSpec) -> process::Command {
    let mut cmd = process::Command::new(program);
    if spec.no_playlist {
        cmd.arg("--no-playlist");
    }
    cmd.args(["--socket-timeout", "5", "--retries", "3"])
        .args(["-f", spec.format])
        // Let ffmpeg seek so only the requested range is fetched
        .args(["--downloader", "ffmpeg"])
        .args([
            "--downloader-args".to_string(),
            format!("ffmpeg_i:-ss {} -to {}", spec.start_time, spec.end_time),
        ])
        .args(["-o", &output_template(&spec.output_dir)])
        .arg("--no-simulate")
        .args(["--print", "after_move:%(.{id,ext})j"])
        .arg(&spec.url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // ffmpeg runs as a grandchild, so it has to share a group we can signal
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Kills the tool's whole process group when dropped while still armed.
///
/// `kill_on_drop` only reaches the direct child; the ffmpeg it spawned would
/// keep downloading after a timeout.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let status = std::process::Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pgid)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => log::warn!("Killed yt-dlp process group {}", pgid),
        // Group already gone
        Ok(_) => {}
        Err(e) => log::error!("Failed to kill yt-dlp process group {}: {}", pgid, e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

/// Last JSON line printed by yt-dlp
fn parse_meta(stdout: &str) -> BotResult<ClipMeta> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BotError::ParseError("yt-dlp printed nothing".to_string()))?;

    let meta: ClipMeta = serde_json::from_str(line)?;
    if meta.id.is_empty() || meta.ext.is_empty() || meta.id.contains(['/', '\\']) {
        return Err(BotError::ParseError(format!(
            "Unusable id/ext from yt-dlp: {}",
            line
        )));
    }
    Ok(meta)
}

#[async_trait]
impl ClipTool for YtDlp {
    async fn fetch(&self, spec: &ClipSpec) -> BotResult<ClipMeta> {
        info!(
            "Starting clip: {} [{} - {}] into {}",
            spec.url,
            spec.start_time,
            spec.end_time,
            spec.output_dir.display()
        );

        let child = build_clip_command(&self.program, spec)
            .spawn()
            .map_err(|e| BotError::external_command_error("yt-dlp", e.to_string()))?;
        let group = ProcessGroup { pgid: child.id() };

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BotError::external_command_error("yt-dlp", e.to_string()))?;
        group.disarm();

        info!("yt-dlp exit code: {:?}", output.status.code());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BotError::external_command_error("yt-dlp", stderr));
        }

        parse_meta(&String::from_utf8_lossy(&output.stdout))
    }
}
