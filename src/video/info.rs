use std::path::Path;

use serde_json::Value;
use tokio::process::Command;

use crate::errors::{BotError, BotResult};

/// Dimensions attached to the uploaded clip
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration: f64,
}

impl VideoInfo {
    pub async fn from_file(path: &Path) -> BotResult<Self> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BotError::external_command_error("ffprobe", e.to_string()))?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            return Err(BotError::external_command_error("ffprobe", error_msg));
        }

        let json: Value = serde_json::from_slice(&output.stdout)?;

        Self::parse_json(&json)
    }

    fn parse_json(json: &Value) -> BotResult<Self> {
        let streams = json["streams"].as_array().ok_or_else(|| {
            BotError::ParseError("No streams found in ffprobe output".to_string())
        })?;

        let video_stream = streams
            .iter()
            .find(|s| s["codec_type"] == "video")
            .ok_or_else(|| BotError::ParseError("No video stream found".to_string()))?;

        let width = video_stream["width"]
            .as_u64()
            .ok_or_else(|| BotError::ParseError("Width not found in video stream".to_string()))?
            as u32;

        let height = video_stream["height"]
            .as_u64()
            .ok_or_else(|| BotError::ParseError("Height not found in video stream".to_string()))?
            as u32;

        // ffprobe reports duration as a string; clips cut by ffmpeg sometimes omit it
        let duration = json["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(VideoInfo {
            width,
            height,
            duration,
        })
    }
}
