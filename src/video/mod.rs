pub mod info;
pub mod ytdlp;

pub use info::VideoInfo;
pub use ytdlp::{ClipSpec, ClipTool, OUTPUT_FORMAT, YtDlp};
