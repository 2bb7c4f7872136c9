use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use tokio::sync::Semaphore;

use crate::{
    errors::{BotError, BotResult},
    request::ClipRequest,
    temp_file::{ClipFile, JobDirGuard, ScratchDir},
    video::{ClipSpec, ClipTool, OUTPUT_FORMAT},
};

/// Runs clip jobs against the external tool with a concurrency cap and a timeout
pub struct ClipRunner {
    tool: Arc<dyn ClipTool>,
    scratch: PathBuf,
    /// Limits concurrent tool invocations
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl ClipRunner {
    pub fn new(
        tool: Arc<dyn ClipTool>,
        scratch: impl Into<PathBuf>,
        max_concurrent: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            tool,
            scratch: scratch.into(),
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            timeout,
        }
    }

    /// Cut the requested range. Any failure is a failed job; the error carries the detail.
    pub async fn run(&self, request: &ClipRequest) -> BotResult<ClipFile> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| BotError::general(format!("Job runner closed: {}", e)))?;

        let job_dir = JobDirGuard::new(ScratchDir::job_dir(&self.scratch)?);
        let spec = ClipSpec {
            url: request.url.clone(),
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            output_dir: job_dir.path().to_path_buf(),
            format: OUTPUT_FORMAT,
            no_playlist: true,
        };

        let fetched = tokio::time::timeout(self.timeout, self.tool.fetch(&spec))
            .await
            .map_err(|_| BotError::timeout("yt-dlp", self.timeout))
            .and_then(|meta| meta);
        let meta = match fetched {
            Ok(meta) => meta,
            Err(e) => {
                job_dir.remove().await;
                return Err(e);
            }
        };

        let clip = ClipFile::new(job_dir.release(), meta.id, meta.ext);
        let missing = match tokio::fs::try_exists(clip.path()).await {
            Ok(true) => None,
            Ok(false) => Some(BotError::file_not_found(clip.path().display().to_string())),
            Err(e) => Some(e.into()),
        };
        if let Some(err) = missing {
            clip.remove().await;
            return Err(err);
        }

        log::info!(
            "Clip {}.{} ready for {}: {}",
            clip.id(),
            clip.ext(),
            request.requester,
            clip.path().display()
        );
        Ok(clip)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::{request::RequesterId, video::ytdlp::ClipMeta};

    /// Writes `{id}.mp4` into the job directory and records each spec
    pub(crate) struct FakeTool {
        pub id: String,
        pub write_file: bool,
        pub calls: Mutex<Vec<ClipSpec>>,
    }

    impl FakeTool {
        pub(crate) fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                write_file: true,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ClipTool for FakeTool {
        async fn fetch(&self, spec: &ClipSpec) -> BotResult<ClipMeta> {
            self.calls.lock().await.push(spec.clone());
            if self.write_file {
                tokio::fs::write(spec.output_dir.join(format!("{}.mp4", self.id)), b"clip").await?;
            }
            Ok(ClipMeta {
                id: self.id.clone(),
                ext: "mp4".to_string(),
            })
        }
    }

    pub(crate) struct FailingTool;

    #[async_trait]
    impl ClipTool for FailingTool {
        async fn fetch(&self, _spec: &ClipSpec) -> BotResult<ClipMeta> {
            Err(BotError::external_command_error(
                "yt-dlp",
                "ERROR: [generic] Unable to download webpage: HTTP Error 404",
            ))
        }
    }

    struct SlowTool {
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl ClipTool for SlowTool {
        async fn fetch(&self, spec: &ClipSpec) -> BotResult<ClipMeta> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            tokio::fs::write(spec.output_dir.join("slow.mp4"), b"clip").await?;
            Ok(ClipMeta {
                id: "slow".to_string(),
                ext: "mp4".to_string(),
            })
        }
    }

    fn request() -> ClipRequest {
        ClipRequest {
            url: "https://example.com/watch".to_string(),
            start_time: "00:00:00".to_string(),
            end_time: "00:00:05".to_string(),
            requester: RequesterId(7),
        }
    }

    #[tokio::test]
    async fn produces_clip_in_its_own_job_dir() {
        let scratch = ScratchDir::create().unwrap();
        let tool = Arc::new(FakeTool::new("abc123"));
        let runner = ClipRunner::new(tool.clone(), scratch.path(), 2, Duration::from_secs(5));

        let clip = runner.run(&request()).await.unwrap();
        assert!(clip.path().exists());
        assert!(clip.path().starts_with(scratch.path()));
        assert_eq!(clip.id(), "abc123");
        assert_eq!(clip.ext(), "mp4");

        let calls = tool.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].start_time, "00:00:00");
        assert_eq!(calls[0].end_time, "00:00:05");
        assert_eq!(calls[0].format, "mp4");
        assert!(calls[0].no_playlist);
        assert_eq!(Some(calls[0].output_dir.as_path()), clip.path().parent());
    }

    #[tokio::test]
    async fn tool_error_fails_job_and_cleans_up() {
        let scratch = ScratchDir::create().unwrap();
        let runner = ClipRunner::new(Arc::new(FailingTool), scratch.path(), 2, Duration::from_secs(5));

        let err = runner.run(&request()).await.unwrap_err();
        assert!(matches!(err, BotError::ExternalCommandError { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_output_is_an_error() {
        let scratch = ScratchDir::create().unwrap();
        let mut tool = FakeTool::new("ghost");
        tool.write_file = false;
        let runner = ClipRunner::new(Arc::new(tool), scratch.path(), 2, Duration::from_secs(5));

        let err = runner.run(&request()).await.unwrap_err();
        assert!(matches!(err, BotError::FileNotFound(_)));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let scratch = ScratchDir::create().unwrap();
        let tool = Arc::new(SlowTool {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: Duration::from_secs(5),
        });
        let runner = ClipRunner::new(tool, scratch.path(), 1, Duration::from_millis(50));

        let err = runner.run(&request()).await.unwrap_err();
        assert!(matches!(err, BotError::Timeout { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    /// Running means present in /proc and not yet a zombie
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
            return false;
        };
        let state = stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next());
        !matches!(state, Some('Z' | 'X') | None)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_processes_spawned_by_the_tool() {
        use std::os::unix::fs::PermissionsExt;

        use crate::video::YtDlp;

        let bin = tempfile::tempdir().unwrap();
        let pid_file = bin.path().join("grandchild.pid");
        let stub = bin.path().join("yt-dlp");
        std::fs::write(
            &stub,
            format!(
                "#!/bin/sh\nsleep 47 &\necho $! > '{}'\nwait\n",
                pid_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = ScratchDir::create().unwrap();
        let runner = ClipRunner::new(
            Arc::new(YtDlp::with_program(&stub)),
            scratch.path(),
            1,
            Duration::from_millis(500),
        );

        let err = runner.run(&request()).await.unwrap_err();
        assert!(matches!(err, BotError::Timeout { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let mut alive = true;
        for _ in 0..40 {
            alive = is_running(pid);
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "sleep {} outlived the timed out job", pid);
    }

    #[tokio::test]
    async fn concurrent_jobs_are_capped() {
        let scratch = ScratchDir::create().unwrap();
        let tool = Arc::new(SlowTool {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let runner = Arc::new(ClipRunner::new(
            tool.clone(),
            scratch.path(),
            2,
            Duration::from_secs(5),
        ));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let runner = runner.clone();
                tokio::spawn(async move { runner.run(&request()).await.map(|clip| clip.path().exists()) })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }
        assert_eq!(tool.peak.load(Ordering::SeqCst), 2);
    }
}
