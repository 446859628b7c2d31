//! Transport backends: progressive HTTP, rtmpdump and ffmpeg capture

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::plan::WorkItem;
use crate::handlers::{Stream, TransportKind};
use crate::humanize::ByteSize;
use crate::session::{Session, SessionError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("transfer of {url} interrupted: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("no backend for {0} streams")]
    Unsupported(TransportKind),
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write the item's stream to `item.target`
    async fn download(&self, item: &WorkItem, session: &Session) -> Result<()>;

    /// Download, then hand the file to the player
    async fn play(&self, item: &WorkItem, session: &Session, player: &Player) -> Result<()> {
        self.download(item, session).await?;
        player.launch(&item.target.to_string_lossy()).await
    }
}

/// Stream a GET response into `path`, truncating whatever was there
pub async fn fetch_to_file(session: &Session, url: &str, path: &Path) -> Result<u64> {
    let io_err = |source: std::io::Error| TransportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut response = session.open(url).await?;
    let total = response.content_length();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;

    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    debug!(
        url,
        path = %path.display(),
        written = %ByteSize(written),
        total = ?total,
        "Transfer finished"
    );
    Ok(written)
}

async fn run(program: &str, args: &[String]) -> Result<()> {
    debug!(program, ?args, "Running external program");

    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| TransportError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(TransportError::Exit {
            program: program.to_string(),
            status,
        });
    }
    Ok(())
}

/// Progressive HTTP download through the session
#[derive(Debug, Default)]
pub struct HttpBackend;

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn download(&self, item: &WorkItem, session: &Session) -> Result<()> {
        info!(url = item.locator(), path = %item.target.display(), "Downloading");
        fetch_to_file(session, item.locator(), &item.target).await?;
        Ok(())
    }
}

/// RTMP through `rtmpdump`
#[derive(Debug)]
pub struct RtmpBackend {
    program: String,
}

impl Default for RtmpBackend {
    fn default() -> Self {
        Self {
            program: "rtmpdump".to_string(),
        }
    }
}

impl RtmpBackend {
    pub fn args(item: &WorkItem) -> Vec<String> {
        let mut args = vec![
            "-r".to_string(),
            item.locator().to_string(),
            "-o".to_string(),
            item.target.to_string_lossy().into_owned(),
        ];
        if let Stream::Rtmp { params, .. } = &item.stream {
            for (key, value) in params {
                args.push(format!("--{}", key));
                args.push(value.clone());
            }
        }
        args
    }
}

#[async_trait]
impl Backend for RtmpBackend {
    fn name(&self) -> &'static str {
        "rtmpdump"
    }

    async fn download(&self, item: &WorkItem, _session: &Session) -> Result<()> {
        info!(url = item.locator(), path = %item.target.display(), "Downloading RTMP stream");
        run(&self.program, &Self::args(item)).await
    }
}

/// HLS and generic capture through `ffmpeg`
#[derive(Debug)]
pub struct CaptureBackend {
    program: String,
}

impl Default for CaptureBackend {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

impl CaptureBackend {
    pub fn args(item: &WorkItem) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            item.locator().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            item.target.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Backend for CaptureBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn download(&self, item: &WorkItem, _session: &Session) -> Result<()> {
        info!(url = item.locator(), path = %item.target.display(), "Capturing stream");
        run(&self.program, &Self::args(item)).await
    }

    /// Players read HLS directly, no capture needed
    async fn play(&self, item: &WorkItem, _session: &Session, player: &Player) -> Result<()> {
        player.launch(item.locator()).await
    }
}

/// External player command; `{}` or `%s` marks where the file goes
#[derive(Debug, Clone)]
pub struct Player {
    command: String,
}

impl Player {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Program and arguments with `target` substituted (or appended)
    pub fn command_line(&self, target: &str) -> Vec<String> {
        let mut substituted = false;
        let mut parts: Vec<String> = self
            .command
            .split_whitespace()
            .map(|word| {
                if word.contains("{}") || word.contains("%s") {
                    substituted = true;
                    word.replace("{}", target).replace("%s", target)
                } else {
                    word.to_string()
                }
            })
            .collect();

        if !substituted {
            parts.push(target.to_string());
        }
        parts
    }

    pub async fn launch(&self, target: &str) -> Result<()> {
        let parts = self.command_line(target);
        let Some((program, args)) = parts.split_first() else {
            return Err(TransportError::Spawn {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty player command"),
            });
        };
        info!(program = %program, target, "Starting player");
        run(program, args).await
    }
}

/// Backend per transport kind
#[derive(Clone)]
pub struct Backends {
    by_kind: BTreeMap<TransportKind, Arc<dyn Backend>>,
}

impl Backends {
    pub fn empty() -> Self {
        Self {
            by_kind: BTreeMap::new(),
        }
    }

    /// HTTP through reqwest, RTMP through rtmpdump, HLS and ffmpeg through ffmpeg
    pub fn standard() -> Self {
        let capture: Arc<dyn Backend> = Arc::new(CaptureBackend::default());
        let mut backends = Self::empty();
        backends.insert(TransportKind::Http, Arc::new(HttpBackend));
        backends.insert(TransportKind::Rtmp, Arc::new(RtmpBackend::default()));
        backends.insert(TransportKind::Hls, capture.clone());
        backends.insert(TransportKind::Ffmpeg, capture);
        backends
    }

    pub fn insert(&mut self, kind: TransportKind, backend: Arc<dyn Backend>) {
        self.by_kind.insert(kind, backend);
    }

    pub fn get(&self, kind: TransportKind) -> Result<Arc<dyn Backend>> {
        self.by_kind
            .get(&kind)
            .cloned()
            .ok_or(TransportError::Unsupported(kind))
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::standard()
    }
}
