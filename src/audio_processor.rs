//! # Audio Processing Module
//!
//! Questo modulo gestisce la transcodifica delle tracce audio del bundle.
//!
//! ## Responsabilità:
//! - Transcodifica con FFmpeg al bitrate del livello scelto
//! - Scrittura su un file temporaneo fratello dell'originale
//! - Sostituzione atomica dell'originale solo in caso di successo
//! - Limite di tempo per singolo file (processo terminato allo scadere)
//!
//! ## Comando:
//! ```text
//! ffmpeg -y -nostdin -loglevel error -i <input> -c:a libvorbis -b:a <bitrate> <tmp>
//! ```
//!
//! ## Garanzie in caso di errore:
//! - Exit code non zero, binario mancante o timeout → `AdapterError`
//! - Il file temporaneo viene rimosso, l'originale non viene toccato
//!
//! ## Dipendenze richieste:
//! - `ffmpeg` (nel `PATH`, in `TOOLS_DIR`, oppure `Config::ffmpeg_path`)

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::args;
use crate::config::Config;
use crate::error::{AdapterError, OptimizeError};
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handles audio transcoding through ffmpeg
#[derive(Debug, Clone)]
pub struct AudioProcessor {
    ffmpeg: PathBuf,
    codec: String,
    timeout: Duration,
}

impl AudioProcessor {
    pub fn new(config: &Config) -> Self {
        let ffmpeg = config
            .ffmpeg_path
            .clone()
            .unwrap_or_else(|| PlatformCommands::instance().resolve_tool("ffmpeg"));

        Self {
            ffmpeg,
            codec: config.audio_codec.clone(),
            timeout: config.audio_timeout(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Transcode `path` in place at `bitrate`
    pub fn reencode(&self, path: &Path, bitrate: &str) -> Result<(), AdapterError> {
        let parent = path
            .parent()
            .ok_or_else(|| AdapterError::UnsupportedFormat(format!("no parent directory: {}", path.display())))?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .ok_or_else(|| AdapterError::UnsupportedFormat(format!("no extension: {}", path.display())))?;

        // ffmpeg picks the muxer from the extension
        let temp = tempfile::Builder::new()
            .prefix(".transcode-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(parent)?;

        debug!("Transcoding {} (codec: {}, bitrate: {})", path.display(), self.codec, bitrate);
        let start_time = Instant::now();

        // a file never fills up like a pipe, so a chatty ffmpeg cannot stall
        let mut stderr_log = tempfile::tempfile()?;

        let mut child = Command::new(&self.ffmpeg)
            .args(args!["-y", "-nostdin", "-loglevel", "error", "-i"])
            .arg(path)
            .args(args!["-c:a", &self.codec, "-b:a", bitrate])
            .arg(temp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_log.try_clone()?))
            .spawn()
            .map_err(|e| AdapterError::FFmpeg(format!("failed to execute {}: {}", self.ffmpeg.display(), e)))?;

        let status = self.wait_with_deadline(&mut child)?;

        if !status.success() {
            let mut stderr = String::new();
            if stderr_log.seek(SeekFrom::Start(0)).is_ok() {
                let _ = stderr_log.read_to_string(&mut stderr);
            }
            return Err(AdapterError::FFmpeg(format!("{} ({})", stderr.trim(), status)));
        }

        FileManager::replace_file(path, temp)?;
        debug!("Transcoded {} in {:.1}s", path.display(), start_time.elapsed().as_secs_f64());
        Ok(())
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, AdapterError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdapterError::Timeout(self.timeout.as_secs()));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Check that the configured ffmpeg can be found
    pub async fn check_dependencies(&self) -> Result<(), OptimizeError> {
        let available = if self.ffmpeg.is_absolute() {
            self.ffmpeg.is_file()
        } else {
            PlatformCommands::instance()
                .is_command_available(&self.ffmpeg.to_string_lossy())
                .await
        };

        if available {
            Ok(())
        } else {
            Err(OptimizeError::MissingDependency(format!(
                "{} is required for audio processing",
                self.ffmpeg.display()
            )))
        }
    }
}
