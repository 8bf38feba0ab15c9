//! A `MediaElement` backed by an external player process.
//!
//! The configured command is started with the media URL appended. On unix, pausing
//! suspends the process (SIGSTOP) and playing again resumes it (SIGCONT), so the position
//! survives a pause. Rewinding ends the process; the next `play` starts from the top.
//! A process that exits on its own reports `MediaSignal::Ended` for the cue it was
//! started with.
//!
//! Without a command, images are "shown" through the status line only, while video and
//! audio refuse to start. The controller treats that refusal like a blocked autoplay.

use super::config::PlayerCommand;
use super::errors::PlaybackError;
use super::media_deck::{MediaCue, MediaElement, MediaSignal};
use super::model::MediaKind;
use log::{debug, info, trace, warn};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

struct RunningPlayer {
    pid: Option<u32>,
    stop_tx: Option<oneshot::Sender<()>>,
    suspended: bool,
    /// Set by the watcher once the process has been reaped; its pid must not be signalled.
    exited: Arc<AtomicBool>,
}

impl RunningPlayer {
    fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The watcher is gone if the process already exited.
            let _ = tx.send(());
        }
    }
}

pub struct CommandElement {
    kind: MediaKind,
    command: Option<PlayerCommand>,
    signals: mpsc::UnboundedSender<MediaSignal>,
    cue: Option<MediaCue>,
    running: Option<RunningPlayer>,
    playing: bool,
}

impl CommandElement {
    pub fn new(kind: MediaKind, command: Option<PlayerCommand>, signals: mpsc::UnboundedSender<MediaSignal>) -> Self {
        Self { kind, command, signals, cue: None, running: None, playing: false }
    }

    /// Forgets a player whose process already ended on its own.
    fn clear_exited(&mut self) {
        if self.running.as_ref().map_or(false, RunningPlayer::has_exited) {
            debug!("{} player already exited; forgetting it", self.kind);
            self.running = None;
        }
    }

    fn stop_process(&mut self) {
        if let Some(running) = self.running.take() {
            debug!("Stopping {} player (pid {:?})", self.kind, running.pid);
            running.stop();
        }
    }

    fn spawn(&mut self, command: &PlayerCommand, cue: &MediaCue) -> Result<(), PlaybackError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .arg(&cue.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let pid = child.id();
        info!("Started {} player '{}' (pid {:?}) for {}", self.kind, command.program, pid, cue.url);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let signals = self.signals.clone();
        let kind = self.kind;
        let entry = cue.entry;
        let exited = Arc::new(AtomicBool::new(false));
        let watcher_exited = exited.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    watcher_exited.store(true, Ordering::SeqCst);
                    match status {
                        Ok(status) => debug!("{} player for entry {} exited: {}", kind, entry, status),
                        Err(e) => warn!("Waiting on {} player for entry {} failed: {}", kind, entry, e),
                    }
                    let _ = signals.send(MediaSignal::Ended { kind, entry });
                }
                _ = stop_rx => {
                    if let Err(e) = child.kill().await {
                        debug!("Killing {} player for entry {}: {}", kind, entry, e);
                    }
                }
            }
        });

        self.running = Some(RunningPlayer { pid, stop_tx: Some(stop_tx), suspended: false, exited });
        Ok(())
    }
}

#[cfg(unix)]
fn send_signal(pid: Option<u32>, signal: nix::sys::signal::Signal) -> Result<(), PlaybackError> {
    use nix::unistd::Pid;
    let pid = pid.ok_or_else(|| PlaybackError::Signal("player process has no pid".to_string()))?;
    let raw = i32::try_from(pid).map_err(|e| PlaybackError::Signal(e.to_string()))?;
    nix::sys::signal::kill(Pid::from_raw(raw), signal).map_err(|e| PlaybackError::Signal(e.to_string()))
}

impl MediaElement for CommandElement {
    fn load(&mut self, cue: MediaCue) {
        self.stop_process();
        trace!("{} element bound to {} (entry {})", self.kind, cue.url, cue.entry);
        self.cue = Some(cue);
        self.playing = false;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let cue = self
            .cue()
            .cloned()
            .ok_or_else(|| PlaybackError::AutoplayRejected(format!("no {} source loaded", self.kind)))?;

        let Some(command) = self.command.clone() else {
            if self.kind == MediaKind::Image {
                self.playing = true;
                return Ok(());
            }
            return Err(PlaybackError::AutoplayRejected(format!("no {} player configured", self.kind)));
        };

        let kind = self.kind;
        self.clear_exited();
        match self.running.as_mut() {
            None => self.spawn(&command, &cue)?,
            Some(running) => {
                if running.suspended {
                    #[cfg(unix)]
                    send_signal(running.pid, nix::sys::signal::Signal::SIGCONT)?;
                    running.suspended = false;
                    debug!("Resumed {} player (pid {:?})", kind, running.pid);
                } else {
                    trace!("{} player already running", kind);
                }
            }
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        self.clear_exited();
        let kind = self.kind;
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if running.suspended {
            return;
        }
        #[cfg(unix)]
        {
            match send_signal(running.pid, nix::sys::signal::Signal::SIGSTOP) {
                Ok(()) => {
                    running.suspended = true;
                    debug!("Suspended {} player (pid {:?})", kind, running.pid);
                }
                Err(e) => warn!("Could not suspend {} player: {}", kind, e),
            }
        }
        #[cfg(not(unix))]
        {
            debug!("Suspending is unsupported here; stopping {} player instead.", kind);
            self.stop_process();
        }
    }

    fn rewind(&mut self) {
        self.stop_process();
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn cue(&self) -> Option<&MediaCue> {
        self.cue.as_ref()
    }
}

impl Drop for CommandElement {
    fn drop(&mut self) {
        self.stop_process();
    }
}
