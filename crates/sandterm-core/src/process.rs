//! PTY-backed channel to a local shell.

use crate::transport::{ChannelEvent, Transport};
use crate::{ConsoleError, Result};
use portable_pty::{native_pty_system, Child as PtyChild, CommandBuilder, MasterPty, PtySize};
use sandterm_types::{ChannelAction, ChannelRequest};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Ctrl-C, delivered to the foreground process group by the line discipline.
const INTERRUPT: &[u8] = b"\x03";

/// Options for spawning the shell behind a console.
#[derive(Debug, Clone)]
pub struct PtyOptions {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub rows: u16,
    pub cols: u16,
    pub env: Vec<(String, String)>,
}

impl Default for PtyOptions {
    fn default() -> Self {
        Self {
            program: "/bin/sh".to_string(),
            args: Vec::new(),
            cwd: None,
            rows: 24,
            cols: 80,
            env: Vec::new(),
        }
    }
}

/// A shell running on a pseudo-terminal.
///
/// Output is read on a dedicated thread (PTY reads block) and forwarded as
/// [`ChannelEvent`]s on the receiver returned by [`PtyChannel::spawn`].
pub struct PtyChannel {
    writer: Option<Box<dyn Write + Send>>,
    /// Held so the PTY stays open until close.
    _master: Option<Box<dyn MasterPty + Send>>,
    child: Box<dyn PtyChild + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    closed: bool,
}

impl PtyChannel {
    pub fn spawn(opts: &PtyOptions) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        info!(target: "sandterm::process", "Spawning {} on a {}x{} PTY", opts.program, opts.cols, opts.rows);

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: opts.rows,
                cols: opts.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ConsoleError::PtyError(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&opts.program);
        cmd.args(&opts.args);
        for (key, value) in &opts.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &opts.cwd {
            cmd.cwd(cwd);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!(target: "sandterm::process", "Failed to spawn {}: {}", opts.program, e);
            ConsoleError::SpawnFailed(e.to_string())
        })?;
        // Only the child keeps the slave open, so EOF arrives when it exits.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ConsoleError::PtyError(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ConsoleError::PtyError(e.to_string()))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_for_thread = shutdown.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            debug!(target: "sandterm::process", "PTY reader thread started");

            loop {
                if shutdown_for_thread.load(Ordering::SeqCst) {
                    break;
                }

                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!(target: "sandterm::process", "PTY reader got EOF");
                        let _ = tx.send(ChannelEvent::Closed);
                        break;
                    }
                    Ok(n) => {
                        trace!(target: "sandterm::process", "PTY output ({} bytes)", n);
                        if tx.send(ChannelEvent::Output(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        if !shutdown_for_thread.load(Ordering::SeqCst) {
                            // Linux reports EIO on the master once the child side is gone.
                            if e.raw_os_error() == Some(libc::EIO) {
                                let _ = tx.send(ChannelEvent::Closed);
                            } else {
                                error!(target: "sandterm::process", "PTY read error: {}", e);
                                let _ = tx.send(ChannelEvent::Failed(e.to_string()));
                            }
                        }
                        break;
                    }
                }
            }

            debug!(target: "sandterm::process", "PTY reader thread exiting");
        });

        let channel = Self {
            writer: Some(writer),
            _master: Some(pair.master),
            child,
            shutdown,
            closed: false,
        };
        Ok((channel, rx))
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(ConsoleError::TransportClosed)?;
        let result = writer.write_all(data).and_then(|()| writer.flush());
        result.map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe => ConsoleError::TransportClosed,
            _ => ConsoleError::IoError(e),
        })
    }
}

impl Transport for PtyChannel {
    fn send(&mut self, request: &ChannelRequest) -> Result<()> {
        match request {
            ChannelRequest::Command { command } => {
                let mut line = Vec::with_capacity(command.len() + 1);
                line.extend_from_slice(command.as_bytes());
                line.push(b'\r');
                self.write_bytes(&line)
            }
            ChannelRequest::Action {
                action: ChannelAction::Terminate,
            } => self.write_bytes(INTERRUPT),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let pid = self.child.process_id();
        self.shutdown.store(true, Ordering::SeqCst);

        // Dropping the master unblocks the reader thread.
        self.writer = None;
        self._master = None;

        if let Err(e) = self.child.kill() {
            debug!(target: "sandterm::process", "Kill failed (already exited?): {}", e);
        }

        // Commands started from the shell live in its process group.
        #[cfg(unix)]
        if let Some(pid) = pid {
            debug!(target: "sandterm::process", "Sending SIGKILL to process group {}", pid);
            unsafe {
                libc::kill(-(pid as i32), libc::SIGKILL);
            }
        }
        #[cfg(not(unix))]
        let _ = pid;

        // SIGKILL cannot be caught, so waiting here returns promptly.
        let reaped = match self.child.try_wait() {
            Ok(Some(status)) => Ok(status),
            Ok(None) => self.child.wait(),
            Err(e) => Err(e),
        };
        match reaped {
            Ok(status) => debug!(target: "sandterm::process", "Shell reaped: {:?}", status),
            Err(e) => warn!(target: "sandterm::process", "Failed to reap shell: {}", e),
        }
        info!(target: "sandterm::process", "PTY channel closed");
    }
}

impl Drop for PtyChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn collect_until(
        rx: &mut mpsc::UnboundedReceiver<ChannelEvent>,
        needle: &str,
    ) -> String {
        let mut seen = String::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !seen.contains(needle) {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(ChannelEvent::Output(data))) => seen.push_str(&String::from_utf8_lossy(&data)),
                _ => break,
            }
        }
        seen
    }

    #[test]
    fn test_default_options() {
        let opts = PtyOptions::default();
        assert_eq!((opts.rows, opts.cols), (24, 80));
        assert!(opts.cwd.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires a real PTY
    async fn test_command_round_trip() {
        let (mut channel, mut rx) = PtyChannel::spawn(&PtyOptions::default()).unwrap();
        channel.send(&ChannelRequest::command("echo sandterm-ok")).unwrap();
        let output = collect_until(&mut rx, "sandterm-ok\r\n").await;
        assert!(output.contains("sandterm-ok"));

        channel.close();
        channel.close();
        assert!(matches!(
            channel.send(&ChannelRequest::terminate()),
            Err(ConsoleError::TransportClosed)
        ));
    }

    #[test]
    #[ignore] // Requires a real PTY
    fn test_close_reaps_shell() {
        let opts = PtyOptions {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..PtyOptions::default()
        };
        let (mut channel, _rx) = PtyChannel::spawn(&opts).unwrap();
        assert!(channel.child.try_wait().unwrap().is_none());

        channel.close();
        assert!(channel.child.try_wait().unwrap().is_some());
    }
}
