//! Backend process supervision

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

use super::shell::{check_program, shell_command, BackendLaunch};
use opsh_core::events::BackendEvent;
use opsh_core::prelude::*;

/// Capacity of the stdin line queue
const STDIN_QUEUE: usize = 64;

/// How long the wait task lets the readers drain after the child is gone.
/// A grandchild holding the pipes open would otherwise block `Exited`.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Supervises the single backend child process.
///
/// The `Child` handle is moved into a dedicated `wait_for_exit` task that
/// owns it until exit, so the real exit code is always reported as exactly one
/// `BackendEvent::Exited`. Reader tasks deliver stdout and stderr as complete
/// lines, in order, on the same event channel.
///
/// `BackendProcess` keeps a kill channel, an atomic exit flag for synchronous
/// checks, and a [`Notify`] so callers can await exit without polling.
pub struct BackendProcess {
    /// Sender for stdin lines
    stdin_tx: mpsc::Sender<String>,
    /// Process ID for logging
    pid: Option<u32>,
    /// One-shot sender that tells the wait task to kill the process.
    /// Consumed on first use (or on drop).
    kill_tx: Option<oneshot::Sender<()>>,
    /// Set to `true` by the wait task once the child has exited.
    exited: Arc<AtomicBool>,
    /// Notified by the wait task immediately after the child exits.
    exit_notify: Arc<Notify>,
}

impl BackendProcess {
    /// Spawn the backend described by `launch`.
    ///
    /// Must be called from within a tokio runtime. Events are sent to
    /// `event_tx` in the order they are read.
    pub fn spawn(launch: &BackendLaunch, event_tx: mpsc::Sender<BackendEvent>) -> Result<Self> {
        check_program(&launch.command, &launch.cwd)?;

        info!(
            "Spawning backend: {} (cwd: {})",
            launch.command,
            launch.cwd.display()
        );

        let child = shell_command(&launch.command)
            .current_dir(&launch.cwd)
            .envs(launch.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessSpawn {
                reason: e.to_string(),
            })?;

        let process = Self::supervise(child, event_tx)?;
        info!("Backend process started with PID: {:?}", process.pid);
        Ok(process)
    }

    /// Wire up reader, writer and wait tasks for a freshly spawned child.
    fn supervise(mut child: Child, event_tx: mpsc::Sender<BackendEvent>) -> Result<Self> {
        let pid = child.id();

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::process("backend stdin was not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process("backend stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process("backend stderr was not piped"))?;

        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(STDIN_QUEUE);
        tokio::spawn(Self::stdin_writer(stdin, stdin_rx));
        let readers = vec![
            tokio::spawn(Self::stdout_reader(stdout, event_tx.clone())),
            tokio::spawn(Self::stderr_reader(stderr, event_tx.clone())),
        ];

        let exited = Arc::new(AtomicBool::new(false));
        let exit_notify = Arc::new(Notify::new());
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(Self::wait_for_exit(
            child,
            readers,
            kill_rx,
            event_tx,
            Arc::clone(&exited),
            Arc::clone(&exit_notify),
        ));

        Ok(Self {
            stdin_tx,
            pid,
            kill_tx: Some(kill_tx),
            exited,
            exit_notify,
        })
    }

    /// Background task: owns `child`, waits for it to exit, emits `BackendEvent::Exited`.
    ///
    /// Two ways the task can end:
    /// 1. The backend exits on its own: `child.wait()` resolves.
    /// 2. `kill_rx` fires: we kill the child first, then wait for it.
    ///
    /// Either way the reader tasks are drained first, so `Exited` is always
    /// the last event of a generation.
    async fn wait_for_exit(
        mut child: Child,
        readers: Vec<JoinHandle<()>>,
        kill_rx: oneshot::Receiver<()>,
        event_tx: mpsc::Sender<BackendEvent>,
        exited: Arc<AtomicBool>,
        exit_notify: Arc<Notify>,
    ) {
        let code: Option<i32> = tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => {
                        info!("Backend process exited with status: {:?}", status);
                        status.code()
                    }
                    Err(e) => {
                        error!("Error waiting for backend process: {}", e);
                        None
                    }
                }
            }
            Ok(()) = kill_rx => {
                info!("Kill requested, terminating backend process");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill backend process: {}", e);
                }
                match child.wait().await {
                    Ok(status) => {
                        info!("Backend process killed, exit status: {:?}", status);
                        status.code()
                    }
                    Err(e) => {
                        error!("Error waiting after kill: {}", e);
                        None
                    }
                }
            }
        };

        let drained = tokio::time::timeout(READER_DRAIN_TIMEOUT, async {
            for reader in readers {
                let _ = reader.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("Backend output pipes still open after exit, not waiting further");
        }

        // has_exited() must be true before anyone observes the event
        exited.store(true, Ordering::Release);
        exit_notify.notify_waiters();

        debug!("Sending BackendEvent::Exited {{ code: {:?} }}", code);
        let _ = event_tx.send(BackendEvent::Exited { code }).await;
    }

    /// Read lines from stdout and send as `BackendEvent::Stdout`.
    ///
    /// Lines are sent one at a time with `send().await`, so a full event queue
    /// applies backpressure instead of reordering.
    async fn stdout_reader(stdout: tokio::process::ChildStdout, tx: mpsc::Sender<BackendEvent>) {
        let mut reader = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = reader.next_line().await {
            trace!("stdout: {}", line);

            if tx.send(BackendEvent::Stdout(line)).await.is_err() {
                debug!("stdout channel closed");
                break;
            }
        }

        debug!("stdout reader finished");
    }

    /// Read lines from stderr and send as `BackendEvent::Stderr`
    async fn stderr_reader(stderr: tokio::process::ChildStderr, tx: mpsc::Sender<BackendEvent>) {
        let mut reader = BufReader::new(stderr).lines();

        while let Ok(Some(line)) = reader.next_line().await {
            trace!("stderr: {}", line);

            if tx.send(BackendEvent::Stderr(line)).await.is_err() {
                debug!("stderr channel closed");
                break;
            }
        }

        debug!("stderr reader finished");
    }

    /// Write queued lines to stdin, each terminated by a newline
    async fn stdin_writer(mut stdin: tokio::process::ChildStdin, mut rx: mpsc::Receiver<String>) {
        while let Some(line) = rx.recv().await {
            debug!("Sending to backend: {}", line);

            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                error!("Failed to write to stdin: {}", e);
                break;
            }
            if let Err(e) = stdin.write_all(b"\n").await {
                error!("Failed to write newline: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                error!("Failed to flush stdin: {}", e);
                break;
            }
        }

        debug!("stdin writer finished");
    }

    /// Queue a protocol line for the backend's stdin.
    ///
    /// Any trailing line terminator is replaced by exactly one `\n`.
    pub async fn write(&self, line: &str) -> Result<()> {
        self.stdin_tx
            .send(line.trim_end_matches(['\r', '\n']).to_string())
            .await
            .map_err(|_| Error::channel_send("backend stdin channel closed"))
    }

    /// Kill the backend.
    ///
    /// A no-op when the process has already exited or a kill was already
    /// requested.
    pub fn kill(&mut self) {
        if self.has_exited() {
            debug!("Backend already exited, nothing to kill");
            return;
        }
        if let Some(tx) = self.kill_tx.take() {
            warn!("Killing backend process {:?}", self.pid);
            // The wait task may have finished in the meantime
            let _ = tx.send(());
        }
    }

    /// Wait until the process has exited, up to `limit`.
    ///
    /// Returns `true` if the process is gone.
    pub async fn wait_for_exit_timeout(&self, limit: Duration) -> bool {
        // Register interest before the final check so a notification that
        // fires in between is not lost.
        let notified = self.exit_notify.notified();
        if self.has_exited() {
            return true;
        }

        match tokio::time::timeout(limit, notified).await {
            Ok(()) => true,
            Err(_) => self.has_exited(),
        }
    }

    /// Kill the backend and wait for it to be reaped.
    pub async fn terminate(&mut self, limit: Duration) -> bool {
        self.kill();
        let gone = self.wait_for_exit_timeout(limit).await;
        if !gone {
            warn!(
                "Backend process {:?} did not exit within {:?}",
                self.pid, limit
            );
        }
        gone
    }

    /// Check if the process has already exited.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Check if the process is still running.
    pub fn is_running(&self) -> bool {
        !self.has_exited()
    }

    /// Get the process ID
    pub fn id(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for BackendProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            warn!("BackendProcess dropped while process may still be running");
            if let Some(tx) = self.kill_tx.take() {
                let _ = tx.send(());
            }
        }
        // kill_on_drop(true) on the Child is the final safety net
        debug!("BackendProcess dropped");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn launch(command: &str) -> BackendLaunch {
        BackendLaunch::new(command, std::env::temp_dir())
    }

    /// Drain events until `Exited`, collecting everything seen on the way.
    async fn collect_until_exit(rx: &mut mpsc::Receiver<BackendEvent>) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        for _ in 0..100 {
            match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
                Ok(Some(event)) => {
                    let done = matches!(event, BackendEvent::Exited { .. });
                    events.push(event);
                    if done {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => continue,
            }
        }
        events
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_fatal() {
        let (tx, _rx) = mpsc::channel(16);
        let result = BackendProcess::spawn(&launch("opsh-no-such-backend --x"), tx);

        let err = result.err().expect("spawn should fail");
        assert!(matches!(err, Error::BackendNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_stdout_lines_arrive_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let _process =
            BackendProcess::spawn(&launch("printf 'C1\\nC2\\nC3\\n'"), tx).expect("spawn");

        let stdout: Vec<String> = collect_until_exit(&mut rx)
            .await
            .into_iter()
            .filter_map(|e| match e {
                BackendEvent::Stdout(line) => Some(line),
                _ => None,
            })
            .collect();

        assert_eq!(stdout, vec!["C1", "C2", "C3"]);
    }

    #[tokio::test]
    async fn test_stderr_is_delivered_separately() {
        let (tx, mut rx) = mpsc::channel(16);
        let _process = BackendProcess::spawn(&launch("echo oops 1>&2"), tx).expect("spawn");

        let events = collect_until_exit(&mut rx).await;
        assert!(events.contains(&BackendEvent::Stderr("oops".to_string())));
        assert!(!events
            .iter()
            .any(|e| matches!(e, BackendEvent::Stdout(_))));
    }

    #[tokio::test]
    async fn test_exit_code_captured() {
        let (tx, mut rx) = mpsc::channel(16);
        let process = BackendProcess::spawn(&launch("exit 42"), tx).expect("spawn");

        let events = collect_until_exit(&mut rx).await;
        assert_eq!(
            events.last(),
            Some(&BackendEvent::Exited { code: Some(42) })
        );
        assert!(process.has_exited());
        assert!(!process.is_running());
    }

    #[tokio::test]
    async fn test_exactly_one_exited_event() {
        let (tx, mut rx) = mpsc::channel(32);
        let _process = BackendProcess::spawn(&launch("true"), tx).expect("spawn");

        let mut exited = 0usize;
        let deadline = tokio::time::sleep(Duration::from_millis(500));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(BackendEvent::Exited { .. }) => exited += 1,
                    Some(_) => {}
                    None => break,
                },
                _ = &mut deadline => break,
            }
        }

        assert_eq!(exited, 1);
    }

    #[tokio::test]
    async fn test_write_reaches_stdin() {
        let (tx, mut rx) = mpsc::channel(16);
        let process = BackendProcess::spawn(&launch("head -n 1"), tx).expect("spawn");

        process.write("ping value=1\n").await.expect("write");

        let events = collect_until_exit(&mut rx).await;
        assert!(events.contains(&BackendEvent::Stdout("ping value=1".to_string())));
    }

    #[tokio::test]
    async fn test_launch_env_reaches_backend() {
        let (tx, mut rx) = mpsc::channel(16);
        let launch = launch("echo \"$OPSH_TEST_VALUE\"").with_env("OPSH_TEST_VALUE", "a&b");
        let _process = BackendProcess::spawn(&launch, tx).expect("spawn");

        let events = collect_until_exit(&mut rx).await;
        assert!(events.contains(&BackendEvent::Stdout("a&b".to_string())));
    }

    #[tokio::test]
    async fn test_terminate_kills_long_running_process() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut process = BackendProcess::spawn(&launch("sleep 60"), tx).expect("spawn");
        assert!(process.is_running());

        assert!(process.terminate(Duration::from_secs(5)).await);
        assert!(process.has_exited());

        let events = collect_until_exit(&mut rx).await;
        assert!(matches!(events.last(), Some(BackendEvent::Exited { .. })));
    }

    #[tokio::test]
    async fn test_kill_after_exit_is_noop() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut process = BackendProcess::spawn(&launch("true"), tx).expect("spawn");
        collect_until_exit(&mut rx).await;

        process.kill();
        process.kill();
        assert!(process.wait_for_exit_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_double_kill_is_idempotent() {
        let (tx, _rx) = mpsc::channel(16);
        let mut process = BackendProcess::spawn(&launch("sleep 60"), tx).expect("spawn");

        process.kill();
        process.kill();
        assert!(process.wait_for_exit_timeout(Duration::from_secs(5)).await);
    }
}
