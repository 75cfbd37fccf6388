use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::TOOL_NAME;
use crate::error::ProcessError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How to reach gallery-dl: the executable itself, or the Python module as a
/// fallback when the executable is not on PATH.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    /// Inserted before the caller's arguments in the direct form.
    pub program_args: Vec<String>,
    pub module: String,
    /// Interpreters tried, in order, for `<runtime> -m <module>`.
    pub runtimes: Vec<String>,
}

impl Default for ToolInvocation {
    fn default() -> Self {
        Self {
            program: TOOL_NAME.to_string(),
            program_args: Vec::new(),
            module: "gallery_dl".to_string(),
            runtimes: vec!["python3".to_string(), "python".to_string()],
        }
    }
}

/// Which form of the tool actually started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Executable,
    Module,
}

/// Captured result of a bounded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub invocation: Invocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    pub version: String,
    pub invocation: Invocation,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Result of polling a running process for its next output line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Pending,
    Closed,
}

impl ToolInvocation {
    /// Starts the tool with stdout and stderr merged into one line stream.
    pub fn spawn(&self, args: &[String]) -> Result<ProcessHandle, ProcessError> {
        let (mut child, _) = self.spawn_with_fallback(args)?;
        let (tx, rx) = mpsc::channel();

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx.clone());
        }
        drop(tx);

        Ok(ProcessHandle {
            child: Arc::new(Mutex::new(child)),
            lines: rx,
        })
    }

    /// Runs the tool to completion, killing it if it outlives `timeout`.
    pub fn run_with_timeout(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> Result<ToolOutput, ProcessError> {
        let (mut child, invocation) = self.spawn_with_fallback(args)?;
        let stdout = child.stdout.take().map(collect_output);
        let stderr = child.stderr.take().map(collect_output);

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    log::debug!("kill after timeout failed: {}", e);
                }
                let _ = child.wait();
                return Err(ProcessError::Timeout {
                    seconds: timeout.as_secs_f64(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let join = |reader: Option<thread::JoinHandle<String>>| {
            reader
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default()
        };

        Ok(ToolOutput {
            code: exit_code(status),
            stdout: join(stdout),
            stderr: join(stderr),
            invocation,
        })
    }

    /// `gallery-dl --version`, trimmed, along with the form that answered.
    pub fn version(&self, timeout: Duration) -> Result<ToolVersion, ProcessError> {
        let output = self.run_with_timeout(&["--version".to_string()], timeout)?;
        if !output.success() {
            return Err(ProcessError::NonZeroExit {
                program: self.program.clone(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(ToolVersion {
            version: output.stdout.trim().to_string(),
            invocation: output.invocation,
        })
    }

    fn spawn_with_fallback(&self, args: &[String]) -> Result<(Child, Invocation), ProcessError> {
        let mut direct = background_command(&self.program);
        direct.args(&self.program_args).args(args);

        match spawn_piped(&mut direct) {
            Ok(child) => {
                log::debug!("started {}", self.program);
                Ok((child, Invocation::Executable))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let runtime = self.resolve_runtime();
                log::info!(
                    "{} not found, retrying as {} -m {}",
                    self.program,
                    runtime,
                    self.module
                );
                let mut fallback = background_command(&runtime);
                fallback.arg("-m").arg(&self.module).args(args);
                spawn_piped(&mut fallback)
                    .map(|child| (child, Invocation::Module))
                    .map_err(|source| ProcessError::Spawn {
                        program: format!("{} -m {}", runtime, self.module),
                        source,
                    })
            }
            Err(source) => Err(ProcessError::Spawn {
                program: self.program.clone(),
                source,
            }),
        }
    }

    fn resolve_runtime(&self) -> String {
        self.runtimes
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|path| path.to_string_lossy().to_string())
            .or_else(|| self.runtimes.first().cloned())
            .unwrap_or_else(|| "python3".to_string())
    }
}

/// A running tool process. Output is read incrementally; the process can be
/// stopped from another thread through a [`Terminator`].
pub struct ProcessHandle {
    child: Arc<Mutex<Child>>,
    lines: Receiver<String>,
}

impl ProcessHandle {
    /// Remaining output lines. Blocks between lines and ends once both pipes
    /// are closed.
    #[cfg(test)]
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter()
    }

    pub fn next_line(&self, timeout: Duration) -> LineRead {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => LineRead::Line(line),
            Err(RecvTimeoutError::Timeout) => LineRead::Pending,
            Err(RecvTimeoutError::Disconnected) => LineRead::Closed,
        }
    }

    /// Blocks until the process exits. The child lock is only held for each
    /// `try_wait` so that termination can still get through.
    pub fn wait(&self) -> Result<i32, ProcessError> {
        loop {
            if let Some(status) = lock_child(&self.child).try_wait()? {
                return Ok(exit_code(status));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn terminator(&self) -> Terminator {
        Terminator {
            child: Arc::clone(&self.child),
        }
    }

    pub fn terminate(&self) {
        self.terminator().terminate();
    }
}

#[derive(Clone)]
pub struct Terminator {
    child: Arc<Mutex<Child>>,
}

impl Terminator {
    /// Best effort; failures are only logged.
    pub fn terminate(&self) {
        let mut child = lock_child(&self.child);
        if let Err(e) = child.kill() {
            log::debug!("terminate pid {} failed: {}", child.id(), e);
        }
    }
}

fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_piped(cmd: &mut Command) -> std::io::Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

fn forward_lines(pipe: impl Read + Send + 'static, tx: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn collect_output(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).to_string()
    })
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .unwrap_or_else(|| -status.signal().unwrap_or(1))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn background_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    hide_console_window(&mut cmd);
    cmd
}

#[cfg(windows)]
fn hide_console_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_cmd: &mut Command) {}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::path::Path;

    use super::ToolInvocation;

    /// Runs `script` through `/bin/sh` in place of gallery-dl.
    pub fn shell_tool(dir: &Path, script: &str) -> ToolInvocation {
        let path = dir.join("fake-gallery-dl.sh");
        std::fs::write(&path, script).unwrap();
        ToolInvocation {
            program: "/bin/sh".to_string(),
            program_args: vec![path.to_string_lossy().to_string()],
            module: "gallery_dl".to_string(),
            runtimes: vec!["definitely-not-a-python".to_string()],
        }
    }
}
