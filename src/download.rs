use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::classifier::{analyze_context, describe};
use crate::command::{build_command, display_command, test_arguments};
use crate::error::{ProcessError, RequestError};
use crate::models::{Activity, AppEvent, Settings};
use crate::process::{Invocation, LineRead, Terminator, ToolInvocation};

const RELAY_POLL: Duration = Duration::from_millis(100);
const SAMPLE_LINES: usize = 5;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub tool: ToolInvocation,
    pub test_timeout: Duration,
    pub version_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tool: ToolInvocation::default(),
            test_timeout: Duration::from_secs(30),
            version_timeout: Duration::from_secs(5),
        }
    }
}

type ProcessSlot = Arc<Mutex<Option<Terminator>>>;

/// Runs URL tests and downloads on worker threads, one at a time, and hands
/// their events to the interface through [`DownloadController::drain_events`].
///
/// All methods are meant to be called from the interface thread. State only
/// returns to [`Activity::Idle`] when the matching terminal event is drained.
pub struct DownloadController {
    config: ControllerConfig,
    activity: Activity,
    stop_requested: Arc<AtomicBool>,
    active_process: ProcessSlot,
    event_tx: Sender<AppEvent>,
    event_rx: Receiver<AppEvent>,
}

impl DownloadController {
    pub fn new(config: ControllerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            config,
            activity: Activity::Idle,
            stop_requested: Arc::new(AtomicBool::new(false)),
            active_process: Arc::new(Mutex::new(None)),
            event_tx,
            event_rx,
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_testing(&self) -> bool {
        self.activity == Activity::Testing
    }

    pub fn is_downloading(&self) -> bool {
        self.activity == Activity::Downloading
    }

    /// A stop was requested and the worker has not reported back yet.
    pub fn is_stopping(&self) -> bool {
        self.is_downloading() && self.stop_requested.load(Ordering::SeqCst)
    }

    /// Dry-runs `url` with `--simulate` on a worker thread.
    pub fn request_test(&mut self, url: &str) -> Result<(), RequestError> {
        if self.activity != Activity::Idle {
            return Err(RequestError::Busy);
        }

        let url = url.trim().to_string();
        if url.is_empty() {
            self.emit(AppEvent::error(RequestError::EmptyUrl.to_string()));
            return Err(RequestError::EmptyUrl);
        }

        self.activity = Activity::Testing;
        self.emit(AppEvent::status("Testing URL..."));
        self.emit(AppEvent::log(format!("Testing URL: {}", url)));
        log::info!("testing {}", url);

        let tool = self.config.tool.clone();
        let timeout = self.config.test_timeout;
        let tx = self.event_tx.clone();
        thread::spawn(move || {
            run_guarded(&tx, AppEvent::TestFinished, || {
                test_worker(&tool, &url, timeout, &tx)
            });
        });
        Ok(())
    }

    /// Starts gallery-dl for the current settings. Records the URL in the
    /// history once the request is accepted.
    pub fn request_download(&mut self, settings: &mut Settings) -> Result<(), RequestError> {
        if self.activity != Activity::Idle {
            return Err(RequestError::Busy);
        }

        let Some(cmd) = build_command(settings) else {
            self.emit(AppEvent::error(RequestError::EmptyUrl.to_string()));
            return Err(RequestError::EmptyUrl);
        };

        let download_path = PathBuf::from(settings.download_path.trim());
        if let Err(err) = ensure_directory(&download_path) {
            self.emit(AppEvent::error(err.to_string()));
            return Err(err);
        }

        let url = settings.url.trim().to_string();
        settings.add_url_to_history(&url);

        self.activity = Activity::Downloading;
        self.stop_requested = Arc::new(AtomicBool::new(false));
        self.emit(AppEvent::status("Downloading..."));
        self.emit(AppEvent::DownloadStarted);

        let job = DownloadJob {
            tool: self.config.tool.clone(),
            cmd,
            tx: self.event_tx.clone(),
            stop_requested: Arc::clone(&self.stop_requested),
            active_process: Arc::clone(&self.active_process),
        };
        thread::spawn(move || {
            let tx = job.tx.clone();
            run_guarded(&tx, AppEvent::DownloadFinished, || job.run());
        });
        Ok(())
    }

    /// Asks the running download to stop. Does nothing when no download is
    /// active or a stop is already pending. The worker reports the stop itself,
    /// so nothing follows a `DownloadFinished` that is already queued.
    pub fn request_stop(&mut self) {
        if !self.is_downloading() || self.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        log::info!("stop requested");
        if let Some(terminator) = self.take_process() {
            terminator.terminate();
        }
    }

    /// Everything queued so far, oldest first. Terminal events move the
    /// controller back to idle as they pass through.
    pub fn drain_events(&mut self) -> Vec<AppEvent> {
        let events: Vec<AppEvent> = self.event_rx.try_iter().collect();
        for event in &events {
            match event {
                AppEvent::TestFinished if self.activity == Activity::Testing => {
                    self.activity = Activity::Idle;
                }
                AppEvent::DownloadFinished if self.activity == Activity::Downloading => {
                    self.take_process();
                    self.activity = Activity::Idle;
                }
                _ => {}
            }
        }
        events
    }

    /// Reports the installed gallery-dl version, or how to install it, as a
    /// log event.
    pub fn check_installation(&self) {
        let tool = self.config.tool.clone();
        let timeout = self.config.version_timeout;
        let tx = self.event_tx.clone();
        thread::spawn(move || {
            let message = match tool.version(timeout) {
                Ok(found) => match found.invocation {
                    Invocation::Executable => format!("gallery-dl found: {}", found.version),
                    Invocation::Module => {
                        format!("gallery-dl found (Python module): {}", found.version)
                    }
                },
                Err(e) => {
                    log::warn!("gallery-dl version check failed: {}", e);
                    "gallery-dl not found. Please install it first: pip install gallery-dl"
                        .to_string()
                }
            };
            let _ = tx.send(AppEvent::Log(message));
        });
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    fn take_process(&self) -> Option<Terminator> {
        self.active_process
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn ensure_directory(path: &Path) -> Result<(), RequestError> {
    if path.as_os_str().is_empty() {
        return Err(RequestError::EmptyDownloadPath);
    }
    std::fs::create_dir_all(path).map_err(|source| RequestError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs `work` and always follows it with `terminal`, turning a panic into an
/// error event on the way.
fn run_guarded(tx: &Sender<AppEvent>, terminal: AppEvent, work: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
        let message = panic_message(payload.as_ref());
        log::error!("worker panicked: {}", message);
        let _ = tx.send(AppEvent::Error(format!("Unexpected error: {}", message)));
    }
    let _ = tx.send(terminal);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn test_worker(tool: &ToolInvocation, url: &str, timeout: Duration, tx: &Sender<AppEvent>) {
    let send = |event: AppEvent| {
        let _ = tx.send(event);
    };
    let host = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string());

    let output = match tool.run_with_timeout(&test_arguments(url), timeout) {
        Ok(output) => output,
        Err(ProcessError::Timeout { .. }) => {
            send(AppEvent::error(
                "Test timeout - URL may be slow to respond or invalid",
            ));
            send(AppEvent::status("URL test failed"));
            return;
        }
        Err(e) => {
            send(AppEvent::log(format!("Test error: {}", e)));
            send(AppEvent::status("URL test error"));
            return;
        }
    };

    if output.success() {
        send(AppEvent::log(format!(
            "URL test successful for {} - gallery-dl can process this URL",
            host
        )));

        let lines: Vec<&str> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if !lines.is_empty() {
            send(AppEvent::log("Sample output:"));
            for line in lines.iter().take(SAMPLE_LINES) {
                send(AppEvent::log(format!("  {}", line)));
            }
            if lines.len() > SAMPLE_LINES {
                send(AppEvent::log(format!(
                    "  ... and {} more lines",
                    lines.len() - SAMPLE_LINES
                )));
            }
        }
        send(AppEvent::status("URL test successful"));
    } else {
        let all_output: Vec<&str> = output
            .stdout
            .lines()
            .chain(output.stderr.lines())
            .collect();
        send(AppEvent::log(format!(
            "URL test failed for {} (exit code: {})",
            host, output.code
        )));
        send(AppEvent::log(format!("Reason: {}", describe(output.code))));
        if let Some(context) = analyze_context(&all_output, output.code) {
            send(AppEvent::log(format!("Context: {}", context)));
        }
        send(AppEvent::status("URL test failed"));
    }
}

/// Snapshot of everything a download worker needs; nothing here is shared
/// with the settings the interface keeps editing.
struct DownloadJob {
    tool: ToolInvocation,
    cmd: Vec<String>,
    tx: Sender<AppEvent>,
    stop_requested: Arc<AtomicBool>,
    active_process: ProcessSlot,
}

impl DownloadJob {
    fn send(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }

    fn stopping(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn run(self) {
        self.send(AppEvent::log(format!(
            "Starting download: {}",
            display_command(&self.cmd)
        )));

        let handle = match self.tool.spawn(&self.cmd[1..]) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("download failed to start: {}", e);
                self.send(AppEvent::status("Download error"));
                self.send(AppEvent::log(format!("Error: {}", e)));
                return;
            }
        };

        *self
            .active_process
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle.terminator());
        // A stop that raced the spawn found no process to signal.
        if self.stopping() {
            handle.terminate();
        }

        let mut output_lines = Vec::new();
        let mut stopped = false;
        loop {
            if self.stopping() {
                stopped = true;
                break;
            }
            match handle.next_line(RELAY_POLL) {
                LineRead::Line(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        output_lines.push(line.to_string());
                        self.send(AppEvent::log(line));
                    }
                }
                LineRead::Pending => {}
                LineRead::Closed => break,
            }
        }
        if stopped {
            self.send(AppEvent::log("Download stopped by user"));
        }

        let exit_code = match handle.wait() {
            Ok(code) => code,
            Err(e) => {
                self.send(AppEvent::status("Download error"));
                self.send(AppEvent::log(format!("Error: {}", e)));
                return;
            }
        };
        log::info!("gallery-dl exited with code {}", exit_code);

        if exit_code == 0 {
            self.send(AppEvent::status("Download completed successfully"));
            self.send(AppEvent::log("Download completed"));
            return;
        }

        self.send(AppEvent::status("Download failed"));
        self.send(AppEvent::log(format!(
            "Download failed (exit code: {})",
            exit_code
        )));
        self.send(AppEvent::log(format!("  Reason: {}", describe(exit_code))));
        if let Some(context) = analyze_context(&output_lines, exit_code) {
            self.send(AppEvent::log(format!("  Context: {}", context)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_panic_becomes_error_then_terminal() {
        let (tx, rx) = mpsc::channel();
        run_guarded(&tx, AppEvent::DownloadFinished, || panic!("boom"));

        let events: Vec<AppEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                AppEvent::Error("Unexpected error: boom".to_string()),
                AppEvent::DownloadFinished,
            ]
        );
    }

    #[test]
    fn empty_url_download_is_rejected_without_side_effects() {
        let mut controller = DownloadController::new(ControllerConfig::default());
        let mut settings = Settings {
            url: "   ".to_string(),
            ..Default::default()
        };

        let result = controller.request_download(&mut settings);
        assert!(matches!(result, Err(RequestError::EmptyUrl)));
        assert_eq!(controller.activity(), Activity::Idle);
        assert!(settings.url_history.is_empty());
        assert_eq!(
            controller.drain_events(),
            vec![AppEvent::Error("Please enter a URL".to_string())]
        );
    }

    #[test]
    fn empty_url_test_is_rejected() {
        let mut controller = DownloadController::new(ControllerConfig::default());

        assert!(matches!(
            controller.request_test(""),
            Err(RequestError::EmptyUrl)
        ));
        assert!(!controller.is_testing());
        assert_eq!(
            controller.drain_events(),
            vec![AppEvent::Error("Please enter a URL".to_string())]
        );
    }

    #[test]
    fn blank_download_path_is_rejected() {
        let mut controller = DownloadController::new(ControllerConfig::default());
        let mut settings = Settings {
            url: "https://example.com/a".to_string(),
            download_path: "  ".to_string(),
            ..Default::default()
        };

        let result = controller.request_download(&mut settings);
        assert!(matches!(result, Err(RequestError::EmptyDownloadPath)));
        assert_eq!(controller.activity(), Activity::Idle);
        assert!(settings.url_history.is_empty());
        assert_eq!(
            controller.drain_events(),
            vec![AppEvent::Error("Please choose a download folder".to_string())]
        );
    }

    #[test]
    fn unusable_download_directory_fails_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut controller = DownloadController::new(ControllerConfig::default());
        let mut settings = Settings {
            url: "https://example.com/a".to_string(),
            download_path: blocker.join("sub").to_string_lossy().to_string(),
            ..Default::default()
        };

        let result = controller.request_download(&mut settings);
        assert!(matches!(result, Err(RequestError::CreateDirectory { .. })));
        assert_eq!(controller.activity(), Activity::Idle);
        assert!(settings.url_history.is_empty());

        let events = controller.drain_events();
        assert_eq!(events.len(), 1);
        assert!(
            matches!(&events[0], AppEvent::Error(text) if text.starts_with("Cannot create download directory"))
        );
    }

    #[test]
    fn stop_without_download_is_a_no_op() {
        let mut controller = DownloadController::new(ControllerConfig::default());
        controller.request_stop();
        controller.request_stop();

        assert!(controller.drain_events().is_empty());
        assert_eq!(controller.activity(), Activity::Idle);
    }

    #[test]
    fn drain_on_empty_queue_returns_nothing() {
        let mut controller = DownloadController::new(ControllerConfig::default());
        assert!(controller.drain_events().is_empty());
        assert!(controller.drain_events().is_empty());
    }
}
