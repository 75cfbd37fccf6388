use eframe::egui;
use rfd::FileDialog;
use std::path::Path;
use std::time::Duration;

use crate::download::{ControllerConfig, DownloadController};
use crate::localizations::Localizations;
use crate::models::{AppEvent, Settings};
use crate::preview::{self, SitePreview};
use crate::settings_store::SettingsStore;
use crate::sites::{self, SiteRegistry};
use crate::theme;
use crate::ui::{self, Busy, SitesView, UiAction};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One method per thing the user can ask the shell to do.
pub trait ShellCommands {
    fn test_url(&mut self);
    fn browse_folder(&mut self);
    fn start_download(&mut self);
    fn stop_download(&mut self);
    fn save_settings(&mut self);
    fn reset_settings(&mut self);
    fn open_download_folder(&mut self);
    fn open_site(&mut self, url: &str);
    fn clear_log(&mut self);
}

impl UiAction {
    pub fn dispatch(self, shell: &mut impl ShellCommands) {
        match self {
            UiAction::TestUrl => shell.test_url(),
            UiAction::BrowseFolder => shell.browse_folder(),
            UiAction::StartDownload => shell.start_download(),
            UiAction::StopDownload => shell.stop_download(),
            UiAction::SaveSettings => shell.save_settings(),
            UiAction::ResetSettings => shell.reset_settings(),
            UiAction::OpenDownloadFolder => shell.open_download_folder(),
            UiAction::OpenSite(url) => shell.open_site(&url),
            UiAction::ClearLog => shell.clear_log(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Download,
    Advanced,
    Sites,
}

pub struct GalleryDlApp {
    settings: Settings,
    store: Option<SettingsStore>,
    controller: DownloadController,
    sites: SiteRegistry,
    preview: Box<dyn SitePreview>,
    localizer: Localizations,
    tab: Tab,
    log: Vec<String>,
    status: String,
    error: Option<String>,
    confirm_reset: bool,
    sites_view: SitesView,
}

impl GalleryDlApp {
    pub fn new(
        store: Option<SettingsStore>,
        controller: DownloadController,
        sites: SiteRegistry,
        preview: Box<dyn SitePreview>,
    ) -> Self {
        let localizer = Localizations::new();
        let settings = store.as_ref().map(SettingsStore::load).unwrap_or_default();
        let status = localizer.text("status-ready").to_string();
        log::info!("interface language: {}", localizer.current_language());

        controller.check_installation();

        Self {
            settings,
            store,
            controller,
            sites,
            preview,
            localizer,
            tab: Tab::Download,
            log: Vec::new(),
            status,
            error: None,
            confirm_reset: false,
            sites_view: SitesView::default(),
        }
    }

    /// Production wiring: settings in the home directory, the site list next
    /// to the binary, gallery-dl from PATH.
    pub fn from_environment() -> Self {
        let store = match SettingsStore::in_home_dir() {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("settings will not be persisted: {}", e);
                None
            }
        };

        let mut registry = SiteRegistry::new();
        let source = registry.initialize(sites::default_markdown_path().as_deref());
        log::info!("{} supported sites loaded ({:?})", registry.sites().len(), source);

        Self::new(
            store,
            DownloadController::new(ControllerConfig::default()),
            registry,
            preview::resolve(),
        )
    }

    fn busy(&self) -> Busy {
        Busy {
            testing: self.controller.is_testing(),
            downloading: self.controller.is_downloading(),
            stopping: self.controller.is_stopping(),
        }
    }

    fn log_message(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > theme::MAX_LOG_LINES {
            let excess = self.log.len() - theme::MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(line) => self.log_message(line),
            AppEvent::StatusChanged(status) => self.status = status,
            AppEvent::Error(message) => {
                self.log_message(format!("Error: {}", message));
                self.error = Some(message);
            }
            AppEvent::TestFinished => {
                if !self.controller.is_downloading() {
                    self.status = self.localizer.text("status-ready").to_string();
                }
            }
            AppEvent::DownloadStarted | AppEvent::DownloadFinished => {}
        }
    }

    fn process_events(&mut self) -> bool {
        let events = self.controller.drain_events();
        let any = !events.is_empty();
        for event in events {
            self.handle_event(event);
        }
        any
    }

    fn render_download_tab(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let busy = self.busy();
        ui.add_space(8.0);
        ui::render_url_input(ui, &mut self.settings, busy, &self.localizer, actions);
        ui.add_space(12.0);
        ui::render_download_dir_selector(ui, &mut self.settings, &self.localizer, actions);
        ui.add_space(12.0);
        ui::render_download_buttons(ui, busy, &self.localizer, actions);
        ui.add_space(12.0);
        ui::render_log(ui, &self.log, &self.localizer, actions);
    }
}

impl ShellCommands for GalleryDlApp {
    fn test_url(&mut self) {
        let url = self.settings.url.clone();
        if let Err(e) = self.controller.request_test(&url) {
            log::debug!("test not started: {}", e);
        }
    }

    fn browse_folder(&mut self) {
        let current = Path::new(&self.settings.download_path);
        let start = if current.is_dir() {
            current.to_path_buf()
        } else {
            current
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| Path::new(".").to_path_buf())
        };
        if let Some(folder) = FileDialog::new().set_directory(start).pick_folder() {
            self.settings.download_path = folder.to_string_lossy().to_string();
        }
    }

    fn start_download(&mut self) {
        if let Err(e) = self.controller.request_download(&mut self.settings) {
            log::debug!("download not started: {}", e);
        }
    }

    fn stop_download(&mut self) {
        self.controller.request_stop();
    }

    fn save_settings(&mut self) {
        let Some(store) = &self.store else {
            self.error = Some("Failed to save settings: no settings location".to_string());
            return;
        };
        match store.save(&self.settings) {
            Ok(()) => {
                log::info!("settings saved to {}", store.path().display());
                let saved = self.localizer.text("settings-saved").to_string();
                self.log_message(saved);
            }
            Err(e) => {
                log::warn!("failed to save settings: {}", e);
                self.error = Some(format!("Failed to save settings: {}", e));
            }
        }
    }

    fn reset_settings(&mut self) {
        self.confirm_reset = true;
    }

    fn open_download_folder(&mut self) {
        let folder = self.settings.download_path.trim().to_string();
        if !Path::new(&folder).is_dir() {
            self.error = Some(format!("Folder does not exist: {}", folder));
            return;
        }
        if let Err(e) = self.preview.open(&folder) {
            self.error = Some(format!("Could not open folder: {}", e));
        }
    }

    fn open_site(&mut self, url: &str) {
        if let Err(e) = self.preview.open(url) {
            self.error = Some(format!("Could not open {}: {}", url, e));
        }
    }

    fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl eframe::App for GalleryDlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_events() {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(POLL_INTERVAL);

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(self.localizer.text("app-title"));
                ui.add_space(24.0);
                let tabs = [
                    (Tab::Download, "tab-download"),
                    (Tab::Advanced, "tab-advanced"),
                    (Tab::Sites, "tab-sites"),
                ];
                for (tab, key) in tabs {
                    ui.selectable_value(&mut self.tab, tab, self.localizer.text(key));
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.add_space(4.0);
            ui::render_status(ui, &self.status, self.busy(), &self.localizer);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Download => self.render_download_tab(ui, &mut actions),
            Tab::Advanced => {
                ui::render_advanced_tab(ui, &mut self.settings, &self.localizer, &mut actions)
            }
            Tab::Sites => ui::render_sites_tab(
                ui,
                &self.sites,
                &mut self.sites_view,
                self.preview.as_ref(),
                &self.localizer,
                &mut actions,
            ),
        });

        if let Some(message) = self.error.clone() {
            if ui::render_error_window(ctx, &message, &self.localizer) {
                self.error = None;
            }
        }

        if self.confirm_reset {
            let question = self.localizer.text("reset-confirm");
            if let Some(answer) = ui::render_confirm_window(ctx, question, &self.localizer) {
                self.confirm_reset = false;
                if answer {
                    self.settings.reset_to_defaults();
                    let done = self.localizer.text("settings-reset").to_string();
                    self.log_message(done);
                }
            }
        }

        for action in actions {
            action.dispatch(self);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.request_stop();
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.settings) {
                log::warn!("failed to save settings on exit: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ShellCommands for Recorder {
        fn test_url(&mut self) {
            self.calls.push("test_url".into());
        }
        fn browse_folder(&mut self) {
            self.calls.push("browse_folder".into());
        }
        fn start_download(&mut self) {
            self.calls.push("start_download".into());
        }
        fn stop_download(&mut self) {
            self.calls.push("stop_download".into());
        }
        fn save_settings(&mut self) {
            self.calls.push("save_settings".into());
        }
        fn reset_settings(&mut self) {
            self.calls.push("reset_settings".into());
        }
        fn open_download_folder(&mut self) {
            self.calls.push("open_download_folder".into());
        }
        fn open_site(&mut self, url: &str) {
            self.calls.push(format!("open_site {}", url));
        }
        fn clear_log(&mut self) {
            self.calls.push("clear_log".into());
        }
    }

    #[test]
    fn actions_dispatch_to_matching_commands() {
        let mut recorder = Recorder::default();
        let actions = vec![
            UiAction::TestUrl,
            UiAction::StartDownload,
            UiAction::StopDownload,
            UiAction::OpenSite("https://example.com".to_string()),
            UiAction::ClearLog,
        ];
        for action in actions {
            action.dispatch(&mut recorder);
        }

        assert_eq!(
            recorder.calls,
            vec![
                "test_url",
                "start_download",
                "stop_download",
                "open_site https://example.com",
                "clear_log",
            ]
        );
    }

    fn headless_app(dir: &Path) -> GalleryDlApp {
        let mut sites = SiteRegistry::new();
        sites.initialize(None);
        GalleryDlApp::new(
            Some(SettingsStore::new(dir.join("settings.json"))),
            DownloadController::new(ControllerConfig::default()),
            sites,
            Box::new(preview::NoPreview),
        )
    }

    #[test]
    fn events_update_log_status_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = headless_app(dir.path());

        app.handle_event(AppEvent::log("line one"));
        app.handle_event(AppEvent::status("Downloading..."));
        app.handle_event(AppEvent::error("Please enter a URL"));

        assert_eq!(app.log, vec!["line one", "Error: Please enter a URL"]);
        assert_eq!(app.status, "Downloading...");
        assert_eq!(app.error.as_deref(), Some("Please enter a URL"));

        app.handle_event(AppEvent::TestFinished);
        assert_eq!(app.status, app.localizer.text("status-ready"));
    }

    #[test]
    fn log_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = headless_app(dir.path());

        for i in 0..theme::MAX_LOG_LINES + 10 {
            app.log_message(format!("line {}", i));
        }

        assert_eq!(app.log.len(), theme::MAX_LOG_LINES);
        assert_eq!(app.log[0], "line 10");
    }

    #[test]
    fn save_settings_writes_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = headless_app(dir.path());
        app.settings.username = "me".to_string();

        app.save_settings();

        assert!(app.error.is_none());
        let saved = SettingsStore::new(dir.path().join("settings.json")).load();
        assert_eq!(saved.username, "me");
    }

    #[test]
    fn empty_url_download_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = headless_app(dir.path());
        app.settings.url.clear();

        app.start_download();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while app.error.is_none() && std::time::Instant::now() < deadline {
            app.process_events();
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(app.error.as_deref(), Some("Please enter a URL"));
        assert!(!app.controller.is_downloading());
    }
}
