use eframe::egui;
use rfd::FileDialog;
use std::path::Path;

use crate::localizations::Localizations;
use crate::models::Settings;
use crate::preview::SitePreview;
use crate::sites::{SiteInfo, SiteRegistry};
use crate::theme;

/// Something the user asked for; the app turns each into a `ShellCommands` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    TestUrl,
    BrowseFolder,
    StartDownload,
    StopDownload,
    SaveSettings,
    ResetSettings,
    OpenDownloadFolder,
    OpenSite(String),
    ClearLog,
}

/// What the controller is doing, as far as the widgets care.
#[derive(Debug, Clone, Copy, Default)]
pub struct Busy {
    pub testing: bool,
    pub downloading: bool,
    pub stopping: bool,
}

impl Busy {
    pub fn any(&self) -> bool {
        self.testing || self.downloading
    }
}

pub fn render_url_input(
    ui: &mut egui::Ui,
    settings: &mut Settings,
    busy: Busy,
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.label(localizer.text("url-label"));

    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [ui.available_width() - 240.0, 32.0],
            egui::TextEdit::singleline(&mut settings.url)
                .hint_text(localizer.text("url-placeholder"))
                .font(egui::FontId::proportional(15.0)),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !busy.any() {
            actions.push(UiAction::StartDownload);
        }

        let mut picked = None;
        ui.add_enabled_ui(!settings.url_history.is_empty(), |ui| {
            egui::ComboBox::from_id_source("url-history")
                .selected_text(localizer.text("history-label"))
                .width(100.0)
                .show_ui(ui, |ui| {
                    for url in settings.url_history.iter().rev() {
                        if ui.selectable_label(false, url.as_str()).clicked() {
                            picked = Some(url.clone());
                        }
                    }
                });
        });
        if let Some(url) = picked {
            settings.url = url;
        }

        let test_button = egui::Button::new(localizer.text("test-button"))
            .min_size(egui::vec2(110.0, 32.0))
            .rounding(theme::ROUNDING_BUTTON);
        if ui.add_enabled(!busy.any(), test_button).clicked() {
            actions.push(UiAction::TestUrl);
        }
    });
}

pub fn render_download_dir_selector(
    ui: &mut egui::Ui,
    settings: &mut Settings,
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.label(localizer.text("download-to"));

    ui.horizontal(|ui| {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(theme::ROUNDING_FRAME)
            .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
            .show(ui, |ui| {
                ui.add_sized(
                    [ui.available_width() - 240.0, 32.0],
                    egui::TextEdit::singleline(&mut settings.download_path)
                        .frame(false)
                        .margin(egui::vec2(8.0, 8.0)),
                );
            });

        if ui.button(localizer.text("browse-button")).clicked() {
            actions.push(UiAction::BrowseFolder);
        }
        if ui.button(localizer.text("open-folder-button")).clicked() {
            actions.push(UiAction::OpenDownloadFolder);
        }
    });
}

pub fn render_download_buttons(
    ui: &mut egui::Ui,
    busy: Busy,
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        let download_button = egui::Button::new(
            egui::RichText::new(localizer.text("download-button"))
                .size(theme::BUTTON_FONT_SIZE)
                .color(theme::BUTTON_MAIN_TEXT),
        )
        .min_size(theme::MIN_SIZE_BUTTON)
        .fill(theme::PRIMARY_BUTTON_BG)
        .rounding(theme::ROUNDING_BUTTON);
        if ui.add_enabled(!busy.any(), download_button).clicked() {
            actions.push(UiAction::StartDownload);
        }

        ui.add_space(12.0);

        let stop_button = egui::Button::new(
            egui::RichText::new(localizer.text("stop-button"))
                .size(theme::BUTTON_FONT_SIZE)
                .color(theme::BUTTON_MAIN_TEXT),
        )
        .min_size(theme::MIN_SIZE_BUTTON)
        .fill(theme::STOP_BUTTON_BG)
        .rounding(theme::ROUNDING_BUTTON);
        if ui
            .add_enabled(busy.downloading && !busy.stopping, stop_button)
            .clicked()
        {
            actions.push(UiAction::StopDownload);
        }
    });
}

pub fn render_log(
    ui: &mut egui::Ui,
    lines: &[String],
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        ui.label(localizer.text("log-label"));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button(localizer.text("clear-log")).clicked() {
                actions.push(UiAction::ClearLog);
            }
        });
    });

    egui::Frame::group(ui.style())
        .fill(theme::LOG_BG)
        .rounding(theme::ROUNDING_FRAME)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .max_height(ui.available_height() - 60.0)
                .show(ui, |ui| {
                    for line in lines {
                        ui.label(
                            egui::RichText::new(line)
                                .monospace()
                                .size(theme::LOG_FONT_SIZE),
                        );
                    }
                });
        });
}

pub fn render_status(ui: &mut egui::Ui, status: &str, busy: Busy, localizer: &Localizations) {
    egui::Frame::group(ui.style())
        .fill(theme::STATUS_BG)
        .rounding(theme::ROUNDING_FRAME)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if busy.any() {
                    ui.spinner();
                }
                let text = if busy.stopping {
                    localizer.text("status-stopping")
                } else {
                    status
                };
                ui.label(egui::RichText::new(text).color(theme::SECONDARY_TEXT));
            });
        });
}

pub fn render_advanced_tab(
    ui: &mut egui::Ui,
    settings: &mut Settings,
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.heading(localizer.text("auth-heading"));
    egui::Grid::new("auth-grid")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label(localizer.text("username-label"));
            ui.text_edit_singleline(&mut settings.username);
            ui.end_row();

            ui.label(localizer.text("password-label"));
            ui.add(egui::TextEdit::singleline(&mut settings.password).password(true));
            ui.end_row();

            ui.label(localizer.text("cookies-label"));
            file_picker_row(ui, &mut settings.cookies_file_path, "cookies", &["txt"], localizer);
            ui.end_row();

            ui.label(localizer.text("config-label"));
            file_picker_row(ui, &mut settings.config_file_path, "config", &["json", "conf"], localizer);
            ui.end_row();
        });

    ui.add_space(16.0);
    ui.heading(localizer.text("options-heading"));
    ui.checkbox(&mut settings.extract_links_only, localizer.text("opt-extract-links"));
    ui.checkbox(&mut settings.no_download, localizer.text("opt-no-download"));
    ui.checkbox(&mut settings.write_info_json, localizer.text("opt-write-info"));
    ui.checkbox(&mut settings.write_metadata, localizer.text("opt-write-metadata"));

    ui.add_space(16.0);
    ui.horizontal(|ui| {
        if ui.button(localizer.text("save-settings")).clicked() {
            actions.push(UiAction::SaveSettings);
        }
        if ui.button(localizer.text("reset-settings")).clicked() {
            actions.push(UiAction::ResetSettings);
        }
    });
}

fn file_picker_row(
    ui: &mut egui::Ui,
    path: &mut String,
    filter_name: &str,
    extensions: &[&str],
    localizer: &Localizations,
) {
    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(path).desired_width(320.0));
        if ui.button(localizer.text("browse-button")).clicked() {
            let start_dir = Path::new(path.as_str())
                .parent()
                .filter(|dir| dir.is_dir())
                .map(Path::to_path_buf)
                .or_else(dirs::home_dir)
                .unwrap_or_default();
            if let Some(file) = FileDialog::new()
                .set_directory(start_dir)
                .add_filter(filter_name, extensions)
                .add_filter("All files", &["*"])
                .pick_file()
            {
                *path = file.to_string_lossy().to_string();
            }
        }
    });
}

/// State the sites tab keeps between frames.
#[derive(Debug, Clone)]
pub struct SitesView {
    pub search: String,
    pub category: String,
    pub selected: Option<SiteInfo>,
}

impl Default for SitesView {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: crate::sites::ALL_CATEGORIES.to_string(),
            selected: None,
        }
    }
}

pub fn render_sites_tab(
    ui: &mut egui::Ui,
    registry: &SiteRegistry,
    view: &mut SitesView,
    preview: &dyn SitePreview,
    localizer: &Localizations,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        ui.label(localizer.text("search-label"));
        ui.text_edit_singleline(&mut view.search);
        ui.add_space(12.0);
        ui.label(localizer.text("category-label"));
        egui::ComboBox::from_id_source("site-category")
            .selected_text(view.category.as_str())
            .show_ui(ui, |ui| {
                for category in registry.categories() {
                    let label = category.clone();
                    ui.selectable_value(&mut view.category, category, label);
                }
            });
    });
    ui.separator();

    let matches = registry.filter(&view.search, &view.category);
    ui.columns(2, |columns| {
        egui::ScrollArea::vertical()
            .id_source("site-list")
            .auto_shrink([false, false])
            .show(&mut columns[0], |ui| {
                for site in &matches {
                    let selected = view.selected.as_ref() == Some(*site);
                    let label = format!("{}  ({})", site.name, site.category);
                    if ui.selectable_label(selected, label).clicked() {
                        view.selected = Some((*site).clone());
                    }
                }
            });

        let ui = &mut columns[1];
        match &view.selected {
            Some(site) => {
                ui.label(preview.describe(site));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.hyperlink_to(site.url.as_str(), site.url.as_str());
                    if ui
                        .button(localizer.text("open-site"))
                        .on_hover_text(format!("Opens with the {}", preview.label()))
                        .clicked()
                    {
                        actions.push(UiAction::OpenSite(site.url.clone()));
                    }
                });
            }
            None => {
                ui.label(egui::RichText::new(localizer.text("select-site")).color(theme::SECONDARY_TEXT));
            }
        }
    });
}

pub fn render_error_window(
    ctx: &egui::Context,
    message: &str,
    localizer: &Localizations,
) -> bool {
    let mut dismissed = false;
    egui::Window::new(localizer.text("error-title"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(message).color(theme::TEXT_ERROR));
            ui.add_space(8.0);
            if ui.button(localizer.text("ok-button")).clicked() {
                dismissed = true;
            }
        });
    dismissed
}

/// Returns `Some(answer)` once the user picks yes or no.
pub fn render_confirm_window(
    ctx: &egui::Context,
    question: &str,
    localizer: &Localizations,
) -> Option<bool> {
    let mut answer = None;
    egui::Window::new(localizer.text("reset-settings"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(question);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button(localizer.text("yes-button")).clicked() {
                    answer = Some(true);
                }
                if ui.button(localizer.text("no-button")).clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}
