use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::sites::SiteInfo;

/// Shows a site or a folder to the user outside the app.
pub trait SitePreview {
    fn label(&self) -> &str;

    /// Hands `target` (a URL or a local folder) to the preview.
    fn open(&self, target: &str) -> io::Result<()>;

    /// Plain-text summary shown inside the app.
    fn describe(&self, site: &SiteInfo) -> String {
        let mut text = format!("{}\n{}\n\nCategory: {}", site.name, site.url, site.category);
        if !site.capabilities.is_empty() {
            text.push_str(&format!("\nCapabilities: {}", site.capabilities));
        } else if !site.description.is_empty() {
            text.push_str(&format!("\n{}", site.description));
        }
        if !site.authentication.is_empty() {
            text.push_str(&format!("\nAuthentication: {}", site.authentication));
        }
        text
    }
}

/// Delegates to the desktop's opener (`xdg-open`, `open`, `cmd /C start`).
pub struct SystemOpener {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl SitePreview for SystemOpener {
    fn label(&self) -> &str {
        "system browser"
    }

    fn open(&self, target: &str) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // Reap the opener without blocking the interface.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Used when nothing on this machine can open links.
pub struct NoPreview;

impl SitePreview for NoPreview {
    fn label(&self) -> &str {
        "unavailable"
    }

    fn open(&self, target: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no browser or file manager available to open {}", target),
        ))
    }
}

#[cfg(target_os = "windows")]
const OPENERS: &[(&str, &[&str])] = &[("cmd", &["/C", "start", ""])];
#[cfg(target_os = "macos")]
const OPENERS: &[(&str, &[&str])] = &[("open", &[])];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENERS: &[(&str, &[&str])] = &[("xdg-open", &[]), ("gio", &["open"])];

/// Picks the preview once, at startup.
pub fn resolve() -> Box<dyn SitePreview> {
    resolve_from(OPENERS)
}

fn resolve_from(candidates: &[(&str, &[&str])]) -> Box<dyn SitePreview> {
    for (name, leading_args) in candidates {
        if let Ok(program) = which::which(name) {
            log::info!("site preview via {}", program.display());
            return Box::new(SystemOpener {
                program,
                leading_args: leading_args.iter().map(|arg| arg.to_string()).collect(),
            });
        }
    }
    log::info!("no system opener found, site preview disabled");
    Box::new(NoPreview)
}
