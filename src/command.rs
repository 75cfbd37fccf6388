use crate::models::Settings;

pub const TOOL_NAME: &str = "gallery-dl";

/// Builds the gallery-dl argument vector for the current settings, or `None`
/// when there is no URL to fetch.
///
/// The order is fixed; the URL always comes last.
pub fn build_command(settings: &Settings) -> Option<Vec<String>> {
    let url = settings.url.trim();
    if url.is_empty() {
        return None;
    }

    let mut cmd = vec![TOOL_NAME.to_string()];

    let mut push_pair = |flag: &str, value: &str| {
        if !value.is_empty() {
            cmd.push(flag.to_string());
            cmd.push(value.to_string());
        }
    };
    push_pair("-u", &settings.username);
    push_pair("-p", &settings.password);
    push_pair("--cookies", &settings.cookies_file_path);
    push_pair("--config", &settings.config_file_path);

    let switches = [
        (settings.extract_links_only, "-g"),
        (settings.no_download, "--no-download"),
        (settings.write_info_json, "--write-info-json"),
        (settings.write_metadata, "--write-metadata"),
    ];
    cmd.extend(
        switches
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| flag.to_string()),
    );

    let download_path = settings.download_path.trim();
    if !download_path.is_empty() {
        cmd.push("-d".to_string());
        cmd.push(download_path.to_string());
    }

    cmd.push(url.to_string());
    Some(cmd)
}

/// Arguments for a dry run of `url`, without the executable name.
pub fn test_arguments(url: &str) -> Vec<String> {
    vec![
        "--no-download".to_string(),
        "--simulate".to_string(),
        url.trim().to_string(),
    ]
}

/// Space-joined rendering for the log view, with the password masked.
/// Never executed.
pub fn display_command(cmd: &[String]) -> String {
    let mut hide_next = false;
    cmd.iter()
        .map(|arg| {
            if std::mem::replace(&mut hide_next, arg == "-p") {
                return "********".to_string();
            }
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
