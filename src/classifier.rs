//! Turns gallery-dl exit codes and output into messages a user can act on.

pub fn describe(exit_code: i32) -> String {
    let known = match exit_code {
        1 => "General error or exception occurred",
        2 => "Interrupted by user (Ctrl+C)",
        3 => "Invalid command line arguments",
        4 => "Input/output error (network issues, file permissions, or unsupported URL)",
        5 => "Configuration error (invalid config file or settings)",
        6 => "Authentication error (invalid credentials or login required)",
        8 => "Format or extraction error (unsupported site or changed website structure)",
        16 => "File system error (disk full, permission denied, or path issues)",
        32 => "Download error (corrupted files or incomplete downloads)",
        64 => "Unsupported URL or site - this website is not supported by gallery-dl",
        128 => "Postprocessor error (issues with file processing after download)",
        _ => return format!("Unknown error (exit code {})", exit_code),
    };
    known.to_string()
}

// Commercial stock photo sites users commonly try.
const STOCK_SITES: &[(&str, &str)] = &[
    (
        "shutterstock",
        "Shutterstock is not supported by gallery-dl (commercial stock photo site)",
    ),
    (
        "getty",
        "Getty Images is not supported (commercial stock photo site)",
    ),
    (
        "adobe stock",
        "Adobe Stock is not supported (commercial stock photo site)",
    ),
];

/// Best-effort hint derived from the tool output. The first matching rule wins.
pub fn analyze_context<S: AsRef<str>>(output_lines: &[S], exit_code: i32) -> Option<String> {
    let text = output_lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| text.contains(word));

    if text.contains("unsupported url") {
        let offending = output_lines
            .iter()
            .map(|line| line.as_ref().to_lowercase())
            .find(|line| line.contains("unsupported url"))
            .unwrap_or_default();
        let hint = STOCK_SITES
            .iter()
            .find(|(needle, _)| offending.contains(needle))
            .map(|(_, hint)| *hint)
            .unwrap_or("This website is not supported by gallery-dl");
        return Some(hint.to_string());
    }

    let hint = match exit_code {
        6 if mentions(&["login", "authentication"]) => {
            Some("This site requires login credentials - try using the Advanced tab")
        }
        8 if mentions(&["extractor", "format"]) => {
            Some("Website structure may have changed - try updating gallery-dl")
        }
        16 if mentions(&["permission", "access"]) => {
            Some("Check file permissions and available disk space")
        }
        _ => None,
    };

    hint.or_else(|| {
        mentions(&["network", "connection", "timeout"])
            .then_some("Network connectivity issue - check your internet connection")
    })
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_fixed_descriptions() {
        assert_eq!(
            describe(4),
            "Input/output error (network issues, file permissions, or unsupported URL)"
        );
        assert!(describe(64).starts_with("Unsupported URL or site"));
        for code in [1, 2, 3, 5, 6, 8, 16, 32, 128] {
            assert!(!describe(code).starts_with("Unknown error"), "code {code}");
        }
    }

    #[test]
    fn unknown_codes_mention_the_number() {
        assert_eq!(describe(999), "Unknown error (exit code 999)");
        assert_eq!(describe(0), "Unknown error (exit code 0)");
        assert_eq!(describe(-9), "Unknown error (exit code -9)");
    }

    #[test]
    fn stock_photo_sites_get_specific_hints() {
        let hint = analyze_context(&["Unsupported URL: https://shutterstock.com/x"], 64);
        assert_eq!(
            hint.as_deref(),
            Some("Shutterstock is not supported by gallery-dl (commercial stock photo site)")
        );

        let hint = analyze_context(&["[error] Unsupported URL 'https://www.gettyimages.com/p'"], 64);
        assert!(hint.unwrap().starts_with("Getty Images"));
    }

    #[test]
    fn other_unsupported_urls_get_generic_hint() {
        let hint = analyze_context(&["Unsupported URL: https://example.org"], 64);
        assert_eq!(
            hint.as_deref(),
            Some("This website is not supported by gallery-dl")
        );
    }

    #[test]
    fn unsupported_url_wins_over_network_words() {
        let lines = ["connection reset", "Unsupported URL: https://example.org"];
        assert_eq!(
            analyze_context(&lines, 1).as_deref(),
            Some("This website is not supported by gallery-dl")
        );
    }

    #[test]
    fn code_specific_hints_require_matching_code() {
        let login = ["[error] Login required"];
        assert!(analyze_context(&login, 6)
            .unwrap()
            .contains("requires login credentials"));
        assert_eq!(analyze_context(&login, 1), None);

        let extractor = ["[foo][error] Extractor failed"];
        assert!(analyze_context(&extractor, 8)
            .unwrap()
            .contains("structure may have changed"));

        let access = ["Access denied to /out"];
        assert!(analyze_context(&access, 16)
            .unwrap()
            .contains("permissions"));
    }

    #[test]
    fn network_problems_are_detected_for_any_code() {
        assert_eq!(
            analyze_context(&["connection timeout"], 1).as_deref(),
            Some("Network connectivity issue - check your internet connection")
        );
        assert!(analyze_context(&["Network unreachable"], 4).is_some());
    }

    #[test]
    fn unrecognized_output_gives_no_hint() {
        assert_eq!(analyze_context(&["something odd happened"], 1), None);
        assert_eq!(analyze_context::<&str>(&[], 32), None);
    }
}
