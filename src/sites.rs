use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub name: String,
    pub category: String,
    pub description: String,
    pub url: String,
    pub capabilities: String,
    pub authentication: String,
}

impl SiteInfo {
    fn fallback(name: &str, category: &str, description: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            capabilities: String::new(),
            authentication: String::new(),
        }
    }
}

/// Where the site list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteSource {
    Markdown,
    Fallback,
}

/// Supported-sites reference, owned by the app and handed to whoever needs
/// it. Empty until [`SiteRegistry::initialize`] runs.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteInfo>,
    source: Option<SiteSource>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the list once. Later calls keep the first result.
    pub fn initialize(&mut self, markdown: Option<&Path>) -> SiteSource {
        if let Some(source) = self.source {
            return source;
        }

        let parsed = markdown
            .and_then(|path| match std::fs::read_to_string(path) {
                Ok(text) => Some(parse_supported_sites(&text)),
                Err(e) => {
                    log::info!("no site list at {}: {}", path.display(), e);
                    None
                }
            })
            .filter(|sites| !sites.is_empty());

        let source = match parsed {
            Some(sites) => {
                self.sites = sites;
                SiteSource::Markdown
            }
            None => {
                self.sites = fallback_sites();
                SiteSource::Fallback
            }
        };
        log::info!("loaded {} sites ({:?})", self.sites.len(), source);
        self.source = Some(source);
        source
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.source.is_some()
    }

    pub fn sites(&self) -> &[SiteInfo] {
        &self.sites
    }

    /// `"All"` followed by every category in use, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.sites.iter().map(|site| site.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories.insert(0, ALL_CATEGORIES.to_string());
        categories
    }

    /// Case-insensitive search over name and description, within `category`.
    pub fn filter(&self, search: &str, category: &str) -> Vec<&SiteInfo> {
        let needle = search.trim().to_lowercase();
        self.sites
            .iter()
            .filter(|site| category == ALL_CATEGORIES || site.category == category)
            .filter(|site| {
                needle.is_empty()
                    || site.name.to_lowercase().contains(&needle)
                    || site.description.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// `supportedsites.md` next to the executable, or in the working directory.
pub fn default_markdown_path() -> Option<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("supportedsites.md")));
    let in_cwd = std::env::current_dir()
        .ok()
        .map(|dir| dir.join("supportedsites.md"));
    beside_exe
        .into_iter()
        .chain(in_cwd)
        .find(|path| path.is_file())
}

static TABLE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static ROW_RE: OnceLock<Option<Regex>> = OnceLock::new();
static CELL_RE: OnceLock<Option<Regex>> = OnceLock::new();
static TAG_RE: OnceLock<Option<Regex>> = OnceLock::new();
static HREF_RE: OnceLock<Option<Regex>> = OnceLock::new();
static BARE_URL_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Rows of the first `<tbody>` table: name, link, capabilities, authentication.
pub fn parse_supported_sites(content: &str) -> Vec<SiteInfo> {
    let patterns = (
        cached(&TABLE_RE, r"(?s)<tbody[^>]*>(.*?)</tbody>"),
        cached(&ROW_RE, r"(?s)<tr[^>]*>(.*?)</tr>"),
        cached(&CELL_RE, r"(?s)<td[^>]*>(.*?)</td>"),
    );
    let (Some(table_re), Some(row_re), Some(cell_re)) = patterns else {
        return Vec::new();
    };

    let Some(table) = table_re.captures(content).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    row_re
        .captures_iter(table.as_str())
        .filter_map(|row| {
            let cells: Vec<&str> = cell_re
                .captures_iter(row.get(1)?.as_str())
                .filter_map(|cell| cell.get(1).map(|m| m.as_str()))
                .collect();
            if cells.len() < 4 {
                return None;
            }

            let name = clean_text(cells[0]);
            let url = extract_url(cells[1]);
            if name.is_empty() || url.is_empty() {
                return None;
            }
            let capabilities = clean_text(cells[2]);
            Some(SiteInfo {
                category: categorize(&name, &capabilities).to_string(),
                description: capabilities.clone(),
                authentication: clean_text(cells[3]),
                name,
                url,
                capabilities,
            })
        })
        .collect()
}

fn clean_text(html: &str) -> String {
    let without_tags = match cached(&TAG_RE, r"<[^>]+>") {
        Some(tag_re) => tag_re.replace_all(html, "").into_owned(),
        None => html.to_string(),
    };
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_url(html: &str) -> String {
    let href = cached(&HREF_RE, r#"href=["']([^"']+)["']"#)
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    href.or_else(|| {
        cached(&BARE_URL_RE, r#"https?://[^\s<>"]+"#)
            .and_then(|re| re.find(html))
            .map(|m| m.as_str().to_string())
    })
    .unwrap_or_default()
}

/// Keyword buckets, checked in order.
pub fn categorize(name: &str, capabilities: &str) -> &'static str {
    let name = name.to_lowercase();
    let caps = capabilities.to_lowercase();
    let name_has = |terms: &[&str]| terms.iter().any(|term| name.contains(term));
    let caps_has = |terms: &[&str]| terms.iter().any(|term| caps.contains(term));

    if name_has(&["booru", "chan", "gel", "rule34"]) {
        "Image Boards"
    } else if name_has(&["art", "deviant", "pixiv", "behance"]) {
        "Art Platforms"
    } else if name_has(&["twitter", "instagram", "tumblr", "facebook", "reddit"]) {
        "Social Media"
    } else if caps_has(&["manga", "comic", "chapter"]) {
        "Manga/Comics"
    } else if name_has(&["photo", "flickr", "500px"]) {
        "Photography"
    } else if caps_has(&["board", "thread", "forum"]) {
        "Forums"
    } else if caps_has(&["video", "youtube", "vimeo"]) {
        "Video Platforms"
    } else {
        "Other"
    }
}

fn fallback_sites() -> Vec<SiteInfo> {
    [
        ("DeviantArt", "Art Platforms", "Digital art galleries and collections", "https://www.deviantart.com/"),
        ("ArtStation", "Art Platforms", "Professional art portfolios", "https://www.artstation.com/"),
        ("Pixiv", "Art Platforms", "Japanese digital art and illustrations", "https://www.pixiv.net/"),
        ("Behance", "Art Platforms", "Creative work portfolios", "https://www.behance.net/"),
        ("Twitter", "Social Media", "Twitter posts and media", "https://twitter.com/"),
        ("Instagram", "Social Media", "Instagram posts and stories", "https://www.instagram.com/"),
        ("Tumblr", "Social Media", "Tumblr blogs and posts", "https://www.tumblr.com/"),
        ("Reddit", "Social Media", "Reddit posts and subreddits", "https://www.reddit.com/"),
        ("Danbooru", "Image Boards", "Anime-style artwork database", "https://danbooru.donmai.us/"),
        ("Gelbooru", "Image Boards", "Anime and manga image board", "https://gelbooru.com/"),
        ("e621", "Image Boards", "Anthropomorphic art archive", "https://e621.net/"),
        ("Flickr", "Photography", "Photo sharing and hosting", "https://www.flickr.com/"),
        ("500px", "Photography", "Photography community", "https://500px.com/"),
        ("MangaDex", "Manga/Comics", "Manga reading platform", "https://mangadex.org/"),
        ("YouTube", "Video Platforms", "Video sharing platform", "https://www.youtube.com/"),
        ("4chan", "Forums", "Anonymous imageboard", "https://www.4chan.org/"),
    ]
    .into_iter()
    .map(|(name, category, description, url)| SiteInfo::fallback(name, category, description, url))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Supported Sites

<table>
<thead valign="bottom">
<tr><th>Site</th><th>URL</th><th>Capabilities</th><th>Authentication</th></tr>
</thead>
<tbody valign="top">
<tr>
    <td>Danbooru</td>
    <td><a href="https://danbooru.donmai.us/">https://danbooru.donmai.us/</a></td>
    <td>Pools, Popular Images, Posts, Tag Searches</td>
    <td>Supported</td>
</tr>
<tr>
    <td>MangaDex</td>
    <td>https://mangadex.org/</td>
    <td>Chapters,   <b>Manga</b></td>
    <td></td>
</tr>
<tr>
    <td>Broken</td>
    <td>no link here</td>
    <td>Images</td>
    <td></td>
</tr>
<tr><td>Short row</td></tr>
</tbody>
</table>
"#;

    #[test]
    fn parses_table_rows() {
        let sites = parse_supported_sites(SAMPLE);
        assert_eq!(sites.len(), 2);

        assert_eq!(sites[0].name, "Danbooru");
        assert_eq!(sites[0].url, "https://danbooru.donmai.us/");
        assert_eq!(sites[0].authentication, "Supported");
        assert_eq!(sites[0].category, "Image Boards");

        assert_eq!(sites[1].url, "https://mangadex.org/");
        assert_eq!(sites[1].capabilities, "Chapters, Manga");
        assert_eq!(sites[1].description, sites[1].capabilities);
        assert_eq!(sites[1].category, "Manga/Comics");
    }

    #[test]
    fn patterns_are_compiled_once_and_reused() {
        let first = parse_supported_sites(SAMPLE);
        let table_re = TABLE_RE.get().and_then(Option::as_ref).map(|re| re as *const Regex);
        let tag_re = TAG_RE.get().and_then(Option::as_ref).map(|re| re as *const Regex);
        assert!(table_re.is_some());
        assert!(tag_re.is_some());

        let second = parse_supported_sites(SAMPLE);
        assert_eq!(first, second);
        assert_eq!(
            TABLE_RE.get().and_then(Option::as_ref).map(|re| re as *const Regex),
            table_re
        );
        assert_eq!(
            TAG_RE.get().and_then(Option::as_ref).map(|re| re as *const Regex),
            tag_re
        );
    }

    #[test]
    fn cells_are_cleaned_and_links_extracted() {
        assert_eq!(clean_text("  <i>Posts</i>,\n   Pools "), "Posts, Pools");
        assert_eq!(
            extract_url(r#"<a href='https://e621.net/'>e621</a>"#),
            "https://e621.net/"
        );
        assert_eq!(extract_url("see https://imgur.com/ here"), "https://imgur.com/");
        assert_eq!(extract_url("nothing"), "");
    }

    #[test]
    fn content_without_table_yields_nothing() {
        assert!(parse_supported_sites("# nothing to see").is_empty());
    }

    #[test]
    fn categorizes_by_keywords() {
        assert_eq!(categorize("Gelbooru", ""), "Image Boards");
        assert_eq!(categorize("ArtStation", ""), "Art Platforms");
        assert_eq!(categorize("Reddit", "Submissions"), "Social Media");
        assert_eq!(categorize("Flickr", "Albums"), "Photography");
        assert_eq!(categorize("Somewhere", "Threads"), "Forums");
        assert_eq!(categorize("Tube", "Videos"), "Video Platforms");
        assert_eq!(categorize("Nameless", "Images"), "Other");
    }

    #[test]
    fn initialize_uses_markdown_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supportedsites.md");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut registry = SiteRegistry::new();
        assert!(!registry.is_initialized());
        assert_eq!(registry.initialize(Some(path.as_path())), SiteSource::Markdown);
        assert_eq!(registry.sites().len(), 2);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(registry.initialize(Some(path.as_path())), SiteSource::Markdown);
        assert_eq!(registry.sites().len(), 2);
    }

    #[test]
    fn missing_or_empty_markdown_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();

        let mut missing = SiteRegistry::new();
        assert_eq!(
            missing.initialize(Some(dir.path().join("absent.md").as_path())),
            SiteSource::Fallback
        );
        assert_eq!(missing.sites().len(), 16);

        let empty_path = dir.path().join("empty.md");
        std::fs::write(&empty_path, "no table").unwrap();
        let mut empty = SiteRegistry::new();
        assert_eq!(empty.initialize(Some(empty_path.as_path())), SiteSource::Fallback);

        let mut none = SiteRegistry::new();
        assert_eq!(none.initialize(None), SiteSource::Fallback);
    }

    #[test]
    fn categories_are_sorted_after_all() {
        let mut registry = SiteRegistry::new();
        registry.initialize(None);

        assert_eq!(
            registry.categories(),
            vec![
                "All",
                "Art Platforms",
                "Forums",
                "Image Boards",
                "Manga/Comics",
                "Photography",
                "Social Media",
                "Video Platforms",
            ]
        );
    }

    #[test]
    fn filter_matches_name_or_description_within_category() {
        let mut registry = SiteRegistry::new();
        registry.initialize(None);

        let names = |sites: Vec<&SiteInfo>| -> Vec<String> {
            sites.into_iter().map(|site| site.name.clone()).collect()
        };

        assert_eq!(registry.filter("", ALL_CATEGORIES).len(), 16);
        assert_eq!(names(registry.filter("PIXIV", ALL_CATEGORIES)), vec!["Pixiv"]);
        assert_eq!(
            names(registry.filter("manga", ALL_CATEGORIES)),
            vec!["Gelbooru", "MangaDex"]
        );
        assert_eq!(names(registry.filter("manga", "Manga/Comics")), vec!["MangaDex"]);
        assert!(registry.filter("pixiv", "Social Media").is_empty());
    }
}
