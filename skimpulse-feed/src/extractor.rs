//! Headline extraction from the skimfeed front page
//!
//! The page mixes real headlines with navigation chrome and per-site
//! attribution links, all using the same `r.php` redirect anchors. The
//! extractor matches those anchors, drops short or denylisted titles and
//! resolves relative hrefs against the site origin.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use skimpulse_core::{Article, ArticleList, MAX_ARTICLES};
use tracing::{debug, info};
use url::Url;

use crate::error::FeedError;

/// Site origin used to resolve relative article links
pub const DEFAULT_BASE_URL: &str = "https://skimfeed.com/";

/// Redirect-link prefix the site uses for every outbound article
pub const DEFAULT_LINK_PREFIX: &str = "r.php";

/// Heading label of the curated section on the front page
pub const DEFAULT_SECTION_LABEL: &str = "WHAT'S HOT";

/// Titles must be strictly longer than this (in characters, after trimming)
const MIN_TITLE_CHARS: usize = 10;

/// Container element for each box of links on the page
const SECTION_CONTAINER_SELECTOR: &str = ".boxes";

/// Heading link inside a box that carries its label
const SECTION_HEADING_SELECTOR: &str = "span.boxtitles h2 a.popurltitle";

/// Navigation, category and site-name fragments that share the article anchor pattern
const DENYLIST: &[&str] = &[
    // Navigation and categories
    "Home",
    "Twitter",
    "Weather",
    "Tech News",
    "Gaming",
    "Science",
    "Design",
    "Politics",
    "Comics",
    "Football",
    "Investing",
    "MMA",
    "Mobile News",
    "Reddit",
    "Trend",
    "Watches",
    "Youtube",
    "Custom",
    "Latest",
    // Source sites
    "Hacker News",
    "AnandTech",
    "Gizmag",
    "MakeUseOf",
    "Slashdot",
    "The Verge",
    "Wired",
    "Apple Insider",
    "World Holidays",
    "CBC Hourly News",
    "Google Plus",
    "Facebook",
    "Digg",
    "LinkedIn",
    "Blog",
    "Fast Company",
    "Next Big Future",
    "ArsTechnica",
    "High Scalability",
    "The Tech Block",
    "Continuations",
    "Packet Storm Sec",
    "How to Geek",
    "ReadWriteWeb",
    "Copyblogger",
    "BBC Technology",
    "The Next Web",
    "Venture Beat",
    "Extreme Tech",
    "Cult of Mac",
    "Smashing Mag",
    "FastCoExist",
    "Tech in Asia",
    // Timestamps, discussion links and site links
    "mins",
    "©©",
    "+",
];

/// Discussion and site links that also appear inside a curated section
const SECTION_DENYLIST: &[&str] = &["©©", "+"];

/// The built-in denylist
pub fn default_denylist() -> Vec<String> {
    DENYLIST.iter().map(|s| s.to_string()).collect()
}

/// Denylist for section-scoped extraction
///
/// Section boxes hold only headlines, so category words like "Science" or
/// "Latest" are legitimate title text there.
pub fn section_denylist() -> Vec<String> {
    SECTION_DENYLIST.iter().map(|s| s.to_string()).collect()
}

/// Which part of the document to search for article anchors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractScope {
    /// Every matching anchor on the page
    WholePage,
    /// Only anchors inside boxes whose heading contains `label`
    NamedSection { label: String },
}

impl ExtractScope {
    pub fn named_section(label: impl Into<String>) -> Self {
        ExtractScope::NamedSection {
            label: label.into(),
        }
    }
}

/// Extractor configuration
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Origin relative hrefs are resolved against
    pub base_url: String,
    /// Href prefix identifying article anchors
    pub link_prefix: String,
    /// Case-sensitive substrings that disqualify a title
    pub denylist: Vec<String>,
    pub scope: ExtractScope,
    /// Attach a 1-based rank to each article
    pub emit_rank: bool,
    /// Clamped to [`MAX_ARTICLES`]
    pub max_articles: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            denylist: default_denylist(),
            scope: ExtractScope::WholePage,
            emit_rank: false,
            max_articles: MAX_ARTICLES,
        }
    }
}

#[derive(Debug, Clone)]
struct SectionMatcher {
    container: Selector,
    heading: Selector,
    label: String,
}

/// Turns an HTML document into an [`ArticleList`]
#[derive(Debug, Clone)]
pub struct Extractor {
    base_url: Url,
    links: Selector,
    section: Option<SectionMatcher>,
    denylist: Vec<String>,
    emit_rank: bool,
    max_articles: usize,
}

impl Extractor {
    /// Build an extractor, validating the selectors and base URL up front
    pub fn new(config: ExtractorConfig) -> Result<Self, FeedError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            FeedError::InvalidConfig(format!("base URL {:?}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::InvalidConfig(format!(
                "base URL {:?} cannot resolve relative links",
                config.base_url
            )));
        }

        if config.link_prefix.is_empty()
            || config.link_prefix.contains('"')
            || config.link_prefix.contains('\\')
        {
            return Err(FeedError::InvalidConfig(format!(
                "link prefix {:?} is not usable in a selector",
                config.link_prefix
            )));
        }
        let links = parse_selector(&format!(r#"a[href^="{}"]"#, config.link_prefix))?;

        let section = match config.scope {
            ExtractScope::WholePage => None,
            ExtractScope::NamedSection { label } => Some(SectionMatcher {
                container: parse_selector(SECTION_CONTAINER_SELECTOR)?,
                heading: parse_selector(SECTION_HEADING_SELECTOR)?,
                label,
            }),
        };

        // An empty entry would match every title
        let denylist = config
            .denylist
            .into_iter()
            .filter(|entry| !entry.is_empty())
            .collect();

        Ok(Self {
            base_url,
            links,
            section,
            denylist,
            emit_rank: config.emit_rank,
            max_articles: config.max_articles.min(MAX_ARTICLES),
        })
    }

    /// Extract up to `max_articles` headlines in document order
    pub fn extract(&self, html: &str) -> Result<ArticleList, FeedError> {
        let document = Html::parse_document(html);
        let anchors = self.candidate_anchors(&document)?;

        info!("Found {} article links", anchors.len());

        let mut articles = ArticleList::with_limit(self.max_articles);

        for anchor in anchors {
            if articles.is_full() {
                break;
            }

            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(title) = anchor_title(&anchor) else {
                continue;
            };
            if !self.is_headline(&title) {
                continue;
            }
            let Some(url) = self.resolve_url(href) else {
                debug!("Skipping unresolvable link: {}", href);
                continue;
            };

            debug!("Added: \"{}\" -> {}", title, url);

            let article = if self.emit_rank {
                Article::ranked(title, url, articles.len() + 1)
            } else {
                Article::new(title, url)
            };
            articles.push(article);
        }

        if articles.is_empty() {
            return Err(FeedError::NoArticlesFound);
        }

        info!("Processed {} articles", articles.len());
        Ok(articles)
    }

    /// Length and denylist checks on a candidate title
    pub fn is_headline(&self, title: &str) -> bool {
        title.chars().count() > MIN_TITLE_CHARS
            && !self.denylist.iter().any(|entry| title.contains(entry.as_str()))
    }

    /// Resolve an href to an absolute URL
    ///
    /// Hrefs that already carry a scheme are returned untouched.
    pub fn resolve_url(&self, href: &str) -> Option<String> {
        match Url::parse(href) {
            Ok(_) => Some(href.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url.join(href).ok().map(String::from)
            }
            Err(_) => None,
        }
    }

    fn candidate_anchors<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, FeedError> {
        let Some(section) = &self.section else {
            return Ok(document.select(&self.links).collect());
        };

        let boxes: Vec<ElementRef<'a>> = document
            .select(&section.container)
            .filter(|container| {
                let heading: String = container
                    .select(&section.heading)
                    .flat_map(|h| h.text())
                    .collect();
                heading.contains(section.label.as_str())
            })
            .collect();

        if boxes.is_empty() {
            info!("{} section not found", section.label);
            return Err(FeedError::SectionNotFound {
                section: section.label.clone(),
            });
        }

        // Nested boxes would otherwise yield the same anchor twice
        let mut seen = HashSet::new();
        Ok(boxes
            .iter()
            .flat_map(|container| container.select(&self.links))
            .filter(|anchor| seen.insert(anchor.id()))
            .collect())
    }
}

/// Title attribute when present and non-empty, otherwise the visible text
fn anchor_title(anchor: &ElementRef<'_>) -> Option<String> {
    let title = match anchor.value().attr("title") {
        Some(attr) if !attr.is_empty() => attr.trim().to_string(),
        _ => anchor.text().collect::<String>().trim().to_string(),
    };

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, FeedError> {
    Selector::parse(selector)
        .map_err(|e| FeedError::InvalidConfig(format!("selector {:?}: {:?}", selector, e)))
}
