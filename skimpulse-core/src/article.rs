//! Article data structures for the skimfeed headline list

use serde::{Serialize, Serializer};

/// Hard cap on the number of articles in a list
pub const MAX_ARTICLES: usize = 20;

/// A headline scraped from the aggregator page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Headline text
    pub title: String,
    /// Absolute article URL (usually the site's redirect link)
    pub url: String,
    /// 1-based position in the list, when ranking is enabled
    #[serde(rename = "ranking", skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            rank: None,
        }
    }

    pub fn ranked(title: impl Into<String>, url: impl Into<String>, rank: usize) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            rank: Some(rank),
        }
    }
}

/// Ordered, size-bounded list of articles
///
/// Insertion order is document order, which is also the display rank.
/// The list never grows past its limit, and the limit never exceeds
/// [`MAX_ARTICLES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleList {
    items: Vec<Article>,
    limit: usize,
}

impl ArticleList {
    /// Create an empty list capped at [`MAX_ARTICLES`]
    pub fn new() -> Self {
        Self::with_limit(MAX_ARTICLES)
    }

    /// Create an empty list with a smaller cap
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.min(MAX_ARTICLES);
        Self {
            items: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Append an article, returning `false` if the list is already full
    pub fn push(&mut self, article: Article) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(article);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Article] {
        &self.items
    }
}

impl Default for ArticleList {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for ArticleList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl FromIterator<Article> for ArticleList {
    /// Collects up to [`MAX_ARTICLES`] items; the rest are dropped
    fn from_iter<I: IntoIterator<Item = Article>>(iter: I) -> Self {
        let mut list = Self::new();
        for article in iter {
            if !list.push(article) {
                break;
            }
        }
        list
    }
}

impl<'a> IntoIterator for &'a ArticleList {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
