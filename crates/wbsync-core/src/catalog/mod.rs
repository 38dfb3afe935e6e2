//! Catalog discovery: find the resources to synchronize on an index page.
//!
//! A catalog is an HTML page (e.g. a downloads list) whose items link to the
//! files worth archiving. Items are matched with CSS selectors; the URL comes
//! from an attribute on the item or its first descendant carrying it.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::archive::{ArchiveError, ArchiveService};
use crate::capture::{Resource, SnapshotTarget};
use crate::retry::{run_with_retry, RetryPolicy};

/// How to pick resources out of a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// CSS selector matching one element per resource.
    pub selector: String,
    /// Attribute holding the resource URL.
    pub url_attr: String,
    /// CSS selector, relative to each item, for the title. Defaults to the
    /// item's own text.
    pub title_selector: Option<String>,
    /// CSS selector, relative to each item, for a version label.
    pub version_selector: Option<String>,
    /// Read the version label from this attribute (e.g. `alt` on an icon)
    /// instead of the element's text.
    pub version_attr: Option<String>,
}

impl CatalogQuery {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            url_attr: "href".to_string(),
            title_selector: None,
            version_selector: None,
            version_attr: None,
        }
    }

    pub fn with_url_attr(mut self, attr: impl Into<String>) -> Self {
        self.url_attr = attr.into();
        self
    }

    pub fn with_title_selector(mut self, selector: impl Into<String>) -> Self {
        self.title_selector = Some(selector.into());
        self
    }

    pub fn with_version_selector(mut self, selector: impl Into<String>, attr: Option<String>) -> Self {
        self.version_selector = Some(selector.into());
        self.version_attr = attr;
        self
    }
}

struct CompiledQuery {
    item: Selector,
    url_holder: Selector,
    title: Option<Selector>,
    version: Option<Selector>,
    url_attr: String,
    version_attr: Option<String>,
}

impl CompiledQuery {
    fn compile(query: &CatalogQuery) -> Result<Self> {
        let item = parse_selector(&query.selector)?;
        let url_holder = parse_selector(&format!("[{}]", query.url_attr))?;
        let title = query
            .title_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let version = query
            .version_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        Ok(Self {
            item,
            url_holder,
            title,
            version,
            url_attr: query.url_attr.clone(),
            version_attr: query.version_attr.clone(),
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid CSS selector {:?}: {}", css, e))
}

/// Resources linked from `html`, resolved against `base_url`, deduplicated by
/// URL in document order. Items without a usable URL are skipped.
pub fn extract_resources(html: &str, base_url: &str, query: &CatalogQuery) -> Result<Vec<Resource>> {
    let compiled = CompiledQuery::compile(query)?;
    let base = url::Url::parse(base_url).with_context(|| format!("invalid base URL {}", base_url))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in document.select(&compiled.item) {
        let Some(raw) = url_of(&item, &compiled) else {
            continue;
        };
        let Ok(resolved) = base.join(raw.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }
        let mut resource = Resource::new(url);
        if let Some(title) = title_of(&item, &compiled) {
            resource = resource.with_title(title);
        }
        if let Some(version) = version_of(&item, &compiled) {
            resource = resource.with_version(version);
        }
        out.push(resource);
    }
    Ok(out)
}

fn url_of<'a>(item: &ElementRef<'a>, q: &CompiledQuery) -> Option<&'a str> {
    item.value()
        .attr(&q.url_attr)
        .or_else(|| {
            item.select(&q.url_holder)
                .next()
                .and_then(|el| el.value().attr(&q.url_attr))
        })
        .filter(|s| !s.trim().is_empty())
}

fn title_of(item: &ElementRef<'_>, q: &CompiledQuery) -> Option<String> {
    let text = match &q.title {
        Some(sel) => element_text(&item.select(sel).next()?),
        None => element_text(item),
    };
    (!text.is_empty()).then_some(text)
}

fn version_of(item: &ElementRef<'_>, q: &CompiledQuery) -> Option<String> {
    let el = item.select(q.version.as_ref()?).next()?;
    let text = match &q.version_attr {
        Some(attr) => el.value().attr(attr)?.split_whitespace().collect::<Vec<_>>().join(" "),
        None => element_text(&el),
    };
    (!text.is_empty()).then_some(text)
}

/// Visible text, whitespace-collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch the catalog page and extract its resources.
///
/// With `across_timeline`, every archived capture of the page is scanned as
/// well and the results are merged (live page first, then captures oldest to
/// newest), which finds files that have since been removed from the page.
/// A capture that fails to fetch is skipped; a failed timeline is an error.
/// Blocks; async callers use `spawn_blocking`.
pub fn discover(
    service: &dyn ArchiveService,
    catalog_url: &str,
    query: &CatalogQuery,
    across_timeline: bool,
    retry: &RetryPolicy,
) -> Result<Vec<Resource>> {
    // Fail fast on a bad selector before any network traffic.
    CompiledQuery::compile(query)?;

    let mut pages: Vec<(String, Vec<u8>)> = Vec::new();
    match run_with_retry(retry, |_| service.snapshot(catalog_url, &SnapshotTarget::Live)) {
        Ok(snapshot) => pages.push(("live".to_string(), snapshot.body)),
        Err(e) if across_timeline => {
            tracing::warn!(url = %catalog_url, "live catalog fetch failed: {}", e)
        }
        Err(e) => return Err(e).with_context(|| format!("fetch catalog {}", catalog_url)),
    }

    if across_timeline {
        let mut timeline = run_with_retry(retry, |_| service.timeline(catalog_url))
            .with_context(|| format!("catalog timeline {}", catalog_url))?;
        timeline.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        timeline.dedup_by(|a, b| a.timestamp == b.timestamp);
        tracing::info!(url = %catalog_url, captures = timeline.len(), "scanning catalog timeline");
        for entry in timeline {
            let target = SnapshotTarget::Archived(entry.timestamp.clone());
            match run_with_retry(retry, |_| service.snapshot(&entry.url, &target)) {
                Ok(snapshot) => pages.push((entry.timestamp.to_string(), snapshot.body)),
                Err(ArchiveError::NotFound { .. }) => {
                    tracing::debug!(timestamp = %entry.timestamp, "catalog capture no longer served")
                }
                Err(e) => {
                    tracing::warn!(timestamp = %entry.timestamp, "catalog capture failed: {}", e)
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut resources = Vec::new();
    for (label, body) in pages {
        let html = String::from_utf8_lossy(&body);
        let found = extract_resources(&html, catalog_url, query)?;
        tracing::debug!(capture = %label, found = found.len(), "catalog page parsed");
        for resource in found {
            if seen.insert(resource.url.clone()) {
                resources.push(resource);
            }
        }
    }
    Ok(resources)
}
