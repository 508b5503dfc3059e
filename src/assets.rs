//! External outline assets: fetch, parse, cache
//!
//! Countries below the resolution of the bundled dataset have pre-traced
//! vector assets instead. Fetching is an external capability injected
//! through [`AssetFetcher`]; this module maps country names to filenames,
//! de-duplicates concurrent fetches, and parses documents down to
//! `viewBox` + raw path strings.

use crate::{OutlineError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Boxed future returned by [`AssetFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// External capability that retrieves an asset document by filename.
///
/// Implementations typically wrap an HTTP client or an application bundle.
/// The loader treats any error as "no outline"; it never propagates.
pub trait AssetFetcher: Send + Sync {
    fn fetch<'a>(&'a self, filename: &'a str) -> FetchFuture<'a>;
}

/// A parsed outline asset: the document's `viewBox` and the raw `d` string
/// of every path element, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraOutlineAsset {
    pub view_box: String,
    pub raw_paths: Vec<String>,
}

/// Built-in country-name → asset-filename table for countries absent from
/// the main dataset.
pub fn builtin_asset_table() -> HashMap<String, String> {
    [
        ("Andorra", "andorra.svg"),
        ("Gibraltar", "gibraltar.svg"),
        ("Liechtenstein", "liechtenstein.svg"),
        ("Malta", "malta.svg"),
        ("Monaco", "monaco.svg"),
        ("Nauru", "nauru.svg"),
        ("San Marino", "san-marino.svg"),
        ("Singapore", "singapore.svg"),
        ("Tuvalu", "tuvalu.svg"),
        ("Vatican City", "vatican-city.svg"),
    ]
    .into_iter()
    .map(|(name, file)| (name.to_lowercase(), file.to_string()))
    .collect()
}

type AssetCell = Arc<OnceCell<Option<Arc<ExtraOutlineAsset>>>>;

/// Cached, de-duplicated loader for external outline assets.
pub struct ExternalOutlineLoader {
    fetcher: Arc<dyn AssetFetcher>,
    table: HashMap<String, String>,
    /// One cell per filename. Concurrent requests for the same filename
    /// await a single in-flight initialization; a cancelled (dropped)
    /// initialization leaves the cell empty and the next request retries.
    cells: Mutex<HashMap<String, AssetCell>>,
}

impl ExternalOutlineLoader {
    /// Loader with the built-in name → filename table.
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self::with_table(fetcher, builtin_asset_table())
    }

    /// Loader with a caller-supplied table (keys are matched
    /// case-insensitively).
    pub fn with_table(fetcher: Arc<dyn AssetFetcher>, table: HashMap<String, String>) -> Self {
        let table = table
            .into_iter()
            .map(|(name, file)| (name.to_lowercase(), file))
            .collect();
        Self {
            fetcher,
            table,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// The asset filename mapped to a country, if any.
    pub fn filename_for(&self, country: &str) -> Option<&str> {
        self.table.get(&country.to_lowercase()).map(String::as_str)
    }

    /// Load (or return the cached) asset for a country.
    ///
    /// `None` means "no outline": the country has no mapping, the fetch
    /// failed, or the document had no usable paths. Failures are logged and
    /// remembered; they are never surfaced as errors.
    pub async fn load(&self, country: &str) -> Option<Arc<ExtraOutlineAsset>> {
        let filename = self.filename_for(country)?.to_string();

        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(filename.clone()).or_default().clone()
        };

        cell.get_or_init(|| self.fetch_and_parse(filename.clone()))
            .await
            .clone()
    }

    async fn fetch_and_parse(&self, filename: String) -> Option<Arc<ExtraOutlineAsset>> {
        let document = match self.fetcher.fetch(&filename).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(filename = %filename, "asset fetch failed: {err}");
                return None;
            }
        };

        match parse_asset_document(&document) {
            Ok(asset) => {
                tracing::debug!(filename = %filename, paths = asset.raw_paths.len(), "asset parsed");
                Some(Arc::new(asset))
            }
            Err(err) => {
                tracing::warn!(filename = %filename, "asset parse failed: {err}");
                None
            }
        }
    }
}

/// Extract `viewBox` and path `d` attributes from an asset document.
///
/// Only those two attributes matter; everything else in the document
/// (styling, groups, metadata) is ignored.
pub(crate) fn parse_asset_document(document: &str) -> Result<ExtraOutlineAsset> {
    let mut reader = Reader::from_str(document);
    let mut view_box = String::new();
    let mut raw_paths = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| OutlineError::AssetParse(e.to_string()))?
        {
            Event::Start(element) | Event::Empty(element) => match element.name().as_ref() {
                b"svg" => {
                    if let Some(value) = attribute(&element, "viewBox")? {
                        view_box = value;
                    }
                }
                b"path" => {
                    if let Some(value) = attribute(&element, "d")? {
                        raw_paths.push(value);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if raw_paths.is_empty() {
        return Err(OutlineError::AssetParse(
            "document has no path elements".to_string(),
        ));
    }

    Ok(ExtraOutlineAsset {
        view_box,
        raw_paths,
    })
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| OutlineError::AssetParse(e.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| OutlineError::AssetParse(e.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}
