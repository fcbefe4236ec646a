use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::url_parser::{normalize, NormalizedUrl};

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid CSS"));

/// Collects every anchor target in `html`, resolved against `page_url`.
///
/// Only `<a href>` elements are considered; images, scripts and stylesheets
/// are never followed. Hrefs that fail to resolve are dropped, and the same
/// target linked several times on one page appears once.
pub fn extract_links(html: &str, page_url: &NormalizedUrl) -> BTreeSet<NormalizedUrl> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();
    let mut anchors = 0usize;

    for element in document.select(&ANCHOR_SELECTOR) {
        anchors += 1;
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match normalize(page_url, href) {
            Some(url) => {
                trace!("Found link {} on {}", url, page_url);
                links.insert(url);
            }
            None => continue,
        }
    }

    debug!("Extracted {} unique links from {} anchors on {}", links.len(), anchors, page_url);
    links
}
