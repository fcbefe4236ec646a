//! Scoped recursive site crawler that renders pages in a browser and mirrors
//! the rendered HTML to disk.

pub mod cli;
pub mod crawler;
pub mod extractor;
pub mod renderer;
pub mod settings;
pub mod storage;
pub mod url_parser;
pub mod utils;

pub use crawler::{CrawlConfig, CrawlSummary, Crawler, Frontier, ScopeFilter};
pub use renderer::{BrowserConfig, BrowserRenderer, PageResult, RenderError, Renderer};
pub use url_parser::NormalizedUrl;
