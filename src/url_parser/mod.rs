//! URL handling: normalization of discovered hrefs, seed validation and the
//! URL → file path mapping used for persisted pages.

pub mod normalizer;
pub mod path_mapper;
pub mod url_validator;

pub use normalizer::{normalize, NormalizedUrl};
pub use path_mapper::{map_url_to_path, path_extension};
pub use url_validator::{default_domain, validate_seed};
