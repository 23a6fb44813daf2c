mod url;

pub use url::{BatchResponseItem, ShortenRequest, ShortenResponse};
