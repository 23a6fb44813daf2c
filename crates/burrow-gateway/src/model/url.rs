use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}
