// Cache validators for list responses

use sha2::{Digest, Sha256};

/// Cache lifetime for a past-year listing, which no longer changes much
pub const YEAR_MAX_AGE_SECS: u32 = 3_600;
pub const DEFAULT_MAX_AGE_SECS: u32 = 300;

pub fn cache_control(year: Option<i32>) -> String {
    let max_age = if year.is_some() {
        YEAR_MAX_AGE_SECS
    } else {
        DEFAULT_MAX_AGE_SECS
    };
    format!("public, max-age={max_age}")
}

/// Strong, quoted ETag: SHA-256 over the body salted with page and limit
pub fn etag(body: &[u8], page: u64, limit: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(format!("page:{page}").as_bytes());
    hasher.update(format!("limit:{limit}").as_bytes());
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether an `If-None-Match` header value matches `etag`
pub fn if_none_match(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}
