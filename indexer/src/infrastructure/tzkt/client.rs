use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::TzktHttpConfig;
use crate::infrastructure::tzkt::error::TzktError;
use crate::infrastructure::tzkt::types::TzktDelegation;
use crate::infrastructure::tzkt::{check_limit, DelegationSource};

const DELEGATIONS_PATH: &str = "/v1/operations/delegations";

/// Client for the TzKT delegations endpoint
pub struct TzktClient {
    client: Client,
    endpoint: String,
}

impl TzktClient {
    /// Create a new client against `config.url`
    pub fn new(config: &TzktHttpConfig) -> Result<Self, TzktError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5).min(config.timeout))
            .build()
            .map_err(TzktError::Client)?;

        Ok(Self {
            client,
            endpoint: Self::endpoint_for(&config.url),
        })
    }

    fn endpoint_for(base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), DELEGATIONS_PATH)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_delegations(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<TzktDelegation>, TzktError> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(query)
            .build()
            .map_err(|source| TzktError::Http {
                url: self.endpoint.clone(),
                source,
            })?;
        let url = request.url().to_string();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| TzktError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();

        let body = response.bytes().await.map_err(|source| TzktError::Http {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(TzktError::Status {
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).chars().take(512).collect(),
            });
        }

        decode_page(&url, &body)
    }
}

/// Decodes a delegations array; only an empty body maps to `EndOfData`
pub fn decode_page(url: &str, body: &[u8]) -> Result<Vec<TzktDelegation>, TzktError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(TzktError::EndOfData);
    }

    serde_json::from_slice(body).map_err(|source| TzktError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl DelegationSource for TzktClient {
    fn implementation(&self) -> &'static str {
        "api"
    }

    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<Vec<TzktDelegation>, TzktError> {
        check_limit(limit)?;
        tracing::debug!(limit, offset, "fetching delegation page");
        self.get_delegations(&[("limit", limit.to_string()), ("offset", offset.to_string())])
            .await
    }

    async fn fetch_above_level(
        &self,
        level: u64,
        limit: u32,
    ) -> Result<Vec<TzktDelegation>, TzktError> {
        check_limit(limit)?;
        tracing::debug!(level, limit, "fetching delegations above level");
        self.get_delegations(&[("level.gt", level.to_string()), ("limit", limit.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_from_base_url() {
        assert_eq!(
            TzktClient::endpoint_for("https://api.tzkt.io/"),
            "https://api.tzkt.io/v1/operations/delegations"
        );
        assert_eq!(
            TzktClient::endpoint_for("http://localhost:5000"),
            "http://localhost:5000/v1/operations/delegations"
        );
    }

    #[test]
    fn empty_body_is_end_of_data() {
        assert!(decode_page("u", b"").unwrap_err().is_end_of_data());
        assert!(decode_page("u", b"  \n").unwrap_err().is_end_of_data());
    }

    #[test]
    fn truncated_body_is_decode_error() {
        for body in [
            &br#"[{"type":"delegation","id":1"#[..],
            br#"[{"type":"delegation","id":1,"level":10"#,
            b"[",
        ] {
            let err = decode_page("u", body).unwrap_err();
            assert!(!err.is_end_of_data());
            assert!(matches!(err, TzktError::Decode { .. }));
        }
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = decode_page("u", br#"{"code":400}"#).unwrap_err();
        assert!(matches!(err, TzktError::Decode { .. }));
    }

    #[test]
    fn empty_array_is_empty_page() {
        assert!(decode_page("u", b"[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_out_of_range_limits_before_any_request() {
        let client = TzktClient::new(&TzktHttpConfig {
            url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = client.fetch_page(0, 0).await.unwrap_err();
        assert!(matches!(err, TzktError::InvalidRequest(_)));
        let err = client.fetch_above_level(10, 10_001).await.unwrap_err();
        assert!(matches!(err, TzktError::InvalidRequest(_)));
    }
}
