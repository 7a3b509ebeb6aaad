use crate::config::Config;
use crate::errors::FetchError;
use crate::models::{
    Account, ConnectResponse, DateQuery, DeleteResponse, DomainBreakdownResponse,
    MultiAccountSummary, NewAccount, TodayEarnings, UploadResponse, ValidateResponse,
};
use reqwest::{multipart, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Typed client for the analytics backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.backend_url)
            .map_err(|err| FetchError::Validation(format!("invalid backend url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Validation(format!(
                "backend url {base_url} cannot carry a path"
            )));
        }
        let http = Client::builder().timeout(config.fetch_timeout).build()?;
        Ok(Self {
            http,
            base_url,
            timeout: config.fetch_timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, FetchError> {
        self.send(self.http.get(self.url(&["accounts"]))).await
    }

    pub async fn get_account(&self, account_key: &str) -> Result<Account, FetchError> {
        self.send(self.http.get(self.url(&["accounts", account_key])))
            .await
    }

    pub async fn active_account_keys(&self) -> Result<Vec<String>, FetchError> {
        Ok(self
            .list_accounts()
            .await?
            .into_iter()
            .filter(Account::is_active)
            .map(|account| account.account_key)
            .collect())
    }

    pub async fn today_earnings(
        &self,
        account_key: &str,
        query: &DateQuery,
    ) -> Result<TodayEarnings, FetchError> {
        query.validate()?;
        let request = self
            .http
            .get(self.url(&["today-earnings", account_key]))
            .query(&query.to_params());
        self.send(request).await
    }

    pub async fn domain_earnings(
        &self,
        account_key: &str,
        domain: Option<&str>,
        query: &DateQuery,
    ) -> Result<DomainBreakdownResponse, FetchError> {
        query.validate()?;
        let mut params = Vec::new();
        if let Some(domain) = domain {
            params.push(("domain", domain.to_string()));
        }
        params.extend(query.to_params());
        let request = self
            .http
            .get(self.url(&["domain-earnings", account_key]))
            .query(&params);
        self.send(request).await
    }

    /// Backend-side totals over all active accounts.
    pub async fn summary(&self, query: &DateQuery) -> Result<MultiAccountSummary, FetchError> {
        query.validate()?;
        let request = self.http.get(self.url(&["summary"])).query(&query.to_params());
        self.send(request).await
    }

    pub async fn connect_account(&self, account_key: &str) -> Result<ConnectResponse, FetchError> {
        self.send(self.http.get(self.url(&["accounts", account_key, "connect"])))
            .await
    }

    pub async fn validate_account(&self, account_key: &str) -> Result<ValidateResponse, FetchError> {
        self.send(self.http.get(self.url(&["accounts", account_key, "validate"])))
            .await
    }

    pub async fn delete_account(&self, account_key: &str) -> Result<DeleteResponse, FetchError> {
        let request = self
            .http
            .delete(self.url(&["accounts", account_key]))
            .query(&[("confirm", "true")]);
        self.send(request).await
    }

    /// Uploads an OAuth client-secrets file for a new account.
    pub async fn upload_account(
        &self,
        account: NewAccount,
        file_name: String,
        contents: Vec<u8>,
    ) -> Result<UploadResponse, FetchError> {
        if account.account_key.trim().is_empty() || account.display_name.trim().is_empty() {
            return Err(FetchError::Validation(
                "account_key and display_name are required".into(),
            ));
        }
        if contents.is_empty() {
            return Err(FetchError::Validation("credentials file is empty".into()));
        }

        let mut form = multipart::Form::new()
            .text("account_key", account.account_key)
            .text("display_name", account.display_name)
            .part("file", multipart::Part::bytes(contents).file_name(file_name));
        let optional = [
            ("account_id", account.account_id),
            ("description", account.description),
            ("website_url", account.website_url),
            ("category", account.category),
        ];
        for (name, value) in optional {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                form = form.text(name, value);
            }
        }

        self.send(self.http.post(self.url(&["accounts", "upload"])).multipart(form))
            .await
    }

    /// Appends `segments` to the base path. Each one is percent-encoded, so an
    /// account key can never add path components or a query string.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = request.send().await?;
        debug!(url = %response.url(), status = %response.status(), "backend responded");
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
}

/// Pulls a human-readable message out of a backend error body.
fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for field in ["detail", "message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "no details".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateFilter;

    fn unreachable_client() -> BackendClient {
        // Port 9 is discard; nothing should ever be sent there by these tests.
        BackendClient::new(&Config::new("http://127.0.0.1:9/api", Duration::from_secs(1))).unwrap()
    }

    #[tokio::test]
    async fn range_without_dates_fails_before_sending() {
        let client = unreachable_client();
        let query = DateQuery {
            date_filter: Some(DateFilter::Range),
            ..DateQuery::default()
        };

        let err = client.today_earnings("main", &query).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = client.domain_earnings("main", None, &query).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = client.summary(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }

    #[tokio::test]
    async fn upload_requires_key_and_name() {
        let client = unreachable_client();
        let err = client
            .upload_account(NewAccount::default(), "secrets.json".into(), b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(error_message(br#"{"detail":"Account not found"}"#), "Account not found");
        assert_eq!(error_message(br#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message(b"plain failure"), "plain failure");
        assert_eq!(error_message(b""), "no details");
    }

    #[test]
    fn urls_join_base_and_path() {
        let client = unreachable_client();
        assert_eq!(client.url(&["summary"]).as_str(), "http://127.0.0.1:9/api/summary");

        let slashed = BackendClient::new(&Config::new("http://127.0.0.1:9/", Duration::from_secs(1)))
            .unwrap();
        assert_eq!(slashed.url(&["accounts"]).as_str(), "http://127.0.0.1:9/accounts");
    }

    #[test]
    fn account_key_stays_in_one_segment() {
        let client = unreachable_client();

        let url = client.url(&["today-earnings", "x?date_filter=yesterday"]);
        assert_eq!(url.query(), None);
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/api/today-earnings/x%3Fdate_filter=yesterday"
        );

        let url = client.url(&["accounts", "a/../summary", "connect"]);
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(segments, ["api", "accounts", "a%2F..%2Fsummary", "connect"]);
    }

    #[test]
    fn invalid_backend_url_is_rejected() {
        let err = BackendClient::new(&Config::new("not a url", Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }
}
