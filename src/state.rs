use crate::client::BackendClient;
use crate::config::Config;
use crate::dashboard::ViewKey;
use crate::errors::FetchError;
use crate::generation::LatestView;
use crate::models::{CombinedDomains, CombinedEarnings};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub client: BackendClient,
    pub combined_earnings: Arc<LatestView<ViewKey, CombinedEarnings>>,
    pub combined_domains: Arc<LatestView<ViewKey, CombinedDomains>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            client: BackendClient::new(config)?,
            combined_earnings: LatestView::shared(),
            combined_domains: LatestView::shared(),
        })
    }
}
