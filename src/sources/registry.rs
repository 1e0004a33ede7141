use super::TagSource;
use crate::error::Result;
use crate::http::{HttpClient, Page};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const REGISTRY_SERVICE: &str = "registry.docker.io";
/// Requested page size; registries may cap it lower and paginate.
const PAGE_SIZE: u32 = 10_000;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> String {
        self.token.or(self.access_token).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Official-image tags from a Docker registry v2 endpoint.
pub struct DockerRegistry {
    client: Arc<HttpClient>,
    registry_url: String,
    auth_url: String,
}

impl DockerRegistry {
    pub fn new(client: Arc<HttpClient>, registry_url: &str, auth_url: &str) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            auth_url: auth_url.to_string(),
        }
    }

    fn repository(stack: &str) -> String {
        if stack.contains('/') {
            stack.to_string()
        } else {
            format!("library/{}", stack)
        }
    }

    fn token(&self, repository: &str) -> Result<String> {
        let url = format!(
            "{}?service={}&scope=repository:{}:pull",
            self.auth_url, REGISTRY_SERVICE, repository
        );
        let response: TokenResponse = self.client.get_json_uncached(&url, None)?;
        Ok(response.into_token())
    }
}

impl TagSource for DockerRegistry {
    /// Follows `rel="next"` links until the listing ends. Pages still fresh in
    /// the response cache are read without a token round-trip.
    fn fetch_tags(&self, stack: &str) -> Result<Vec<String>> {
        let repository = Self::repository(stack);
        let mut next = Some(format!(
            "{}/v2/{}/tags/list?n={}",
            self.registry_url, repository, PAGE_SIZE
        ));
        let mut seen = HashSet::new();
        let mut token: Option<String> = None;
        let mut tags = Vec::new();

        while let Some(url) = next.take() {
            if !seen.insert(url.clone()) {
                warn!("Tag listing for {} links back to {}", stack, url);
                break;
            }

            let page: Page<TagList> = match self.client.fresh_json_page(&url)? {
                Some(page) => page,
                None => {
                    if token.is_none() {
                        token = Some(self.token(&repository)?);
                    }
                    self.client.get_json_page(&url, token.as_deref())?
                }
            };

            tags.extend(page.data.tags.unwrap_or_default());
            next = page.next;
        }

        debug!("Fetched {} tags for {} in {} page(s)", tags.len(), stack, seen.len());
        Ok(tags)
    }
}
