//! Blocking HTTP client shared by every remote source.
//!
//! One [`HttpClient`] is built per process and handed to the sources
//! explicitly. GET responses go through the optional [`ResponseCache`]: fresh
//! entries are served from disk, stale ones are revalidated with their ETag.

mod cache;

pub use cache::{CacheEntry, ResponseCache};

use crate::config::StackboxConfig;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderName, ACCEPT, AUTHORIZATION, ETAG, IF_NONE_MATCH, LINK};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One decoded page of a paginated feed.
#[derive(Debug)]
pub struct Page<T> {
    pub data: T,
    /// Absolute URL of the following page, from a `Link: <...>; rel="next"` header.
    pub next: Option<String>,
}

struct Fetched {
    body: String,
    link: Option<String>,
}

impl From<CacheEntry> for Fetched {
    fn from(entry: CacheEntry) -> Self {
        Self {
            body: entry.body,
            link: entry.link,
        }
    }
}

pub struct HttpClient {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpClient {
    pub fn new(config: &StackboxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| Error::Client { source })?;

        let cache = config
            .effective_cache_dir()
            .map(|dir| ResponseCache::new(dir.clone(), config.cache_ttl()));

        Ok(Self { client, cache })
    }

    pub fn with_cache(client: Client, cache: Option<ResponseCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// GET through the response cache, decoding the body as JSON.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T> {
        let fetched = self.get_cached(url, token)?;
        decode(url, &fetched.body)
    }

    /// Like [`get_json`](Self::get_json), also returning the next page link.
    pub fn get_json_page<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Page<T>> {
        let fetched = self.get_cached(url, token)?;
        page(url, fetched)
    }

    /// A page answered from a fresh cache entry alone, without any request.
    pub fn fresh_json_page<T: DeserializeOwned>(&self, url: &str) -> Result<Option<Page<T>>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        match cache.load(url) {
            Some(entry) if entry.is_fresh(cache.ttl()) => {
                debug!("Cache hit: {}", url);
                page(url, entry.into()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// GET bypassing the cache, for short-lived responses such as auth tokens.
    pub fn get_json_uncached<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<T> {
        let response = self.send(self.request(url, token), url)?;
        let fetched = read_success(response, url)?;
        decode(url, &fetched.body)
    }

    fn get_cached(&self, url: &str, token: Option<&str>) -> Result<Fetched> {
        let Some(cache) = &self.cache else {
            let response = self.send(self.request(url, token), url)?;
            return read_success(response, url);
        };

        let cached = cache.load(url);
        if let Some(entry) = &cached {
            if entry.is_fresh(cache.ttl()) {
                debug!("Cache hit: {}", url);
                return Ok(entry.clone().into());
            }
        }

        let mut request = self.request(url, token);
        if let Some(etag) = cached.as_ref().and_then(|e| e.etag.as_deref()) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = self.send(request, url)?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached {
                debug!("Cache revalidated: {}", url);
                if let Err(e) = cache.refresh(entry.clone()) {
                    warn!("Failed to refresh cache entry for {}: {}", url, e);
                }
                return Ok(entry.into());
            }
        }

        if !status.is_success() {
            if let Err(e) = cache.invalidate(url) {
                warn!("Failed to drop cache entry for {}: {}", url, e);
            }
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let etag = header(&response, ETAG);
        let fetched = read_body(response, url)?;
        debug!("Cache store: {}", url);
        if let Err(e) = cache.store(url, etag, fetched.link.clone(), fetched.body.clone()) {
            warn!("Failed to cache response for {}: {}", url, e);
        }
        Ok(fetched)
    }

    fn request(&self, url: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, "application/json");
        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        request.send().map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })
    }
}

fn header(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn read_success(response: Response, url: &str) -> Result<Fetched> {
    if !response.status().is_success() {
        return Err(Error::Http {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    read_body(response, url)
}

fn read_body(response: Response, url: &str) -> Result<Fetched> {
    let link = header(&response, LINK);
    let body = response.text().map_err(|source| Error::Request {
        url: url.to_string(),
        source,
    })?;
    Ok(Fetched { body, link })
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

fn page<T: DeserializeOwned>(url: &str, fetched: Fetched) -> Result<Page<T>> {
    let data = decode(url, &fetched.body)?;
    let next = fetched
        .link
        .as_deref()
        .and_then(|link| next_link(url, link));
    Ok(Page { data, next })
}

/// Resolves the `rel="next"` target of a `Link` header against `base`.
pub fn next_link(base: &str, link: &str) -> Option<String> {
    let target = link.split(',').find_map(|part| {
        let (uri, params) = part.trim().split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        is_next.then(|| uri.trim().trim_start_matches('<').trim_end_matches('>'))
    })?;

    match Url::parse(base).and_then(|base| base.join(target)) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!("Ignoring unusable next link {:?}: {}", target, e);
            None
        }
    }
}

/// Minimal HTTP/1.1 responder for exercising the client against real sockets.
#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    pub(crate) fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        );
        for (name, value) in headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }

    /// Answers one connection per canned response, in order. The join handle
    /// yields the lowercased request heads.
    pub(crate) fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.ends_with(b"\r\n\r\n") {
                        let n = stream.read(&mut buf).unwrap();
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&buf[..n]);
                    }
                    stream.write_all(response.as_bytes()).unwrap();
                    String::from_utf8_lossy(&request).to_lowercase()
                })
                .collect()
        });

        (base, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{response, serve};
    use super::*;
    use serde::Deserialize;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Tags {
        tags: Vec<String>,
    }

    // Nothing listens on the discard port, so any real request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9/v2/library/node/tags/list";

    fn client_with_ttl(dir: &Path, ttl: Duration) -> HttpClient {
        let cache = ResponseCache::new(dir, ttl);
        let client = Client::builder().no_proxy().build().unwrap();
        HttpClient::with_cache(client, Some(cache))
    }

    fn client(dir: &TempDir) -> HttpClient {
        client_with_ttl(dir.path(), Duration::from_secs(3600))
    }

    #[test]
    fn test_fresh_entry_served_without_request() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        client
            .cache()
            .unwrap()
            .store(UNREACHABLE, None, None, r#"{"tags":["20.11.1"]}"#.to_string())
            .unwrap();

        let tags: Tags = client.get_json(UNREACHABLE, None).unwrap();
        assert_eq!(tags.tags, vec!["20.11.1"]);
    }

    #[test]
    fn test_cached_body_must_decode() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        client
            .cache()
            .unwrap()
            .store(UNREACHABLE, None, None, "<html>".to_string())
            .unwrap();

        let result: Result<Tags> = client.get_json(UNREACHABLE, None);
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_transport_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);

        let result: Result<Tags> = client.get_json(UNREACHABLE, None);
        match result {
            Err(Error::Request { url, .. }) => assert_eq!(url, UNREACHABLE),
            other => panic!("expected Request error, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_entry_revalidated_with_etag() {
        let dir = TempDir::new().unwrap();
        let (base, server) = serve(vec![response("304 Not Modified", &[], "")]);
        let url = format!("{}/v2/library/node/tags/list", base);
        let client = client_with_ttl(dir.path(), Duration::ZERO);
        let cache = client.cache().unwrap();
        cache
            .store(&url, Some("\"v1\"".to_string()), None, r#"{"tags":["20.11.1"]}"#.to_string())
            .unwrap();
        let before = cache.load(&url).unwrap().fetched_at;

        let tags: Tags = client.get_json(&url, None).unwrap();

        assert_eq!(tags.tags, vec!["20.11.1"]);
        let requests = server.join().unwrap();
        assert!(requests[0].contains("if-none-match: \"v1\""));
        assert!(cache.load(&url).unwrap().fetched_at >= before);
    }

    #[test]
    fn test_error_status_drops_entry() {
        let dir = TempDir::new().unwrap();
        let (base, server) = serve(vec![response("404 Not Found", &[], "")]);
        let url = format!("{}/v2/library/nope/tags/list", base);
        let client = client_with_ttl(dir.path(), Duration::ZERO);
        let cache = client.cache().unwrap();
        cache
            .store(&url, Some("\"v1\"".to_string()), None, "{}".to_string())
            .unwrap();

        let result: Result<Tags> = client.get_json(&url, None);

        match result {
            Err(Error::Http { url: failed, status }) => {
                assert_eq!(failed, url);
                assert_eq!(status, 404);
            }
            other => panic!("expected Http error, got {:?}", other),
        }
        assert!(cache.load(&url).is_none());
        server.join().unwrap();
    }

    #[test]
    fn test_unwritable_cache_still_returns_body() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("cache");
        std::fs::write(&blocker, "not a directory").unwrap();
        let (base, server) = serve(vec![response(
            "200 OK",
            &[("ETag", "\"v2\"")],
            r#"{"tags":["21.6.1"]}"#,
        )]);
        let url = format!("{}/v2/library/node/tags/list", base);
        let client = client_with_ttl(&blocker, Duration::from_secs(3600));

        let tags: Tags = client.get_json(&url, None).unwrap();

        assert_eq!(tags.tags, vec!["21.6.1"]);
        server.join().unwrap();
    }

    #[test]
    fn test_page_carries_next_link() {
        let dir = TempDir::new().unwrap();
        let (base, server) = serve(vec![response(
            "200 OK",
            &[("Link", "</v2/library/node/tags/list?last=20.11.1&n=1>; rel=\"next\"")],
            r#"{"tags":["20.11.1"]}"#,
        )]);
        let url = format!("{}/v2/library/node/tags/list?n=1", base);
        let client = client(&dir);

        let page: Page<Tags> = client.get_json_page(&url, None).unwrap();
        server.join().unwrap();

        let expected = format!("{}/v2/library/node/tags/list?last=20.11.1&n=1", base);
        assert_eq!(page.next.as_deref(), Some(expected.as_str()));
        let cached: Page<Tags> = client.fresh_json_page(&url).unwrap().unwrap();
        assert_eq!(cached.next.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_next_link_parsing() {
        let base = "https://registry.example/v2/library/node/tags/list?n=2";
        assert_eq!(
            next_link(base, r#"<https://other.example/page2>; rel="next""#).as_deref(),
            Some("https://other.example/page2")
        );
        assert_eq!(
            next_link(base, r#"</prev>; rel="prev", </v2/x?last=b>; rel="next""#).as_deref(),
            Some("https://registry.example/v2/x?last=b")
        );
        assert!(next_link(base, r#"</prev>; rel="prev""#).is_none());
    }

    #[test]
    fn test_new_honours_disabled_cache() {
        let config = StackboxConfig {
            cache_enabled: false,
            ..StackboxConfig::default()
        };
        let client = HttpClient::new(&config).unwrap();
        assert!(client.cache().is_none());
    }
}
