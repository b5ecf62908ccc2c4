//! DRF statute search: find the official detail link for a law.
//!
//! Queries `lawSearch.do` directly with the `OC` service key, or the
//! pass-through proxy's `/search` when one is configured. The XML answer is
//! scanned with regexes rather than parsed; `<법령상세링크>` may be bare text
//! or CDATA-wrapped.

use std::sync::LazyLock;

use lexkor_core::Settings;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::LawClient;
use crate::error::LawError;

pub const PROXY_TOKEN_HEADER: &str = "X-Proxy-Token";

static LAW_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<law\b[^>]*>(.*?)</law>").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("법령명한글"));
static DETAIL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("법령상세링크"));

fn tag_re(tag: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)<{tag}>\s*(?:<!\[CDATA\[(.*?)\]\]>|([^<]*))\s*</{tag}>"
    ))
    .unwrap()
}

/// Text content of the first `re` match, CDATA or bare.
fn tag_text(re: &Regex, xml: &str) -> Option<String> {
    let caps = re.captures(xml)?;
    let text = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    (!text.is_empty()).then(|| text.replace("&amp;", "&"))
}

/// Pick the detail link for `law_name` out of a `lawSearch` XML response.
///
/// The entry whose `<법령명한글>` equals `law_name` wins; otherwise the
/// first entry with a link. Responses without `<law>` wrappers are scanned
/// as a single entry.
pub fn parse_detail_link(xml: &str, law_name: &str) -> Option<String> {
    let entries: Vec<&str> = LAW_ENTRY_RE
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if entries.is_empty() {
        return tag_text(&DETAIL_LINK_RE, xml);
    }

    let exact = entries.iter().find(|entry| {
        tag_text(&NAME_RE, entry).is_some_and(|name| name.trim() == law_name)
    });
    if let Some(link) = exact.and_then(|entry| tag_text(&DETAIL_LINK_RE, entry)) {
        return Some(link);
    }
    entries
        .iter()
        .find_map(|entry| tag_text(&DETAIL_LINK_RE, entry))
}

/// Make a site-relative link absolute against `base`.
pub fn absolutize(link: &str, base: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{}{link}", base.trim_end_matches('/'))
    } else {
        format!("{}/{link}", base.trim_end_matches('/'))
    }
}

/// Point a detail link at one article via the `JO` parameter.
pub fn with_jo(link: &str, jo: &str) -> String {
    if jo.is_empty() || link.contains("JO=") {
        return link.to_string();
    }
    let sep = if link.contains('?') { '&' } else { '?' };
    format!("{link}{sep}JO={jo}")
}

/// Where DRF searches are sent.
enum Route {
    Direct { url: String, key: SecretString },
    Proxy { url: String, token: Option<SecretString>, key: Option<SecretString> },
}

/// DRF search client. Unconfigured when neither a key nor a proxy is set.
pub struct DrfClient {
    client: LawClient,
    route: Option<Route>,
    law_base_url: String,
}

impl DrfClient {
    pub fn new(client: LawClient, settings: &Settings) -> Self {
        let route = match (&settings.proxy_url, &settings.drf_service_key) {
            (Some(proxy), key) => Some(Route::Proxy {
                url: format!("{}/search", proxy.trim_end_matches('/')),
                token: settings.proxy_token.clone(),
                key: key.clone(),
            }),
            (None, Some(key)) => Some(Route::Direct {
                url: format!("{}/lawSearch.do", settings.drf_base_url.trim_end_matches('/')),
                key: key.clone(),
            }),
            (None, None) => None,
        };
        Self {
            client,
            route,
            law_base_url: settings.law_base_url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.route.is_some()
    }

    /// Absolute detail link for `law_name`.
    pub async fn detail_link(&self, law_name: &str) -> Result<String, LawError> {
        let route = self.route.as_ref().ok_or(LawError::NotConfigured)?;
        let mut query: Vec<(&str, &str)> =
            vec![("target", "law"), ("type", "XML"), ("query", law_name)];

        let xml = match route {
            Route::Direct { url, key } => {
                query.insert(0, ("OC", key.expose_secret()));
                info!(url = %url, law = %law_name, "DRF search");
                self.client.get_with(url, &query, &[]).await?
            }
            Route::Proxy { url, token, key } => {
                if let Some(key) = key {
                    query.insert(0, ("OC", key.expose_secret()));
                }
                let headers: Vec<(&str, &str)> = token
                    .iter()
                    .map(|t| (PROXY_TOKEN_HEADER, t.expose_secret()))
                    .collect();
                info!(url = %url, law = %law_name, "DRF search via proxy");
                self.client.get_with(url, &query, &headers).await?
            }
        };

        let link = parse_detail_link(&xml, law_name)
            .ok_or_else(|| LawError::NoDetailLink(law_name.to_string()))?;
        let link = absolutize(&link, &self.law_base_url);
        debug!(link = %link, "DRF detail link");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LawSearch>
  <totalCnt>2</totalCnt>
  <law id="1">
    <법령명한글><![CDATA[민법 시행법]]></법령명한글>
    <법령상세링크><![CDATA[/DRF/lawService.do?OC=test&target=law&MST=1111&type=HTML]]></법령상세링크>
  </law>
  <law id="2">
    <법령명한글><![CDATA[민법]]></법령명한글>
    <법령상세링크>/DRF/lawService.do?OC=test&amp;target=law&amp;MST=265307&amp;type=HTML</법령상세링크>
  </law>
</LawSearch>"#;

    #[test]
    fn exact_name_match_wins() {
        assert_eq!(
            parse_detail_link(SEARCH_XML, "민법").as_deref(),
            Some("/DRF/lawService.do?OC=test&target=law&MST=265307&type=HTML")
        );
    }

    #[test]
    fn falls_back_to_first_entry() {
        assert_eq!(
            parse_detail_link(SEARCH_XML, "형법").as_deref(),
            Some("/DRF/lawService.do?OC=test&target=law&MST=1111&type=HTML")
        );
        assert_eq!(parse_detail_link("<LawSearch><totalCnt>0</totalCnt></LawSearch>", "형법"), None);
    }

    #[test]
    fn unwrapped_response() {
        let xml = "<법령상세링크> https://www.law.go.kr/x?MST=1 </법령상세링크>";
        assert_eq!(parse_detail_link(xml, "").as_deref(), Some("https://www.law.go.kr/x?MST=1"));
    }

    #[test]
    fn link_helpers() {
        assert_eq!(absolutize("/DRF/a", "https://www.law.go.kr/"), "https://www.law.go.kr/DRF/a");
        assert_eq!(absolutize("https://x/y", "https://www.law.go.kr"), "https://x/y");
        assert_eq!(with_jo("https://x/a?MST=1", "075000"), "https://x/a?MST=1&JO=075000");
        assert_eq!(with_jo("https://x/a", "075000"), "https://x/a?JO=075000");
        assert_eq!(with_jo("https://x/a?JO=1", "075000"), "https://x/a?JO=1");
        assert_eq!(with_jo("https://x/a", ""), "https://x/a");
    }

    fn settings(server: &MockServer) -> Settings {
        Settings {
            drf_base_url: format!("{}/DRF", server.uri()),
            law_base_url: "https://www.law.go.kr".to_string(),
            ..Settings::default()
        }
    }

    fn law_client() -> LawClient {
        LawClient::new(Duration::from_secs(3)).unwrap()
    }

    #[tokio::test]
    async fn direct_search_uses_service_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/DRF/lawSearch.do"))
            .and(query_param("OC", "lexkor"))
            .and(query_param("target", "law"))
            .and(query_param("type", "XML"))
            .and(query_param("query", "민법"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_XML))
            .expect(1)
            .mount(&server)
            .await;

        let mut s = settings(&server);
        s.drf_service_key = Some(SecretString::from("lexkor".to_string()));
        let drf = DrfClient::new(law_client(), &s);
        assert!(drf.is_configured());
        assert_eq!(
            drf.detail_link("민법").await.unwrap(),
            "https://www.law.go.kr/DRF/lawService.do?OC=test&target=law&MST=265307&type=HTML"
        );
    }

    #[tokio::test]
    async fn proxy_search_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(header(PROXY_TOKEN_HEADER, "s3cret"))
            .and(query_param("query", "민법"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_XML))
            .expect(1)
            .mount(&server)
            .await;

        let s = Settings {
            proxy_url: Some(format!("{}/", server.uri())),
            proxy_token: Some(SecretString::from("s3cret".to_string())),
            ..Settings::default()
        };
        let link = DrfClient::new(law_client(), &s).detail_link("민법").await.unwrap();
        assert!(link.ends_with("MST=265307&type=HTML"));
    }

    #[tokio::test]
    async fn unconfigured_is_reported() {
        let drf = DrfClient::new(law_client(), &Settings::default());
        assert!(!drf.is_configured());
        assert!(matches!(drf.detail_link("민법").await, Err(LawError::NotConfigured)));
    }

    #[tokio::test]
    async fn empty_result_is_no_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<LawSearch/>"))
            .mount(&server)
            .await;

        let mut s = settings(&server);
        s.drf_service_key = Some(SecretString::from("k".to_string()));
        let err = DrfClient::new(law_client(), &s).detail_link("없는법").await.unwrap_err();
        assert!(matches!(err, LawError::NoDetailLink(_)));
    }
}
