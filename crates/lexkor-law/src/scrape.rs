//! Article text extraction from statute pages.
//!
//! Prefers the page's main content region (`<article>`, `#content`,
//! `<main>`), then readability's extractor, then the whole page as text.

use std::io::Cursor;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article>").unwrap());
static CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:div|section)\b[^>]*\bid\s*=\s*["']content["'][^>]*>(.*?)(?:</body>|\z)"#)
        .unwrap()
});
static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body>|\z)").unwrap());

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<(script|style|noscript|head|nav|footer)\b[^>]*>.*?</(?:script|style|noscript|head|nav|footer)>")
        .unwrap()
});
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6]|section|article|dd|dt)>").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Extract readable article text from a statute page.
///
/// Returns an empty string when nothing readable is found.
pub fn extract_article_text(html: &str, page_url: &str) -> String {
    for (region, re) in [
        ("article", &*ARTICLE_RE),
        ("#content", &*CONTENT_RE),
        ("main", &*MAIN_RE),
    ] {
        if let Some(caps) = re.captures(html) {
            let text = html_to_text(&caps[1]);
            if !text.is_empty() {
                debug!(region, chars = text.chars().count(), "content region found");
                return text;
            }
        }
    }

    if let Some(text) = readable_text(html, page_url) {
        debug!(chars = text.chars().count(), "readability extraction used");
        return text;
    }

    let whole = BODY_RE
        .captures(html)
        .map(|c| html_to_text(&c[1]))
        .unwrap_or_else(|| html_to_text(html));
    debug!(chars = whole.chars().count(), "falling back to whole-page text");
    whole
}

/// Readability's main-text guess, if it produced anything.
pub fn readable_text(html: &str, page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let mut cursor = Cursor::new(html.as_bytes());
    let product = readability::extractor::extract(&mut cursor, &url).ok()?;
    let text = tidy_lines(&product.text);
    (!text.is_empty()).then_some(text)
}

/// Strip markup from an HTML fragment, keeping block boundaries as newlines.
pub fn html_to_text(html: &str) -> String {
    let text = NOISE_RE.replace_all(html, " ");
    let text = BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    tidy_lines(&decode_entities(&text))
}

fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|line| SPACES_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&middot;", "·")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.law.go.kr/법령/민법/제750조";

    #[test]
    fn article_region_wins() {
        let html = r#"<html><body>
            <nav>메뉴 홈 검색</nav>
            <article><h2>제750조(불법행위의 내용)</h2>
            <p>고의 또는 과실로 인한 위법행위로 타인에게 손해를 가한 자는 그 손해를 배상할 책임이 있다.</p></article>
            <footer>국가법령정보센터</footer>
        </body></html>"#;
        assert_eq!(
            extract_article_text(html, PAGE),
            "제750조(불법행위의 내용)\n고의 또는 과실로 인한 위법행위로 타인에게 손해를 가한 자는 그 손해를 배상할 책임이 있다."
        );
    }

    #[test]
    fn content_id_region() {
        let html = r#"<body><div class="top">헤더</div>
            <div id="content"><div class="pgroup"><p>제1조(목적) 이 법은 &lt;목적&gt;을 정한다.</p></div></div>
            <script>var x = "<p>noise</p>";</script></body>"#;
        let text = extract_article_text(html, PAGE);
        assert!(text.starts_with("제1조(목적) 이 법은 <목적>을 정한다."));
        assert!(!text.contains("헤더"));
        assert!(!text.contains("noise"));
    }

    #[test]
    fn whole_page_fallback() {
        let html = "<html><body><span>짧은</span> <b>본문</b></body></html>";
        let text = extract_article_text(html, "not a url");
        assert_eq!(text, "짧은 본문");
    }

    #[test]
    fn entities_and_breaks() {
        assert_eq!(
            html_to_text("가&nbsp;나<br/>다&#44592;&#x4E00;&amp;"),
            "가 나\n다기一&"
        );
    }
}
