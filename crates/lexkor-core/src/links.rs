//! Statute URL builders and the "related links" block for answers.
//!
//! Two URL forms exist for the same article:
//!
//! - **Deep link**: statute name and article label embedded verbatim in the
//!   path (`/법령/민법/제839조의2`). Human-readable; used for scraping and for
//!   links shown to users.
//! - **Pretty URL**: the same path with each segment percent-encoded. Used as
//!   the last-resort fallback where a strictly valid URL matters more than
//!   readability.

use std::collections::BTreeSet;

use crate::article::normalize_article_label;
use crate::citation::{ArticleCitation, extract_citations};

/// Heading that marks the related-links block at the end of an answer.
pub const RELATED_LINKS_HEADING: &str = "### 관련 조문 바로가기";

/// Deep link: `<base>/법령/<law>/<article>`, unescaped. Empty article → statute page.
pub fn deep_link_url(base: &str, law_name: &str, article_label: &str) -> String {
    let base = base.trim_end_matches('/');
    let law = law_name.trim();
    let article = normalize_article_label(article_label);
    if article.is_empty() {
        format!("{base}/법령/{law}")
    } else {
        format!("{base}/법령/{law}/{article}")
    }
}

/// Percent-encoded article URL. Empty article → percent-encoded statute page.
pub fn pretty_url(base: &str, law_name: &str, article_label: &str) -> String {
    let base = base.trim_end_matches('/');
    let root = urlencoding::encode("법령");
    let law = urlencoding::encode(law_name.trim());
    let article = normalize_article_label(article_label);
    if article.is_empty() {
        format!("{base}/{root}/{law}")
    } else {
        format!("{base}/{root}/{law}/{}", urlencoding::encode(&article))
    }
}

/// Percent-encoded statute main page (no article).
pub fn statute_main_url(base: &str, law_name: &str) -> String {
    pretty_url(base, law_name, "")
}

/// Renders and merges the related-links block into model answers.
#[derive(Debug, Clone)]
pub struct LinkComposer {
    base_url: String,
}

impl LinkComposer {
    /// `base_url` is the statute site root, e.g. `https://www.law.go.kr`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Article citations in `text`, deduplicated and ordered.
    pub fn extract(&self, text: &str) -> BTreeSet<ArticleCitation> {
        extract_citations(text)
    }

    /// Markdown block with one deep link per citation, or `""` when there are none.
    ///
    /// Link destinations are wrapped in `<…>` so names containing spaces stay
    /// a single CommonMark destination without percent-encoding.
    pub fn render(&self, citations: &BTreeSet<ArticleCitation>) -> String {
        if citations.is_empty() {
            return String::new();
        }
        let mut out = String::from(RELATED_LINKS_HEADING);
        out.push('\n');
        for c in citations {
            let url = deep_link_url(&self.base_url, &c.law_name, &c.article_label);
            out.push_str(&format!("- [{} {}](<{}>)\n", c.law_name, c.article_label, url));
        }
        out
    }

    /// Replace (or append) the related-links block for the citations in `text`.
    ///
    /// Citations are taken from the body only, never from a previous block, so
    /// `merge(merge(t)) == merge(t)`. Text without citations or a previous
    /// block is returned unchanged.
    pub fn merge(&self, text: &str) -> String {
        let (body, had_block) = split_related_block(text);
        let block = self.render(&self.extract(body));

        match (block.is_empty(), had_block) {
            (true, false) => text.to_string(),
            (true, true) => body.trim_end().to_string(),
            (false, _) => format!("{}\n\n{}", body.trim_end(), block),
        }
    }
}

/// Split `text` into (body, whether a related-links block followed it).
fn split_related_block(text: &str) -> (&str, bool) {
    match text.rfind(RELATED_LINKS_HEADING) {
        Some(idx) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.law.go.kr";

    #[test]
    fn deep_link_is_unescaped() {
        assert_eq!(
            deep_link_url(BASE, "민법", "839조의2"),
            "https://www.law.go.kr/법령/민법/제839조의2"
        );
        assert_eq!(deep_link_url(BASE, "민법", ""), "https://www.law.go.kr/법령/민법");
    }

    #[test]
    fn pretty_url_is_percent_encoded() {
        let url = pretty_url(BASE, "민법", "제750조");
        assert!(url.is_ascii());
        assert!(url.starts_with("https://www.law.go.kr/%EB%B2%95%EB%A0%B9/%EB%AF%BC%EB%B2%95/"));
        assert_eq!(
            statute_main_url(BASE, "민법"),
            "https://www.law.go.kr/%EB%B2%95%EB%A0%B9/%EB%AF%BC%EB%B2%95"
        );
    }

    #[test]
    fn render_empty_for_no_citations() {
        let composer = LinkComposer::new(BASE);
        assert_eq!(composer.render(&BTreeSet::new()), "");
    }

    #[test]
    fn render_sorted_links() {
        let composer = LinkComposer::new(BASE);
        let mut set = BTreeSet::new();
        set.insert(ArticleCitation::new("형법", "제250조"));
        set.insert(ArticleCitation::new("민법", "제750조"));
        let block = composer.render(&set);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], RELATED_LINKS_HEADING);
        assert_eq!(
            lines[1],
            "- [민법 제750조](<https://www.law.go.kr/법령/민법/제750조>)"
        );
        assert_eq!(
            lines[2],
            "- [형법 제250조](<https://www.law.go.kr/법령/형법/제250조>)"
        );
    }

    #[test]
    fn merge_appends_block() {
        let composer = LinkComposer::new(BASE);
        let merged = composer.merge("민법 제839조의2에 따르면 재산분할을 청구할 수 있습니다.\n");
        assert!(merged.starts_with("민법 제839조의2에 따르면"));
        assert!(merged.contains(RELATED_LINKS_HEADING));
        assert!(merged.contains("(<https://www.law.go.kr/법령/민법/제839조의2>)"));
    }

    #[test]
    fn merge_is_idempotent() {
        let composer = LinkComposer::new(BASE);
        for text in [
            "민법 제839조의2에 따르면...",
            "형소법 제200조와 형법 제250조",
            "인용 없는 답변입니다.",
            "",
            "본문\n\n### 관련 조문 바로가기\n- [옛 링크](<x>)\n",
        ] {
            let once = composer.merge(text);
            assert_eq!(composer.merge(&once), once, "input: {text:?}");
        }
    }

    #[test]
    fn merge_replaces_stale_block() {
        let composer = LinkComposer::new(BASE);
        let text = "민법 제750조 참고\n\n### 관련 조문 바로가기\n- [형법 제1조](<old>)\n";
        let merged = composer.merge(text);
        assert_eq!(merged.matches(RELATED_LINKS_HEADING).count(), 1);
        assert!(merged.contains("민법 제750조](<"));
        assert!(!merged.contains("형법 제1조"));
    }

    #[test]
    fn merge_without_citations_is_identity() {
        let composer = LinkComposer::new(BASE);
        let text = "일반적인 상담 답변입니다.\n";
        assert_eq!(composer.merge(text), text);
    }
}
