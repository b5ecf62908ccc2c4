//! Article label parsing for Korean statutes.
//!
//! Parses article references (e.g., "제839조의2", "839조의2", "839-2") into a
//! structured [`ArticleNo`] so that differently-written labels resolve to the
//! same deep link, and derives the 6-digit `jo` code used by the DRF service.
//!
//! # Korean article numbering conventions
//!
//! - Plain article: 제1조, 제2조, ..., 제1118조
//! - Branch article (inserted by amendment): 제839조의2 between 제839조 and 제840조
//! - Double branch (rare): 제5조의2의3
//! - Paragraph/item references follow the article: 제839조의2제1항제3호

/// A parsed article number: base article plus up to two branch suffixes.
///
/// Ordering follows document order: 제839조 < 제839조의2 < 제839조의3 < 제840조.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleNo {
    pub number: u32,
    pub branch: Option<u32>,
    pub sub_branch: Option<u32>,
}

impl ArticleNo {
    /// Canonical label, e.g. `제839조의2`.
    pub fn label(&self) -> String {
        let mut out = format!("제{}조", self.number);
        if let Some(b) = self.branch {
            out.push_str(&format!("의{b}"));
        }
        if let Some(s) = self.sub_branch {
            out.push_str(&format!("의{s}"));
        }
        out
    }

    /// 6-digit DRF article code: article zero-padded to 4, first branch to 2.
    ///
    /// `제839조의2` → `"083902"`, `제2조` → `"000200"`. Returns `None` when the
    /// article cannot be represented (number > 9999, branch > 99, or a second
    /// branch level, which the code format has no slot for).
    pub fn jo_code(&self) -> Option<String> {
        if self.number > 9999 || self.sub_branch.is_some() {
            return None;
        }
        let branch = self.branch.unwrap_or(0);
        if branch > 99 {
            return None;
        }
        Some(format!("{:04}{:02}", self.number, branch))
    }
}

/// Parse an article label into an [`ArticleNo`].
///
/// Accepts an optional leading `제`, the article digits, an optional `조`, then up
/// to two branch groups written as `의N` or `-N`. Trailing paragraph/item
/// references (`제1항`, `제3호`) are ignored; any other trailing text rejects
/// the label. Whitespace anywhere in the label is ignored.
///
/// # Examples
///
/// - "제839조의2" → 839 / 2
/// - "839조의2" → 839 / 2
/// - "839-2" → 839 / 2
/// - "제5조의2의3" → 5 / 2 / 3
/// - "제2조제1항" → 2
pub fn parse_article_label(s: &str) -> Option<ArticleNo> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let mut rest = compact.strip_prefix('제').unwrap_or(&compact);

    let (number, after) = take_number(rest)?;
    if number == 0 {
        return None;
    }
    rest = after.strip_prefix('조').unwrap_or(after);

    let mut branches: Vec<u32> = Vec::with_capacity(2);
    while branches.len() < 2 {
        let Some(after_sep) = rest.strip_prefix('의').or_else(|| rest.strip_prefix('-')) else {
            break;
        };
        let Some((value, after_num)) = take_number(after_sep) else {
            break;
        };
        if value == 0 {
            return None;
        }
        branches.push(value);
        rest = after_num;
    }

    // Stop on paragraph/item references; reject anything else.
    if !rest.is_empty() && !rest.starts_with('제') {
        return None;
    }

    Some(ArticleNo {
        number,
        branch: branches.first().copied(),
        sub_branch: branches.get(1).copied(),
    })
}

/// Normalise an article label to its canonical form.
///
/// Unparseable input is returned trimmed but otherwise untouched, so callers
/// can still build a best-effort link from whatever the user wrote.
pub fn normalize_article_label(s: &str) -> String {
    match parse_article_label(s) {
        Some(no) => no.label(),
        None => s.trim().to_string(),
    }
}

/// DRF `jo` code for a free-form label, if it parses and fits the format.
pub fn jo_code(label: &str) -> Option<String> {
    parse_article_label(label).and_then(|no| no.jo_code())
}

fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_article() {
        let no = parse_article_label("제750조").unwrap();
        assert_eq!(no.number, 750);
        assert_eq!(no.branch, None);
        assert_eq!(no.label(), "제750조");
    }

    #[test]
    fn parses_branch_variants() {
        for input in ["제839조의2", "839조의2", "839-2", " 제 839 조의 2 "] {
            let no = parse_article_label(input).unwrap_or_else(|| panic!("failed: {input}"));
            assert_eq!(no.number, 839, "{input}");
            assert_eq!(no.branch, Some(2), "{input}");
            assert_eq!(no.label(), "제839조의2", "{input}");
        }
    }

    #[test]
    fn parses_double_branch() {
        let no = parse_article_label("제5조의2의3").unwrap();
        assert_eq!(no.branch, Some(2));
        assert_eq!(no.sub_branch, Some(3));
        assert_eq!(no.label(), "제5조의2의3");
    }

    #[test]
    fn ignores_paragraph_reference() {
        let no = parse_article_label("제2조제1항").unwrap();
        assert_eq!(no.label(), "제2조");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_article_label("").is_none());
        assert!(parse_article_label("조").is_none());
        assert!(parse_article_label("제0조").is_none());
        assert!(parse_article_label("제12조abc").is_none());
        assert!(parse_article_label("총칙").is_none());
    }

    #[test]
    fn jo_code_pads_article_and_branch() {
        assert_eq!(jo_code("제839조의2").as_deref(), Some("083902"));
        assert_eq!(jo_code("제2조").as_deref(), Some("000200"));
        assert_eq!(jo_code("제1118조").as_deref(), Some("111800"));
    }

    #[test]
    fn jo_code_out_of_range() {
        assert_eq!(jo_code("제10000조"), None);
        assert_eq!(jo_code("제5조의100"), None);
        assert_eq!(jo_code("제5조의2의3"), None);
        assert_eq!(jo_code("없음"), None);
    }

    #[test]
    fn document_order() {
        let a = parse_article_label("제839조").unwrap();
        let b = parse_article_label("제839조의2").unwrap();
        let c = parse_article_label("제840조").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn normalize_keeps_unparseable_input() {
        assert_eq!(normalize_article_label("839조의2"), "제839조의2");
        assert_eq!(normalize_article_label("  부칙 "), "부칙");
    }
}
