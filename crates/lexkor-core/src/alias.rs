//! Statute name aliases.
//!
//! Users (and models) routinely cite statutes by their colloquial short form:
//! 형소법, 근기법, 특가법. Links and DRF lookups need the official name, so every
//! extracted name passes through [`canonical_law_name`].

/// Short form → official statute name.
const ALIASES: &[(&str, &str)] = &[
    ("형소법", "형사소송법"),
    ("민소법", "민사소송법"),
    ("민집법", "민사집행법"),
    ("가소법", "가사소송법"),
    ("행소법", "행정소송법"),
    ("행심법", "행정심판법"),
    ("행절법", "행정절차법"),
    ("근기법", "근로기준법"),
    ("노조법", "노동조합 및 노동관계조정법"),
    ("최임법", "최저임금법"),
    ("산안법", "산업안전보건법"),
    ("중처법", "중대재해 처벌 등에 관한 법률"),
    ("특가법", "특정범죄 가중처벌 등에 관한 법률"),
    ("특경법", "특정경제범죄 가중처벌 등에 관한 법률"),
    ("성폭력처벌법", "성폭력범죄의 처벌 등에 관한 특례법"),
    ("성폭법", "성폭력범죄의 처벌 등에 관한 특례법"),
    ("청소년성보호법", "아동ㆍ청소년의 성보호에 관한 법률"),
    ("아청법", "아동ㆍ청소년의 성보호에 관한 법률"),
    ("가폭법", "가정폭력범죄의 처벌 등에 관한 특례법"),
    ("도교법", "도로교통법"),
    ("교특법", "교통사고처리 특례법"),
    ("개보법", "개인정보 보호법"),
    ("개인정보보호법", "개인정보 보호법"),
    ("정통망법", "정보통신망 이용촉진 및 정보보호 등에 관한 법률"),
    ("주임법", "주택임대차보호법"),
    ("상임법", "상가건물 임대차보호법"),
    ("국보법", "국가보안법"),
    ("공선법", "공직선거법"),
    ("도촉법", "도시재정비 촉진을 위한 특별법"),
    ("도정법", "도시 및 주거환경정비법"),
    ("국토계획법", "국토의 계획 및 이용에 관한 법률"),
    ("공정거래법", "독점규제 및 공정거래에 관한 법률"),
    ("자본시장법", "자본시장과 금융투자업에 관한 법률"),
    ("부가세법", "부가가치세법"),
    ("채무자회생법", "채무자 회생 및 파산에 관한 법률"),
    ("가등기담보법", "가등기담보 등에 관한 법률"),
    ("집시법", "집회 및 시위에 관한 법률"),
];

/// Official names that appear without an alias but are cited constantly.
const KNOWN_NAMES: &[&str] = &[
    "헌법",
    "대한민국헌법",
    "민법",
    "형법",
    "상법",
    "형사소송법",
    "민사소송법",
    "근로기준법",
    "도로교통법",
    "주택임대차보호법",
    "가족관계의 등록 등에 관한 법률",
    "국가배상법",
    "부동산등기법",
    "저작권법",
    "특허법",
];

/// Map a statute name to its official form.
///
/// Whitespace is collapsed before lookup; unknown names come back collapsed but
/// otherwise unchanged.
pub fn canonical_law_name(name: &str) -> String {
    let collapsed = collapse_whitespace(name);
    match lookup(&collapsed) {
        Some(official) => official.to_string(),
        None => collapsed,
    }
}

/// Whether `name` is an alias or an official name this table knows about.
pub fn is_known_law(name: &str) -> bool {
    lookup(&collapse_whitespace(name)).is_some()
}

fn lookup(name: &str) -> Option<&'static str> {
    if let Some(&(_, official)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        return Some(official);
    }
    if let Some(&(_, official)) = ALIASES.iter().find(|(_, official)| *official == name) {
        return Some(official);
    }
    KNOWN_NAMES.iter().copied().find(|known| *known == name)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_abbreviation() {
        assert_eq!(canonical_law_name("형소법"), "형사소송법");
        assert_eq!(canonical_law_name(" 특가법 "), "특정범죄 가중처벌 등에 관한 법률");
    }

    #[test]
    fn official_names_pass_through() {
        assert_eq!(canonical_law_name("민법"), "민법");
        assert_eq!(canonical_law_name("개인정보  보호법"), "개인정보 보호법");
    }

    #[test]
    fn unknown_names_are_collapsed() {
        assert_eq!(canonical_law_name("어떤\t새로운   법"), "어떤 새로운 법");
        assert!(!is_known_law("어떤 새로운 법"));
    }

    #[test]
    fn known_lookup() {
        assert!(is_known_law("형소법"));
        assert!(is_known_law("형사소송법"));
        assert!(is_known_law("민법"));
    }
}
