//! Keyword tables for the provisional tier heuristic.
//!
//! Matching is case-insensitive substring containment against the post text,
//! so stems such as `오류` also hit `오류가` and `오류났어요`.

use sotong_core::Tier;

/// Operator announcements. Only trusted on posts longer than
/// [`NOTICE_MIN_CHARS`]; short posts quoting these words are usually users.
pub const OPERATOR_NOTICE: &[&str] = &[
    "안녕하세요",
    "아프리카tv입니다",
    "소통센터장",
    "안내드립니다",
    "공지",
    "클린아티",
];

pub const TECHNICAL_FAILURE: &[&str] = &[
    "오류",
    "버그",
    "접속",
    "렉",
    "짤려",
    "끊김",
    "멈춤",
    "무한로딩",
    "서버",
    "충전",
    "결제",
    "환불",
    "팅기는",
    "다운",
    "인증",
    "복구",
    "밀림",
    "안됨",
    "튕김",
    "먹통",
    "딜레이",
    "버벅",
    "로그인",
    "느려요",
    "느림",
    "안돼",
    "설치",
    "안모아지네요",
];

pub const POLICY_ISSUE: &[&str] = &[
    "블랙",
    "차단",
    "정지",
    "제재",
    "정책",
    "영구정지",
    "관리",
    "운영",
    "베비",
    "규정",
    "이미지",
    "불공평",
    "갑질",
    "차별",
    "논란",
    "월권",
    "보기싫은",
    "안보이게",
    "숨기기",
    "차단하기",
    "제도",
];

pub const FEATURE_REQUEST: &[&str] = &[
    "개선",
    "요청",
    "기능",
    "추가",
    "수정",
    "업데이트",
    "변경",
    "UI",
    "UX",
    "화면",
    "줄여주세요",
    "없앨수",
    "취소",
    "확인화면",
    "얼리기",
    "불편",
    "옵션",
    "개편",
    "자동",
    "설정",
    "컨텐츠",
    "화질",
    "선물",
    "혜택",
    "구독",
    "아이템",
    "포인트",
    "광고",
];

/// Character count a post must exceed before operator keywords count.
pub const NOTICE_MIN_CHARS: usize = 50;

/// Tiers in the order the heuristic checks them, after the gated notice
/// check. The first table with a hit wins.
pub(crate) const CASCADE: &[(Tier, &[&str])] = &[
    (Tier::TechnicalFailure, TECHNICAL_FAILURE),
    (Tier::PolicyIssue, POLICY_ISSUE),
    (Tier::FeatureRequest, FEATURE_REQUEST),
];

/// Returns `true` if any keyword occurs in `lowered`, which must already be
/// lowercase.
pub(crate) fn contains_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|kw| lowered.contains(kw.to_lowercase().as_str()))
}
