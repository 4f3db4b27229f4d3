//! Keyword tables used by the classifier rules and by the resolver to skip
//! words that are never entity names. All entries are in compacted form
//! (lowercase, no spaces).

pub const RANKING: &[&str] = &[
    "순위", "랭킹", "가장", "제일", "최다", "최고", "최저", "최소", "높은", "낮은", "많은", "적은",
    "순으로", "1위", "상위", "하위", "top", "탑", "리더",
];

/// Turns the criterion right before it into a title (홈런왕, 다승왕).
pub const TITLE_SUFFIX: &str = "왕";

pub const RESULT: &[&str] = &[
    "결과", "상대전적", "전적", "맞대결", "스코어", "점수", "이겼", "졌", "승패", "승부", "몇대몇",
];

pub const SCHEDULE: &[&str] = &["일정", "스케줄", "언제", "몇시", "대진", "매치"];

/// Schedule hint that also shows up in stat questions ("몇 경기 나왔어").
pub const GAME: &[&str] = &["경기"];

pub const STARTER: &[&str] = &["선발"];

pub const STAT: &[&str] = &[
    "정보", "성적", "기록", "스탯", "시즌", "어때", "몇", "얼마", "프로필", "활약",
];

pub const COMPARE: &[&str] = &["비교", "vs", "누가더", "차이", "더잘", "중누가"];

pub const ROSTER: &[&str] = &[
    "선수", "명단", "로스터", "라인업", "멤버", "엔트리", "누구", "누가", "소속",
];

/// Common request phrasing with no domain meaning.
const FILLER: &[&str] = &[
    "알려", "보여", "나열", "말해", "궁금", "해줘", "주세요", "중에", "있어", "뭐야", "어떻게",
    "올해", "이번", "지난", "다음", "오늘", "내일", "모레", "어제", "그제", "그저께", "주간",
];

pub fn contains_any(compacted: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| compacted.contains(k))
}

/// True when a word core is request phrasing or a rule keyword rather than
/// a candidate entity name.
pub fn is_stop_word(core: &str) -> bool {
    let core = crate::text::compact(core);
    [RANKING, RESULT, SCHEDULE, GAME, STARTER, STAT, COMPARE, ROSTER, FILLER]
        .iter()
        .flat_map(|table| table.iter())
        .filter(|k| k.chars().count() >= 2)
        .any(|k| core.contains(k))
}
