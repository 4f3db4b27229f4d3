//! Count and date-range extraction from the raw utterance.

use std::ops::Range;
use std::sync::OnceLock;

use chrono::{Datelike, Days, Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// `start` through `days` days later, inclusive.
    pub fn upcoming(start: NaiveDate, days: u64) -> Self {
        Self {
            start,
            end: start.checked_add_days(Days::new(days)).unwrap_or(start),
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} ~ {}", self.start, self.end)
        }
    }
}

struct Patterns {
    digit_count: Regex,
    top_count: Regex,
    word_count: Regex,
    full_date: Regex,
    iso_date: Regex,
    month_day: Regex,
    slash_date: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                digit_count: Regex::new(r"(\d{1,3})(?:\s*명|\s*개|\s*팀|경기|게임|위까지)").ok()?,
                top_count: Regex::new(r"(?i)(?:상위|top|탑)\s*(\d{1,3})").ok()?,
                word_count: Regex::new(
                    r"(한|두|세|네|다섯|여섯|일곱|여덟|아홉|열)\s*(?:명|개|경기|팀)",
                )
                .ok()?,
                full_date: Regex::new(r"(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일").ok()?,
                iso_date: Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").ok()?,
                month_day: Regex::new(r"(\d{1,2})\s*월\s*(\d{1,2})\s*일").ok()?,
                slash_date: Regex::new(r"(?:^|[^\d/])(\d{1,2})/(\d{1,2})(?:$|[^\d/])").ok()?,
            })
        })
        .as_ref()
}

/// Requested number of rows ("5명", "상위 10", "다섯 명", "top 3").
pub fn parse_count(utterance: &str) -> Option<u32> {
    let p = patterns()?;

    if let Some(n) = p
        .top_count
        .captures(utterance)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        return Some(n);
    }
    if let Some(n) = p
        .digit_count
        .captures(utterance)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        return Some(n);
    }
    if let Some(c) = p.word_count.captures(utterance) {
        return korean_number(&c[1]);
    }
    if crate::text::compact(utterance).contains("1위") {
        return Some(1);
    }
    None
}

fn korean_number(word: &str) -> Option<u32> {
    let n = match word {
        "한" => 1,
        "두" => 2,
        "세" => 3,
        "네" => 4,
        "다섯" => 5,
        "여섯" => 6,
        "일곱" => 7,
        "여덟" => 8,
        "아홉" => 9,
        "열" => 10,
        _ => return None,
    };
    Some(n)
}

/// Date range mentioned in the utterance, relative to `today`.
///
/// Explicit dates win over relative words; two explicit dates form a range.
pub fn parse_date_range(utterance: &str, today: NaiveDate) -> Option<DateRange> {
    let mut explicit = explicit_dates(utterance, today);
    explicit.sort();
    if let (Some(&start), Some(&end)) = (explicit.first(), explicit.last()) {
        return Some(DateRange { start, end });
    }

    let compacted = crate::text::compact(utterance);
    let relative_day = [
        ("그저께", -2),
        ("그제", -2),
        ("어제", -1),
        ("오늘", 0),
        ("내일", 1),
        ("모레", 2),
    ];
    if let Some((_, offset)) = relative_day.iter().find(|(w, _)| compacted.contains(w)) {
        return Some(DateRange::day(today + Duration::days(*offset)));
    }

    let relative_week = [("지난주", -1), ("저번주", -1), ("이번주", 0), ("다음주", 1)];
    if let Some((_, offset)) = relative_week.iter().find(|(w, _)| compacted.contains(w)) {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let start = monday + Duration::weeks(*offset);
        return Some(DateRange {
            start,
            end: start + Duration::days(6),
        });
    }

    None
}

fn explicit_dates(utterance: &str, today: NaiveDate) -> Vec<NaiveDate> {
    let Some(p) = patterns() else {
        return Vec::new();
    };
    let mut taken: Vec<Range<usize>> = Vec::new();
    let mut dates = Vec::new();

    let mut collect = |re: &Regex, with_year: bool| {
        for caps in re.captures_iter(utterance) {
            let Some(whole) = caps.get(0) else { continue };
            if taken.iter().any(|r| crate::text::overlaps(r, &whole.range())) {
                continue;
            }
            let (y, m, d) = if with_year {
                (
                    caps[1].parse::<i32>().ok(),
                    caps[2].parse::<u32>().ok(),
                    caps[3].parse::<u32>().ok(),
                )
            } else {
                (
                    Some(today.year()),
                    caps[1].parse::<u32>().ok(),
                    caps[2].parse::<u32>().ok(),
                )
            };
            if let (Some(y), Some(m), Some(d)) = (y, m, d) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    taken.push(whole.range());
                    dates.push(date);
                }
            }
        }
    };

    collect(&p.full_date, true);
    collect(&p.iso_date, true);
    collect(&p.month_day, false);
    collect(&p.slash_date, false);
    dates
}
