//! Permissive date parsing for the free text found in session listings.
//!
//! Listing entries come in whatever shape the portal renders them in
//! ("Ma 15.01.2024 klo 18.00", "15. tammikuuta 2024", "Jan 15, 2024 6:00 pm").
//! Rather than matching the whole string against a fixed format, the parser
//! looks for a date fragment and a time fragment anywhere in the text and
//! ignores the words around them.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

/// Finnish month stems, `tammi` + `kuuta` and so on.
const FINNISH_MONTHS: &str = "tammi|helmi|maalis|huhti|touko|kesä|heinä|elo|syys|loka|marras|joulu";

static REGEX_ISO_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)t(\d)").unwrap());

static REGEX_RELATIVE_AGO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+|an?)\s+(minute|hour|day|week|month|year)s?\s+ago$").unwrap()
});

static REGEX_RELATIVE_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^in\s+(\d+|an?)\s+(minute|hour|day|week|month|year)s?$").unwrap()
});

static REGEX_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(today|yesterday|tomorrow)\b").unwrap());

static REGEX_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static REGEX_YMD_SLASHED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})/(\d{1,2})/(\d{1,2})\b").unwrap());

static REGEX_DMY_DASHED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4}|\d{2})\b").unwrap());

static REGEX_DOTTED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})?").unwrap());

static REGEX_SLASHED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").unwrap());

static REGEX_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\.?\s+({MONTHS})\.?(?:\s+(\d{{4}}))?\b"
    ))
    .unwrap()
});

static REGEX_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+(\d{{4}}))?\b"
    ))
    .unwrap()
});

static REGEX_FINNISH_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})\.?\s+({FINNISH_MONTHS})(?:kuu\w*|k)\b\.?(?:\s+(\d{{4}}))?\b"
    ))
    .unwrap()
});

static REGEX_MONTH_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{MONTHS}|(?:{FINNISH_MONTHS})(?:kuu\w*|k))\b")).unwrap()
});

static REGEX_CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?\s*(am|pm)?\b").unwrap()
});

static REGEX_HOUR_MINUTE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})h(\d{2})\b").unwrap());

static REGEX_HOUR_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*(am|pm)\b").unwrap());

static REGEX_KLO_HOUR_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bklo\s+(\d{1,2})\b").unwrap());

/// Parses `text` into a timestamp, resolving relative expressions against `now`.
///
/// Returns `None` when neither a date nor a time can be found in the text, or
/// when the text only yields a time but still carries date-like leftovers the
/// parser does not understand.
pub fn parse(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = normalize(text);
    if text.is_empty() {
        return None;
    }

    if text == "now" {
        return Some(now);
    }

    if let Some(caps) = REGEX_RELATIVE_AGO.captures(&text) {
        let (amount, unit) = relative_amount(&caps)?;
        return shift(now, unit, amount, false);
    }

    if let Some(caps) = REGEX_RELATIVE_IN.captures(&text) {
        let (amount, unit) = relative_amount(&caps)?;
        return shift(now, unit, amount, true);
    }

    let (date, rest) = match find_date(&text, now.date()) {
        Some((date, rest)) => (Some(date?), rest),
        None => (None, text.clone()),
    };

    let (time, rest) = match find_time(&rest) {
        Some((time, rest)) => (Some(time?), rest),
        None => (None, rest),
    };

    match (date, time) {
        (Some(date), Some(time)) => Some(date.and_time(time)),
        (Some(date), None) => {
            // keywords keep the current time of day, calendar dates start at midnight
            if REGEX_KEYWORD.is_match(&text) {
                Some(date.and_time(now.time()))
            } else {
                Some(date.and_time(NaiveTime::MIN))
            }
        }
        (None, Some(time)) => {
            if has_date_leftovers(&rest) {
                return None;
            }
            Some(now.date().and_time(time))
        }
        (None, None) => None,
    }
}

fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(',', " ");
    let lowered = REGEX_ISO_SEPARATOR.replace_all(&lowered, "$1 $2");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn relative_amount<'a>(caps: &Captures<'a>) -> Option<(u32, &'a str)> {
    let amount = match &caps[1] {
        "a" | "an" => 1,
        number => number.parse().ok()?,
    };
    Some((amount, caps.get(2)?.as_str()))
}

fn shift(now: NaiveDateTime, unit: &str, amount: u32, forward: bool) -> Option<NaiveDateTime> {
    let months = match unit {
        "month" => Some(amount),
        "year" => amount.checked_mul(12),
        _ => None,
    };

    if let Some(months) = months {
        let months = Months::new(months);
        return if forward {
            now.checked_add_months(months)
        } else {
            now.checked_sub_months(months)
        };
    }

    let amount = i64::from(amount);
    let delta = match unit {
        "minute" => Duration::try_minutes(amount)?,
        "hour" => Duration::try_hours(amount)?,
        "day" => Duration::try_days(amount)?,
        "week" => Duration::try_weeks(amount)?,
        _ => return None,
    };

    if forward {
        now.checked_add_signed(delta)
    } else {
        now.checked_sub_signed(delta)
    }
}

/// Finds the first date fragment in `text`.
///
/// The outer option says whether a fragment was found at all, the inner one
/// whether it names a real calendar day. The returned string is `text` with the
/// fragment blanked out, so the time search cannot pick up date digits.
fn find_date(text: &str, today: NaiveDate) -> Option<(Option<NaiveDate>, String)> {
    if let Some(caps) = REGEX_KEYWORD.captures(text) {
        let date = match &caps[1] {
            "yesterday" => today.pred_opt(),
            "tomorrow" => today.succ_opt(),
            _ => Some(today),
        };
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_ISO_DATE.captures(text) {
        let date = ymd(number(&caps, 1), number(&caps, 2), number(&caps, 3));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_YMD_SLASHED_DATE.captures(text) {
        let date = ymd(number(&caps, 1), number(&caps, 2), number(&caps, 3));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_DMY_DASHED_DATE.captures(text) {
        let date = ymd(number(&caps, 3), number(&caps, 2), number(&caps, 1));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_DOTTED_DATE.captures(text) {
        let year = caps.get(3).map_or(Some(year_of(today)), |_| number(&caps, 3));
        let date = ymd(year, number(&caps, 2), number(&caps, 1));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_SLASHED_DATE.captures(text) {
        let date = ymd(number(&caps, 3), number(&caps, 1), number(&caps, 2));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_DAY_MONTH.captures(text) {
        let year = caps.get(3).map_or(Some(year_of(today)), |_| number(&caps, 3));
        let date = ymd(year, month_number(&caps[2]), number(&caps, 1));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_MONTH_DAY.captures(text) {
        let year = caps.get(3).map_or(Some(year_of(today)), |_| number(&caps, 3));
        let date = ymd(year, month_number(&caps[1]), number(&caps, 2));
        return Some((date, blank(text, &caps)));
    }

    if let Some(caps) = REGEX_FINNISH_DAY_MONTH.captures(text) {
        let year = caps.get(3).map_or(Some(year_of(today)), |_| number(&caps, 3));
        let date = ymd(year, finnish_month_number(&caps[2]), number(&caps, 1));
        return Some((date, blank(text, &caps)));
    }

    None
}

/// Same shape as [`find_date`]: outer option for presence, inner for validity,
/// plus the text with the time blanked out.
fn find_time(text: &str) -> Option<(Option<NaiveTime>, String)> {
    if let Some(caps) = REGEX_CLOCK_TIME.captures(text) {
        let seconds = caps.get(3).map_or(Some(0), |_| number(&caps, 3));
        let hour = with_meridiem(number(&caps, 1), caps.get(4).map(|m| m.as_str()));
        return Some((hms(hour, number(&caps, 2), seconds), blank(text, &caps)));
    }

    if let Some(caps) = REGEX_HOUR_MINUTE_TIME.captures(text) {
        return Some((hms(number(&caps, 1), number(&caps, 2), Some(0)), blank(text, &caps)));
    }

    if let Some(caps) = REGEX_HOUR_TIME.captures(text) {
        let hour = with_meridiem(number(&caps, 1), Some(&caps[2]));
        return Some((hms(hour, Some(0), Some(0)), blank(text, &caps)));
    }

    if let Some(caps) = REGEX_KLO_HOUR_TIME.captures(text) {
        return Some((hms(number(&caps, 1), Some(0), Some(0)), blank(text, &caps)));
    }

    None
}

/// Digits or month names left over once the time is gone mean there was a
/// date the parser could not read.
fn has_date_leftovers(rest: &str) -> bool {
    rest.chars().any(|c| c.is_ascii_digit()) || REGEX_MONTH_WORD.is_match(rest)
}

fn blank(text: &str, caps: &Captures) -> String {
    let Some(matched) = caps.get(0) else {
        return text.to_string();
    };
    format!("{} {}", &text[..matched.start()], &text[matched.end()..])
}

fn number(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn year_of(date: NaiveDate) -> u32 {
    u32::try_from(date.year()).unwrap_or_default()
}

fn ymd(year: Option<u32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    let year = match year? {
        short if short < 100 => 2000 + short,
        year => year,
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month?, day?)
}

fn hms(hour: Option<u32>, minute: Option<u32>, second: Option<u32>) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour?, minute?, second?)
}

fn with_meridiem(hour: Option<u32>, meridiem: Option<&str>) -> Option<u32> {
    let hour = hour?;
    match meridiem {
        Some("am") if hour == 12 => Some(0),
        Some("pm") if hour < 12 => Some(hour + 12),
        Some(_) if hour > 12 => None,
        _ => Some(hour),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match &name[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn finnish_month_number(stem: &str) -> Option<u32> {
    let month = match stem {
        "tammi" => 1,
        "helmi" => 2,
        "maalis" => 3,
        "huhti" => 4,
        "touko" => 5,
        "kesä" => 6,
        "heinä" => 7,
        "elo" => 8,
        "syys" => 9,
        "loka" => 10,
        "marras" => 11,
        "joulu" => 12,
        _ => return None,
    };
    Some(month)
}
