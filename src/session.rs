use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use scraper::Html;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::dateparse;
use crate::error::{Error, Result};
use crate::portal::listing::ListingAdapter;

/// How far back sessions are fetched when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// One recorded class as listed on the portal's landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub filter_url: String,
    pub session_time: NaiveDateTime,
    pub video_urls: Vec<Url>,
}

impl Session {
    pub fn new(filter_url: String, session_time: NaiveDateTime) -> Self {
        Self {
            filter_url,
            session_time,
            video_urls: Vec::new(),
        }
    }

    /// `<YYYY-MM-DD>/<HH_MM>`, relative to the media root.
    pub fn folder(&self) -> PathBuf {
        PathBuf::from(self.session_time.format("%Y-%m-%d").to_string())
            .join(self.session_time.format("%H_%M").to_string())
    }
}

/// Works out the first day whose sessions are kept.
///
/// Without an explicit start this is 30 days before `now`. An explicit start is
/// moved back by one day so that the day itself is still included.
pub fn start_boundary(start: Option<&str>, now: NaiveDateTime) -> Result<NaiveDate> {
    let Some(start) = start else {
        return Ok(now.date() - Duration::days(DEFAULT_LOOKBACK_DAYS));
    };

    let parsed = dateparse::parse(start, now)
        .ok_or_else(|| Error::Config(format!("start date {start:?} could not be parsed")))?;

    parsed
        .date()
        .pred_opt()
        .ok_or_else(|| Error::Config(format!("start date {start:?} is out of range")))
}

/// Reads the session dropdown of the landing page, keeping sessions on or after `start`.
///
/// Sessions come back in document order.
pub fn parse_sessions(
    html: &str,
    start: NaiveDate,
    adapter: &impl ListingAdapter,
    now: NaiveDateTime,
) -> Result<Vec<Session>> {
    let document = Html::parse_document(html);
    let mut sessions = Vec::new();

    for entry in adapter.session_entries(&document)? {
        let session_time = dateparse::parse(&entry.text, now)
            .ok_or_else(|| Error::SessionTime(entry.text.clone()))?;

        if session_time.date() >= start {
            let filter_url = entry
                .href
                .ok_or_else(|| Error::Structure(format!("session entry {:?} has no link", entry.text)))?;
            sessions.push(Session::new(filter_url, session_time));
        } else {
            debug!("Skipping session {} before {}", session_time, start);
        }
    }

    Ok(sessions)
}

/// Orders sessions oldest first. Sessions at the same time keep their listing order.
pub fn sort_sessions(sessions: &mut [Session]) {
    sessions.sort_by_key(|session| session.session_time);
}
