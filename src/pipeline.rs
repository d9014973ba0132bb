use chrono::NaiveDateTime;
use tracing::info;

use crate::download::{self, MediaStore};
use crate::error::Result;
use crate::options::Options;
use crate::portal::listing::ListingAdapter;
use crate::portal::Portal;
use crate::resolver;
use crate::session::{self, Session};

/// Fetches the landing page and returns the sessions inside the date window.
pub async fn discover_sessions<P: Portal + ?Sized>(
    portal: &P,
    options: &Options,
    adapter: &impl ListingAdapter,
    now: NaiveDateTime,
) -> Result<Vec<Session>> {
    let html = portal.landing_page().await?;
    let mut sessions = session::parse_sessions(&html, options.start, adapter, now)?;

    if !options.keep_order {
        session::sort_sessions(&mut sessions);
    }

    info!("Found {} valid sessions", sessions.len());

    Ok(sessions)
}

/// Runs discovery and resolution, then downloads unless this is a dry run.
///
/// Every session is resolved before the first download starts, so a failure
/// while resolving leaves the media folder untouched.
pub async fn run<P: Portal + ?Sized>(
    portal: &P,
    options: &Options,
    adapter: &impl ListingAdapter,
    now: NaiveDateTime,
) -> Result<Vec<Session>> {
    info!("Will fetch valid sessions from {} to today", options.start);

    let mut sessions = discover_sessions(portal, options, adapter, now).await?;

    for session in sessions.iter_mut() {
        resolver::resolve_session(
            portal,
            session,
            &options.base_origin,
            options.perspective.as_deref(),
            adapter,
        )
        .await?;
    }

    if options.dry_run {
        info!("Dry run, nothing downloaded");
        return Ok(sessions);
    }

    let store = MediaStore::new(&options.output_dir);
    download::download_sessions(portal, &sessions, &store).await?;

    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use url::Url;

    use super::*;
    use crate::download::body::MemoryBody;
    use crate::error::Error;
    use crate::portal::listing::ProflyerListing;
    use crate::portal::VideoResponse;

    const BASE: &str = "https://media.example.fi";

    #[derive(Default)]
    struct FakePortal {
        landing: String,
        listings: HashMap<String, String>,
        videos: HashMap<String, (&'static str, &'static [u8])>,
        listing_requests: AtomicUsize,
        video_requests: AtomicUsize,
    }

    #[async_trait]
    impl Portal for FakePortal {
        async fn landing_page(&self) -> Result<String> {
            Ok(self.landing.clone())
        }

        async fn filtered_listing(&self, filter_url: &str) -> Result<String> {
            self.listing_requests.fetch_add(1, Ordering::SeqCst);
            self.listings
                .get(filter_url)
                .cloned()
                .ok_or_else(|| Error::Structure(format!("no fixture for {filter_url}")))
        }

        async fn video(&self, url: &Url) -> Result<VideoResponse> {
            self.video_requests.fetch_add(1, Ordering::SeqCst);
            let (disposition, bytes) = self.videos[url.as_str()];
            Ok(VideoResponse {
                content_disposition: Some(disposition.to_string()),
                body: Box::new(MemoryBody::new(bytes)),
            })
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn options(output_dir: &std::path::Path) -> Options {
        Options {
            base_origin: Url::parse(BASE).unwrap(),
            debug: false,
            perspective: Some("Perspective A".into()),
            start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            output_dir: output_dir.to_path_buf(),
            keep_order: false,
            dry_run: false,
        }
    }

    fn listing(containers: &[(&str, &str)]) -> String {
        let containers: String = containers
            .iter()
            .map(|(perspective, href)| {
                format!(
                    r#"<div class="media_container_responsive">
                         <div></div>
                         <div><span>{perspective}</span></div>
                         <a class="btn btn-link download_link" href="{href}">Download</a>
                       </div>"#
                )
            })
            .collect();
        format!(
            r#"<div id="main"><div><div></div><div><div>{containers}</div></div></div></div>"#
        )
    }

    fn portal() -> FakePortal {
        let landing = r#"<ul class="dropdown-menu">
              <li><a href="proflyer?s=3">16.01.2024 19:00</a></li>
              <li><a href="proflyer?s=2">15.01.2024 18:00</a></li>
              <li><a href="proflyer?s=1">14.01.2024 18:00</a></li>
            </ul>"#;

        let mut portal = FakePortal {
            landing: landing.into(),
            ..Default::default()
        };
        portal.listings.insert(
            "proflyer?s=2".into(),
            listing(&[("Perspective A", "/dl/a1"), ("Perspective B", "/dl/b1")]),
        );
        portal.listings.insert("proflyer?s=3".into(), listing(&[("Perspective A", "/dl/a2")]));
        portal.videos.insert(
            format!("{BASE}/dl/a1"),
            ("attachment; filename=clip_01.mp4", &b"first clip"[..]),
        );
        portal.videos.insert(
            format!("{BASE}/dl/a2"),
            ("attachment; filename=clip_02.mp4", &b"second clip"[..]),
        );
        portal
    }

    #[tokio::test]
    async fn downloads_matching_videos_into_dated_folders() {
        let root = tempfile::tempdir().unwrap();
        let portal = portal();

        let sessions = run(&portal, &options(root.path()), &ProflyerListing, now()).await.unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].filter_url, "proflyer?s=2");
        assert_eq!(portal.listing_requests.load(Ordering::SeqCst), 2);
        assert_eq!(
            std::fs::read(root.path().join("2024-01-15/18_00/clip_01.mp4")).unwrap(),
            b"first clip"
        );
        assert_eq!(
            std::fs::read(root.path().join("2024-01-16/19_00/clip_02.mp4")).unwrap(),
            b"second clip"
        );
    }

    #[tokio::test]
    async fn rerun_overwrites_without_duplicates() {
        let root = tempfile::tempdir().unwrap();
        let portal = portal();
        let options = options(root.path());

        run(&portal, &options, &ProflyerListing, now()).await.unwrap();
        run(&portal, &options, &ProflyerListing, now()).await.unwrap();

        let folder = root.path().join("2024-01-15/18_00");
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 1);
        assert_eq!(std::fs::read(folder.join("clip_01.mp4")).unwrap(), b"first clip");
    }

    #[tokio::test]
    async fn missing_dropdown_stops_before_session_requests() {
        let root = tempfile::tempdir().unwrap();
        let portal = FakePortal {
            landing: "<html><body><p>logged out</p></body></html>".into(),
            ..Default::default()
        };

        let result = run(&portal, &options(root.path()), &ProflyerListing, now()).await;

        assert!(matches!(result, Err(Error::Structure(_))));
        assert_eq!(portal.listing_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dry_run_resolves_without_downloading() {
        let root = tempfile::tempdir().unwrap();
        let portal = portal();
        let options = Options {
            dry_run: true,
            perspective: None,
            ..options(root.path())
        };

        let sessions = run(&portal, &options, &ProflyerListing, now()).await.unwrap();

        assert_eq!(sessions[0].video_urls.len(), 2);
        assert_eq!(portal.video_requests.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn keep_order_follows_the_listing() {
        let root = tempfile::tempdir().unwrap();
        let portal = portal();
        let options = Options {
            keep_order: true,
            ..options(root.path())
        };

        let sessions = discover_sessions(&portal, &options, &ProflyerListing, now()).await.unwrap();
        let order: Vec<_> = sessions.iter().map(|s| s.filter_url.as_str()).collect();

        assert_eq!(order, ["proflyer?s=3", "proflyer?s=2"]);
    }

    #[tokio::test]
    async fn resolution_failure_downloads_nothing() {
        let root = tempfile::tempdir().unwrap();
        let mut portal = portal();
        portal.listings.remove("proflyer?s=3");

        let result = run(&portal, &options(root.path()), &ProflyerListing, now()).await;

        assert!(result.is_err());
        assert_eq!(portal.video_requests.load(Ordering::SeqCst), 0);
    }
}
