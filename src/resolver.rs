use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::portal::listing::ListingAdapter;
use crate::portal::Portal;
use crate::session::Session;

/// A per-perspective entry on a session's filtered listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoContainer {
    pub perspective_label: String,
    pub download_link: Option<String>,
}

pub fn video_containers(html: &str, adapter: &impl ListingAdapter) -> Result<Vec<VideoContainer>> {
    let document = Html::parse_document(html);

    adapter
        .video_containers(&document)?
        .into_iter()
        .map(|container| -> Result<VideoContainer> {
            Ok(VideoContainer {
                perspective_label: adapter.perspective(container)?,
                download_link: adapter.download_link(container),
            })
        })
        .collect()
}

/// Absolute download URLs for the containers matching `perspective`, or for
/// every container when no perspective is requested. Document order is kept.
pub fn video_urls(
    html: &str,
    base_origin: &Url,
    perspective: Option<&str>,
    adapter: &impl ListingAdapter,
) -> Result<Vec<Url>> {
    let mut urls = Vec::new();

    for container in video_containers(html, adapter)? {
        if perspective.is_some_and(|wanted| wanted != container.perspective_label) {
            continue;
        }

        let Some(link) = container.download_link else {
            debug!("No download link for perspective {}", container.perspective_label);
            continue;
        };

        let url = base_origin
            .join(&link)
            .map_err(|err| Error::Structure(format!("invalid download link {link:?}: {err}")))?;
        urls.push(url);
    }

    Ok(urls)
}

/// Fetches the session's filtered listing and fills in its `video_urls`.
pub async fn resolve_session<P: Portal + ?Sized>(
    portal: &P,
    session: &mut Session,
    base_origin: &Url,
    perspective: Option<&str>,
    adapter: &impl ListingAdapter,
) -> Result<()> {
    info!("Getting videos from session {}", session.session_time);

    let html = portal.filtered_listing(&session.filter_url).await?;
    session.video_urls = video_urls(&html, base_origin, perspective, adapter)?;

    info!(
        "Fetched {} video urls for session {}",
        session.video_urls.len(),
        session.session_time
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::listing::ProflyerListing;

    fn container(perspective: &str, link: Option<&str>) -> String {
        let anchor = link
            .map(|href| format!(r#"<a class="btn btn-link download_link" href="{href}">Lataa</a>"#))
            .unwrap_or_default();
        format!(
            r#"<div class="media_container_responsive">
                 <div><video src="preview.mp4"></video></div>
                 <div><span>{perspective}</span></div>
                 <div>{anchor}</div>
               </div>"#
        )
    }

    fn filtered(containers: &[String]) -> String {
        format!(
            r#"<html><body><div id="main"><div>
                 <div class="filters"></div>
                 <div><div class="row">{}</div></div>
               </div></div></body></html>"#,
            containers.concat()
        )
    }

    fn base() -> Url {
        Url::parse("https://media.example.fi").unwrap()
    }

    fn three_perspectives() -> String {
        filtered(&[
            container("Perspective A", Some("/download/L1")),
            container("Perspective B", Some("/download/L2")),
            container("Perspective A", Some("/download/L3")),
        ])
    }

    fn paths(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(Url::path).collect()
    }

    #[test]
    fn filters_by_perspective_in_document_order() {
        let urls = video_urls(&three_perspectives(), &base(), Some("Perspective A"), &ProflyerListing).unwrap();
        assert_eq!(paths(&urls), ["/download/L1", "/download/L3"]);
    }

    #[test]
    fn no_perspective_matches_everything() {
        let urls = video_urls(&three_perspectives(), &base(), None, &ProflyerListing).unwrap();
        assert_eq!(paths(&urls), ["/download/L1", "/download/L2", "/download/L3"]);
    }

    #[test]
    fn unknown_perspective_matches_nothing() {
        let urls = video_urls(&three_perspectives(), &base(), Some("Perspective C"), &ProflyerListing).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn matching_container_without_link_is_skipped() {
        let html = filtered(&[
            container("Perspective A", None),
            container("Perspective A", Some("/download/L2")),
        ]);
        let urls = video_urls(&html, &base(), Some("Perspective A"), &ProflyerListing).unwrap();

        assert_eq!(paths(&urls), ["/download/L2"]);
    }

    #[test]
    fn absolute_links_are_kept() {
        let html = filtered(&[container("Perspective A", Some("https://cdn.example.com/v/1.mp4"))]);
        let urls = video_urls(&html, &base(), None, &ProflyerListing).unwrap();

        assert_eq!(urls[0].as_str(), "https://cdn.example.com/v/1.mp4");
    }

    #[test]
    fn container_without_label_is_a_structure_error() {
        let html = filtered(&[r#"<div class="media_container_responsive"><div></div></div>"#.to_string()]);
        let result = video_urls(&html, &base(), None, &ProflyerListing);

        assert!(matches!(result, Err(Error::Structure(_))));
    }

    #[test]
    fn exposes_containers_with_optional_links() {
        let html = filtered(&[container("Perspective B", None)]);
        let containers = video_containers(&html, &ProflyerListing).unwrap();

        assert_eq!(
            containers,
            vec![VideoContainer {
                perspective_label: "Perspective B".into(),
                download_link: None,
            }]
        );
    }
}
