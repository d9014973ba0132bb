//! Every assumption about the portal's markup lives in this file.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

static DROPDOWN: Lazy<Selector> = Lazy::new(|| Selector::parse("ul.dropdown-menu").unwrap());
static DROPDOWN_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static MAIN_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#main > div > div:nth-child(2) > div").unwrap());
static PERSPECTIVE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.media_container_responsive > div:nth-child(2) > span").unwrap()
});
static DOWNLOAD_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.btn.btn-link.download_link").unwrap());

const MEDIA_CONTAINER_CLASS: &str = "media_container_responsive";

/// One entry of the landing page's session dropdown, before its text is read as a date.
///
/// Entries outside the date window are allowed to have no link.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub text: String,
    pub href: Option<String>,
}

/// Extraction points into the portal's pages. Swapping the implementation is
/// all it takes to follow a change in the portal's markup.
pub trait ListingAdapter {
    fn session_entries(&self, document: &Html) -> Result<Vec<SessionEntry>>;

    fn video_containers<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>>;

    fn perspective(&self, container: ElementRef<'_>) -> Result<String>;

    fn download_link(&self, container: ElementRef<'_>) -> Option<String>;
}

/// Markup of the Fööni media portal's proflyer pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProflyerListing;

impl ListingAdapter for ProflyerListing {
    fn session_entries(&self, document: &Html) -> Result<Vec<SessionEntry>> {
        // the first dropdown on the page is the session picker
        let dropdown = document
            .select(&DROPDOWN)
            .next()
            .ok_or_else(|| Error::Structure("no session dropdown (ul.dropdown-menu) on landing page".into()))?;

        let entries = dropdown
            .select(&DROPDOWN_ITEM)
            .map(|item| SessionEntry {
                text: item.text().collect::<String>().trim().to_string(),
                href: item
                    .select(&ANCHOR)
                    .next()
                    .and_then(|anchor| anchor.value().attr("href"))
                    .map(str::to_string),
            })
            .collect();

        Ok(entries)
    }

    fn video_containers<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>> {
        let main = document
            .select(&MAIN_CONTAINER)
            .next()
            .ok_or_else(|| Error::Structure("no video container under #main".into()))?;

        let containers = main
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|element| {
                element.value().name() == "div"
                    && element.value().classes().any(|class| class == MEDIA_CONTAINER_CLASS)
            })
            .collect();

        Ok(containers)
    }

    fn perspective(&self, container: ElementRef<'_>) -> Result<String> {
        let span = container
            .select(&PERSPECTIVE)
            .next()
            .ok_or_else(|| Error::Structure("video container without perspective label".into()))?;

        Ok(span.text().collect::<String>().trim().to_string())
    }

    fn download_link(&self, container: ElementRef<'_>) -> Option<String> {
        container
            .select(&DOWNLOAD_LINK)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::to_string)
    }
}
