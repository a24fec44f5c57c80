//! Concrete archive fetcher
//!
//! Field extraction rules for the newspaper's comic archive:
//! - The frontpage lists one card per series (`div.cartoon-content`) with the
//!   series title in `span.title` and its homepage in a
//!   `meta[itemprop=contentUrl]` element.
//! - A series homepage carries the latest strip's page link inside a
//!   `figure` element, again as `meta[itemprop=contentUrl]`.
//! - A strip page shows its date in `span.date` (optionally prefixed with a
//!   weekday), the high-resolution image in `img[data-srcset]` as
//!   `"<location> 1920w"`, and the backward navigation link as
//!   `a.article-navlink.prev`. Image locations are scheme-relative.

use crate::config::SiteConfig;
use crate::fetch::{ComicListing, ComicPage, PageFetcher};
use crate::{Result, StrippiError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// PageFetcher implementation for the newspaper archive
pub struct SiteFetcher {
    client: Client,
    base_url: Url,
    comics_path: String,
}

impl SiteFetcher {
    pub fn new(client: Client, site: &SiteConfig) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)?;
        Ok(Self {
            client,
            base_url,
            comics_path: site.comics_path.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| StrippiError::Http {
                url: url.to_string(),
                source,
            })?;

        response.text().await.map_err(|source| StrippiError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for SiteFetcher {
    async fn fetch_frontpage(&self) -> Result<Vec<ComicListing>> {
        let url = self.base_url.join(&self.comics_path)?;
        let body = self.get_text(url.as_str()).await?;
        parse_frontpage(&body, &self.base_url, url.as_str())
    }

    async fn fetch_latest_url(&self, homepage_url: &str) -> Result<String> {
        let body = self.get_text(homepage_url).await?;
        parse_latest_url(&body, &self.base_url, homepage_url)
    }

    async fn fetch_page(&self, url: &str) -> Result<ComicPage> {
        let body = self.get_text(url).await?;
        parse_page(&body, &self.base_url, url)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| StrippiError::Http {
                url: url.to_string(),
                source,
            })?;

        let bytes = response.bytes().await.map_err(|source| StrippiError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

fn structure_err(url: &str, message: &str) -> StrippiError {
    StrippiError::PageStructure {
        url: url.to_string(),
        message: message.to_string(),
    }
}

/// First element matching `css`, as trimmed text
fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let element = document.select(&sel).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First element matching `css`, as the given attribute's value
fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let element = document.select(&sel).next()?;
    Some(element.value().attr(attr)?.to_string())
}

fn parse_frontpage(html: &str, base: &Url, page_url: &str) -> Result<Vec<ComicListing>> {
    let document = Html::parse_document(html);

    let cards = Selector::parse("div.cartoon-content").ok();
    let title = Selector::parse("span.title").ok();
    let homepage = Selector::parse(r#"meta[itemprop="contentUrl"]"#).ok();
    let (Some(cards), Some(title), Some(homepage)) = (cards, title, homepage) else {
        return Err(structure_err(page_url, "invalid frontpage selectors"));
    };

    let mut listings = Vec::new();
    for card in document.select(&cards) {
        let name = card
            .select(&title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| structure_err(page_url, "comic card without a title"))?;

        let href = card
            .select(&homepage)
            .next()
            .and_then(|el| el.value().attr("content"))
            .ok_or_else(|| structure_err(page_url, "comic card without a contentUrl"))?;

        listings.push(ComicListing {
            name,
            url: base.join(href)?.to_string(),
        });
    }

    Ok(listings)
}

fn parse_latest_url(html: &str, base: &Url, page_url: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let href = first_attr(&document, r#"figure meta[itemprop="contentUrl"]"#, "content")
        .ok_or_else(|| structure_err(page_url, "no latest strip link on homepage"))?;

    Ok(base.join(&href)?.to_string())
}

fn parse_page(html: &str, base: &Url, page_url: &str) -> Result<ComicPage> {
    let document = Html::parse_document(html);

    let date_text = first_text(&document, "span.date")
        .ok_or_else(|| structure_err(page_url, "strip page without a date"))?;

    // data-srcset holds "<location> 1920w"; only the location matters
    let srcset = first_attr(&document, "img[data-srcset]", "data-srcset")
        .ok_or_else(|| structure_err(page_url, "strip page without an image"))?;
    let image_location = srcset
        .split_whitespace()
        .next()
        .ok_or_else(|| structure_err(page_url, "empty data-srcset"))?;
    let image_url = base.join(image_location)?.to_string();

    let previous_url = match first_attr(&document, "a.article-navlink.prev", "href") {
        Some(href) => Some(base.join(&href)?.to_string()),
        None => None,
    };

    Ok(ComicPage {
        date_text,
        image_url,
        previous_url,
    })
}
