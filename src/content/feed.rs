//! RSS 2.0 feed generation.
//!
//! Built from the same newest-first page sequence as the home page.

use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use time::format_description::well_known::Rfc2822;

use crate::content::index::{IndexError, SiteInfo};
use crate::content::page::Page;

/// Render the feed document for already-sorted pages.
pub fn render(pages: &[Page], site: &SiteInfo) -> Result<Vec<u8>, IndexError> {
    let items = pages
        .iter()
        .map(|page| page_to_item(page, &site.base_url))
        .collect::<Result<Vec<_>, _>>()?;

    let channel = ChannelBuilder::default()
        .title(site.title.clone())
        .link(site.base_url.clone())
        .description(format!("Latest posts from {}", site.title))
        .generator(Some(format!("memsite {}", env!("CARGO_PKG_VERSION"))))
        .items(items)
        .build();

    channel
        .write_to(Vec::new())
        .map_err(|e| IndexError::Feed(e.to_string()))
}

fn page_to_item(page: &Page, base_url: &str) -> Result<rss::Item, IndexError> {
    let pub_date = page
        .date
        .midnight()
        .assume_utc()
        .format(&Rfc2822)
        .map_err(|e| IndexError::Feed(format!("{}: {e}", page.url_path)))?;
    let link = format!("{}{}", base_url.trim_end_matches('/'), page.url_path);

    Ok(ItemBuilder::default()
        .title(Some(page.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .pub_date(Some(pub_date))
        .build())
}
