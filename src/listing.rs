//! Renders collected pages as a listing fragment.

use crate::collect::{CollectedPage, Result};

/// How each listed page is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The page's full converted body, wrapped in an `<article>`.
    Content,

    /// A single line linking to the page, with its long date, its abstract,
    /// and a comment-count link.
    Summary,
}

/// Renders the first `limit` pages (all of them if `limit` is `None`) in
/// order. Summaries need each page's `title` and `abstract` fields.
pub fn render(pages: &[CollectedPage], limit: Option<usize>, mode: Mode) -> Result<String> {
    let limit = limit.unwrap_or(pages.len());
    let mut listing = String::new();
    for page in pages.iter().take(limit) {
        match mode {
            Mode::Content => {
                listing.push_str("<article>\n");
                listing.push_str(&page.html);
                listing.push_str("\n</article>\n\n");
            }
            Mode::Summary => listing.push_str(&summary(page)?),
        }
    }
    Ok(listing)
}

fn summary(page: &CollectedPage) -> Result<String> {
    let title = page.require("title")?;
    let date = page.require("date_long_string")?;
    let abstract_ = page.require("abstract")?;
    Ok(format!(
        "<a href=\"{url}\">{}</a> - <strong>{}</strong> - {} <a href=\"{url}#disqus_thread\">Comments</a>   \n",
        title,
        date,
        abstract_,
        url = page.url,
    ))
}
