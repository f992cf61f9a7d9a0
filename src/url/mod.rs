//! URL handling module for Page-Audit
//!
//! This module turns links discovered on a page into absolute, de-duplicable
//! URLs and validates page URLs supplied by the user.

mod normalize;

pub use normalize::{normalize_link, parse_page_url};

use std::collections::BTreeSet;
use url::Url;

/// Normalizes every link and de-duplicates the result
///
/// Links that cannot be normalized (fragments, `mailto:` and friends,
/// unparsable hrefs) are skipped with a debug log. The returned set is
/// ordered by URL string, which is also the report order.
pub fn normalize_links<I, S>(links: I, base: &Url) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique = BTreeSet::new();

    for link in links {
        match normalize_link(link.as_ref(), base) {
            Ok(url) => {
                unique.insert(url.to_string());
            }
            Err(e) => {
                tracing::debug!("Skipping link '{}': {}", link.as_ref(), e);
            }
        }
    }

    unique
}
