//! `Link` header handling for REST pagination.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#).unwrap());

/// URL of the `rel="next"` page, if the server advertised one.
pub fn next_page_url(link_header: Option<&str>) -> Option<String> {
  let header = link_header?;

  RE_LINK
    .captures_iter(header)
    .find(|c| c[2].split_whitespace().any(|rel| rel == "next"))
    .map(|c| c[1].to_string())
}
