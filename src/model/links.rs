use reqwest::header::{HeaderMap, LINK};
use url::Url;

/// Pagination links parsed from a `Link` response header (RFC 8288).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    /// The URL of the next page.
    pub next: Option<Url>,
    /// The URL of the previous page.
    pub prev: Option<Url>,
    /// The URL of the first page.
    pub first: Option<Url>,
    /// The URL of the last page.
    pub last: Option<Url>,
}

impl PaginationLinks {
    /// Parses the value of a `Link` header.
    ///
    /// Targets are resolved against `base`, so relative references are accepted.
    /// Entries that cannot be parsed are skipped.
    pub fn from_header(header_value: &str, base: &Url) -> Self {
        let mut links = Self::default();

        for part in split_link_values(header_value) {
            let mut target = None;
            let mut relations = None;

            for segment in part.split(';') {
                let segment = segment.trim();
                if let Some(stripped) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>'))
                {
                    target = Some(stripped);
                } else if let Some((key, value)) = segment.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("rel") {
                        relations = Some(value.trim().trim_matches('"'));
                    }
                }
            }

            let (Some(target), Some(relations)) = (target, relations) else {
                continue;
            };
            let Ok(url) = base.join(target) else {
                continue;
            };
            // A single link may carry several space separated relation types.
            for relation in relations.split_whitespace() {
                let slot = match relation.to_ascii_lowercase().as_str() {
                    "next" => &mut links.next,
                    "prev" | "previous" => &mut links.prev,
                    "first" => &mut links.first,
                    "last" => &mut links.last,
                    _ => continue,
                };
                slot.get_or_insert_with(|| url.clone());
            }
        }

        links
    }

    /// Parses the pagination links from the response headers.
    pub fn from_headers(headers: &HeaderMap, base: &Url) -> Self {
        headers
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .fold(Self::default(), |links, value| {
                links.merge(Self::from_header(value, base))
            })
    }

    fn merge(self, other: Self) -> Self {
        Self {
            next: self.next.or(other.next),
            prev: self.prev.or(other.prev),
            first: self.first.or(other.first),
            last: self.last.or(other.last),
        }
    }
}

/// Splits a `Link` header value on the commas found outside `<...>` targets.
fn split_link_values(header_value: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut in_target = false;
    let mut start = 0;
    for (index, character) in header_value.char_indices() {
        match character {
            '<' => in_target = true,
            '>' => in_target = false,
            ',' if !in_target => {
                parts.push(&header_value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&header_value[start..]);

    parts
}
