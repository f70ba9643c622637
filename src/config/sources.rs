use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Data URLs configured for one country.
/// Either a single year-less URL or a map of year -> URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    Single(String),
    ByYear(BTreeMap<String, String>),
}

impl Sources {
    /// Years in lexicographic order. Empty for a single year-less URL.
    pub fn years(&self) -> Vec<&str> {
        match self {
            Sources::Single(_) => Vec::new(),
            Sources::ByYear(by_year) => by_year.keys().map(String::as_str).collect(),
        }
    }

    /// Latest year by lexicographic order of the year keys.
    pub fn latest_year(&self) -> Option<&str> {
        match self {
            Sources::Single(_) => None,
            Sources::ByYear(by_year) => by_year.keys().next_back().map(String::as_str),
        }
    }

    /// URL for `year`. A single source only answers the year-less lookup.
    pub fn url(&self, year: Option<&str>) -> Option<&str> {
        match (self, year) {
            (Sources::Single(url), None) => Some(url),
            (Sources::ByYear(by_year), Some(year)) => by_year.get(year).map(String::as_str),
            _ => None,
        }
    }

    /// URL for `year`, or for the latest year when `year` is None.
    pub fn url_or_latest<'a>(&'a self, year: Option<&'a str>) -> Option<(Option<&'a str>, &'a str)> {
        match self {
            Sources::Single(url) => Some((None, url.as_str())),
            Sources::ByYear(_) => {
                let year = year.or_else(|| self.latest_year())?;
                self.url(Some(year)).map(|url| (Some(year), url))
            }
        }
    }

    pub fn is_single(&self) -> bool { matches!(self, Sources::Single(_)) }

    /// All URLs, in year order.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Sources::Single(url) => vec![url.as_str()],
            Sources::ByYear(by_year) => by_year.values().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zambia() -> Sources {
        Sources::ByYear(BTreeMap::from([
            ("2019".to_string(), "https://x/2019.pmtiles".to_string()),
            ("2018".to_string(), "https://x/2018.pmtiles".to_string()),
            ("2023".to_string(), "https://x/2023.pmtiles".to_string()),
        ]))
    }

    #[test]
    fn years_are_sorted() {
        assert_eq!(zambia().years(), vec!["2018", "2019", "2023"]);
        assert_eq!(zambia().latest_year(), Some("2023"));
    }

    #[test]
    fn single_source_has_no_years() {
        let congo = Sources::Single("https://x/congo.pmtiles".into());
        assert!(congo.years().is_empty());
        assert_eq!(congo.latest_year(), None);
        assert_eq!(congo.url(None), Some("https://x/congo.pmtiles"));
        assert_eq!(congo.url(Some("2022")), None);
    }

    #[test]
    fn year_lookup_requires_year() {
        let sources = zambia();
        assert_eq!(sources.url(Some("2019")), Some("https://x/2019.pmtiles"));
        assert_eq!(sources.url(Some("2024")), None);
        assert_eq!(sources.url(None), None);
    }

    #[test]
    fn url_or_latest_falls_back_to_latest_year() {
        let sources = zambia();
        assert_eq!(sources.url_or_latest(None), Some((Some("2023"), "https://x/2023.pmtiles")));
        assert_eq!(sources.url_or_latest(Some("2018")), Some((Some("2018"), "https://x/2018.pmtiles")));
        assert_eq!(sources.url_or_latest(Some("1999")), None);
    }

    #[test]
    fn url_or_latest_accepts_caller_owned_year() {
        let sources = zambia();
        let year = String::from("2019");
        let (resolved, url) = sources.url_or_latest(Some(year.as_str())).unwrap();
        assert_eq!(resolved, Some("2019"));
        assert_eq!(url, "https://x/2019.pmtiles");
    }

    #[test]
    fn deserializes_both_shapes() {
        let single: Sources = serde_json::from_str(r#""https://x/a.pmtiles""#).unwrap();
        assert!(single.is_single());
        let by_year: Sources = serde_json::from_str(r#"{"2020": "https://x/b.pmtiles"}"#).unwrap();
        assert_eq!(by_year.years(), vec!["2020"]);
    }
}
