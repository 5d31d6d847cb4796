//! Registry of supported quote sites.

use std::fmt;
use std::str::FromStr;

use super::ScrapeError;

/// A supported quote site.
///
/// Each kind maps to one worker kind in the pool and to one extraction
/// rule set in [`extract`](super::extract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScraperKind {
    /// borsaitaliana.it listing pages.
    BorsaItaliana,
    /// finanza.repubblica.it quote pages.
    FinanzaRepubblica,
    /// milanofinanza.it quote pages.
    MilanoFinanza,
    /// soldionline.it quote pages.
    SoldiOnline,
}

const NAMES: &[(&str, ScraperKind)] = &[
    ("borsaitaliana", ScraperKind::BorsaItaliana),
    ("finanza.repubblica", ScraperKind::FinanzaRepubblica),
    ("milanofinanza", ScraperKind::MilanoFinanza),
    ("soldionline", ScraperKind::SoldiOnline),
];

const URL_PREFIXES: &[(&str, ScraperKind)] = &[
    ("http://www.borsaitaliana.it/", ScraperKind::BorsaItaliana),
    ("https://www.borsaitaliana.it/", ScraperKind::BorsaItaliana),
    ("http://finanza.repubblica.it/", ScraperKind::FinanzaRepubblica),
    ("https://finanza.repubblica.it/", ScraperKind::FinanzaRepubblica),
    ("http://www.milanofinanza.it/", ScraperKind::MilanoFinanza),
    ("https://www.milanofinanza.it/", ScraperKind::MilanoFinanza),
    ("http://www.soldionline.it/", ScraperKind::SoldiOnline),
    ("https://www.soldionline.it/", ScraperKind::SoldiOnline),
];

impl ScraperKind {
    /// Resolve a configuration name into a kind.
    pub fn from_name(name: &str) -> Result<Self, ScrapeError> {
        NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ScrapeError::UnknownScraper(name.to_owned()))
    }

    /// Resolve the kind from a quote page URL.
    pub fn from_url(url: &str) -> Result<Self, ScrapeError> {
        URL_PREFIXES
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ScrapeError::UnknownSite(url.to_owned()))
    }

    /// Canonical configuration name, also used as the pool worker key.
    pub fn name(&self) -> &'static str {
        match self {
            ScraperKind::BorsaItaliana => "borsaitaliana",
            ScraperKind::FinanzaRepubblica => "finanza.repubblica",
            ScraperKind::MilanoFinanza => "milanofinanza",
            ScraperKind::SoldiOnline => "soldionline",
        }
    }
}

impl fmt::Display for ScraperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScraperKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for (name, kind) in NAMES {
            assert_eq!(ScraperKind::from_name(name).unwrap(), *kind);
            assert_eq!(kind.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            ScraperKind::from_name("yahoo"),
            Err(ScrapeError::UnknownScraper(_))
        ));
    }

    #[test]
    fn url_resolution() {
        let kind = ScraperKind::from_url("https://www.milanofinanza.it/quotazioni/acme").unwrap();
        assert_eq!(kind, ScraperKind::MilanoFinanza);

        assert!(matches!(
            ScraperKind::from_url("https://example.com/acme"),
            Err(ScrapeError::UnknownSite(_))
        ));
    }
}
