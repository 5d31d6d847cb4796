//! Per-site quote extraction from fetched HTML.
//!
//! Extraction is regex-based over the raw page body. All supported sites
//! print prices in Italian decimal-comma notation and dates as
//! `dd/mm/yyyy`.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::kind::ScraperKind;
use super::ScrapeError;

/// A price/date pair extracted from a quote page.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Parsed price.
    pub price: f32,
    /// Quote date.
    pub date: NaiveDate,
    /// Price as printed on the page.
    pub price_str: String,
    /// Date as printed on the page.
    pub date_str: String,
}

const DATE_FORMAT: &str = "%d/%m/%Y";

lazy_static! {
    static ref BORSA_PRICE: Regex =
        Regex::new(r"Prezzo ufficiale[^0-9,]*([0-9][0-9.,]*)").unwrap();
    static ref BORSA_DATE: Regex =
        Regex::new(r"[Aa]ggiornato al ([0-9]{2}/[0-9]{2}/[0-9]{4})").unwrap();
    static ref REPUBBLICA_PRICE: Regex =
        Regex::new(r#"class="TLB-quotazione"[^>]*>\s*([0-9][0-9.,]*)"#).unwrap();
    static ref REPUBBLICA_DATE: Regex =
        Regex::new(r#"class="TLB-data"[^>]*>\s*([0-9]{2}/[0-9]{2}/[0-9]{4})"#).unwrap();
    static ref MILANO_PRICE: Regex =
        Regex::new(r"Ultimo prezzo[^0-9,]*([0-9][0-9.,]*)").unwrap();
    static ref MILANO_DATE: Regex =
        Regex::new(r"del ([0-9]{2}/[0-9]{2}/[0-9]{4})").unwrap();
    static ref SOLDIONLINE_PRICE: Regex =
        Regex::new(r#"class="ultimo-prezzo"[^>]*>\s*([0-9][0-9.,]*)"#).unwrap();
    static ref SOLDIONLINE_DATE: Regex =
        Regex::new(r#"class="data-quotazione"[^>]*>\s*([0-9]{2}/[0-9]{2}/[0-9]{4})"#).unwrap();
}

fn patterns(kind: ScraperKind) -> (&'static Regex, &'static Regex) {
    match kind {
        ScraperKind::BorsaItaliana => (&BORSA_PRICE, &BORSA_DATE),
        ScraperKind::FinanzaRepubblica => (&REPUBBLICA_PRICE, &REPUBBLICA_DATE),
        ScraperKind::MilanoFinanza => (&MILANO_PRICE, &MILANO_DATE),
        ScraperKind::SoldiOnline => (&SOLDIONLINE_PRICE, &SOLDIONLINE_DATE),
    }
}

fn capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Parse an Italian decimal-comma price ("1.234,56" -> 1234.56).
fn parse_price(text: &str) -> Result<f32, ScrapeError> {
    let normalized = text.replace('.', "").replace(',', ".");
    normalized
        .parse::<f32>()
        .map_err(|_| ScrapeError::BadPrice(text.to_owned()))
}

/// Extract the quote from a fetched page body.
pub fn extract(kind: ScraperKind, body: &str) -> Result<Quote, ScrapeError> {
    let (price_re, date_re) = patterns(kind);

    let price_str = capture(price_re, body).ok_or(ScrapeError::PriceNotFound(kind))?;
    let date_str = capture(date_re, body).ok_or(ScrapeError::DateNotFound(kind))?;

    let price = parse_price(&price_str)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|_| ScrapeError::BadDate(date_str.clone()))?;

    Ok(Quote {
        price,
        date,
        price_str,
        date_str,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borsa_italiana_page() {
        let body = r#"
            <div class="summary">
              <span>Prezzo ufficiale</span> <strong>1.234,56</strong>
              <p>aggiornato al 31/07/2026</p>
            </div>"#;
        let quote = extract(ScraperKind::BorsaItaliana, body).unwrap();
        assert_eq!(quote.price, 1234.56);
        assert_eq!(quote.price_str, "1.234,56");
        assert_eq!(quote.date, NaiveDate::from_ymd_opt(2026, 7, 31).unwrap());
    }

    #[test]
    fn finanza_repubblica_page() {
        let body = r#"
            <span class="TLB-quotazione">12,345</span>
            <span class="TLB-data">30/07/2026</span>"#;
        let quote = extract(ScraperKind::FinanzaRepubblica, body).unwrap();
        assert_eq!(quote.price, 12.345);
        assert_eq!(quote.date_str, "30/07/2026");
    }

    #[test]
    fn milano_finanza_page() {
        let body = "<td>Ultimo prezzo: <b>7,89</b></td> <td>del 29/07/2026</td>";
        let quote = extract(ScraperKind::MilanoFinanza, body).unwrap();
        assert_eq!(quote.price, 7.89);
    }

    #[test]
    fn soldionline_page() {
        let body = r#"
            <td class="ultimo-prezzo">0,4321</td>
            <td class="data-quotazione">28/07/2026</td>"#;
        let quote = extract(ScraperKind::SoldiOnline, body).unwrap();
        assert_eq!(quote.price, 0.4321);
    }

    #[test]
    fn missing_price_is_reported() {
        let err = extract(ScraperKind::SoldiOnline, "<html></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::PriceNotFound(ScraperKind::SoldiOnline)));
    }

    #[test]
    fn missing_date_is_reported() {
        let body = r#"<td class="ultimo-prezzo">0,4321</td>"#;
        let err = extract(ScraperKind::SoldiOnline, body).unwrap_err();
        assert!(matches!(err, ScrapeError::DateNotFound(ScraperKind::SoldiOnline)));
    }

    #[test]
    fn italian_decimal_notation() {
        assert_eq!(parse_price("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_price("0,5").unwrap(), 0.5);
        assert!(parse_price("n/a").is_err());
    }
}
