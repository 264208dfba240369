//! Parser for store search-result pages.
//!
//! Each product is rendered as a card `div.a-section.a-spacing-base`. A card
//! becomes a [`Product`] only if every field is present and well-formed;
//! otherwise the whole card is dropped with a [`SkipReason`]. Sponsored cards
//! are dropped as well. Parsing never fails and never panics.
//!
//! The selectors below describe where the store currently puts things. They
//! break whenever the store changes its markup.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::model::Product;

const CARD: &str = "div.a-section.a-spacing-base";
const BADGE: &str = "span.a-color-secondary";
const LINK: &str = "a.a-link-normal.s-no-outline";
const NAME: &str = "span.a-size-base-plus.a-color-base.a-text-normal";
const IMAGE: &str = "img.s-image";
const PRICE: &str = "span.a-offscreen";
const RATING: &str = "span.a-icon-alt";
const VOTES: &str = "span.a-size-base.s-underline-text";

/// Badge texts that mark a paid placement.
const SPONSORED_LABELS: &[&str] = &["Patrocinado", "Sponsored"];

/// Identifiers are alphanumeric and run up to the next path, query or
/// fragment delimiter.
static PRODUCT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dp/([A-Za-z0-9]+)(?:[/?#]|$)").expect("valid regex"));

struct Selectors {
    card: Selector,
    badge: Selector,
    link: Selector,
    name: Selector,
    image: Selector,
    price: Selector,
    rating: Selector,
    votes: Selector,
}

static SELECTORS: Lazy<Selectors> = Lazy::new(|| {
    let parse = |css: &str| Selector::parse(css).expect("valid selector");
    Selectors {
        card: parse(CARD),
        badge: parse(BADGE),
        link: parse(LINK),
        name: parse(NAME),
        image: parse(IMAGE),
        price: parse(PRICE),
        rating: parse(RATING),
        votes: parse(VOTES),
    }
});

/// Why a product card did not produce a [`Product`].
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Sponsored,
    MissingField(&'static str),
    MissingIdentifier { url: String },
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Sponsored => f.write_str("sponsored listing"),
            SkipReason::MissingField(field) => write!(f, "missing field '{field}'"),
            SkipReason::MissingIdentifier { url } => {
                write!(f, "no product identifier in link '{url}'")
            }
            SkipReason::InvalidField { field, value } => {
                write!(f, "field '{field}' has unparsable value '{value}'")
            }
        }
    }
}

/// Products and skipped cards found on one search-results page.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub products: Vec<Product>,
    pub skipped: Vec<SkipReason>,
}

/// Parse one page of search-result markup.
pub fn parse_search_page(html: &str) -> SearchPage {
    let doc = Html::parse_document(html);
    let mut page = SearchPage::default();

    for card in doc.select(&SELECTORS.card) {
        match parse_card(card) {
            Ok(product) => page.products.push(product),
            Err(SkipReason::Sponsored) => {
                debug!("skipping sponsored product");
                page.skipped.push(SkipReason::Sponsored);
            }
            Err(reason) => {
                warn!(reason = %reason, "skipping product card");
                page.skipped.push(reason);
            }
        }
    }

    page
}

fn parse_card(card: ElementRef<'_>) -> Result<Product, SkipReason> {
    let sponsored = card
        .select(&SELECTORS.badge)
        .any(|badge| SPONSORED_LABELS.contains(&element_text(badge).as_str()));
    if sponsored {
        return Err(SkipReason::Sponsored);
    }

    let href = card
        .select(&SELECTORS.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or(SkipReason::MissingField("link"))?;
    let id = extract_product_id(href).ok_or_else(|| SkipReason::MissingIdentifier {
        url: href.to_string(),
    })?;

    let name = required_text(card, &SELECTORS.name, "name")?;
    let image_url = card
        .select(&SELECTORS.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or(SkipReason::MissingField("image"))?
        .to_string();
    let price = required_text(card, &SELECTORS.price, "price")?;

    let rating_text = required_text(card, &SELECTORS.rating, "rating")?;
    let rating = parse_rating(&rating_text).ok_or(SkipReason::InvalidField {
        field: "rating",
        value: rating_text,
    })?;

    let votes_text = required_text(card, &SELECTORS.votes, "votes")?;
    let votes = parse_votes(&votes_text).ok_or(SkipReason::InvalidField {
        field: "votes",
        value: votes_text,
    })?;

    Ok(Product {
        id,
        name,
        image_url,
        price,
        rating,
        votes,
    })
}

/// Extract the product identifier from a detail-page URL.
///
/// `/Monitor-Dell/dp/B0ABC12345/ref=sr_1_1` → `B0ABC12345`
pub fn extract_product_id(url: &str) -> Option<String> {
    PRODUCT_ID_RE.captures(url).map(|caps| caps[1].to_string())
}

/// Parse a rating from display text such as "4,5 de 5 estrelas" or
/// "4.5 out of 5 stars". Only the first three characters are read.
fn parse_rating(text: &str) -> Option<f32> {
    let head: String = text.trim().chars().take(3).collect();
    let rating = head.replace(',', ".").parse::<f32>().ok()?;
    (0.0..=5.0).contains(&rating).then_some(rating)
}

/// Parse a vote count such as "1.234", "1,234" or "(87)".
fn parse_votes(text: &str) -> Option<u64> {
    let digits: String = text
        .trim()
        .trim_matches(|c| c == '(' || c == ')')
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect();
    digits.parse::<u64>().ok()
}

fn required_text(
    card: ElementRef<'_>,
    selector: &Selector,
    field: &'static str,
) -> Result<String, SkipReason> {
    card.select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .ok_or(SkipReason::MissingField(field))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Render one product card the way the store does.
    pub(crate) fn card(id: &str, name: &str) -> String {
        format!(
            r#"<div class="a-section a-spacing-base">
  <a class="a-link-normal s-no-outline" href="/{name}/dp/{id}/ref=sr_1_1?keywords=x">
    <img class="s-image" src="https://m.media-amazon.com/images/I/{id}.jpg">
  </a>
  <span class="a-size-base-plus a-color-base a-text-normal">{name}</span>
  <span class="a-icon-alt">4,6 de 5 estrelas</span>
  <span class="a-size-base s-underline-text">1.234</span>
  <span class="a-price"><span class="a-offscreen">R$&nbsp;1.299,00</span></span>
</div>"#
        )
    }

    pub(crate) fn page(cards: &[String]) -> String {
        format!(
            "<html><body><div class=\"s-main-slot\">{}</div></body></html>",
            cards.join("\n")
        )
    }

    fn sponsored_card(id: &str) -> String {
        card(id, "Promo").replace(
            "<div class=\"a-section a-spacing-base\">",
            concat!(
                "<div class=\"a-section a-spacing-base\">",
                "<span class=\"a-color-secondary\">Patrocinado</span>",
            ),
        )
    }

    #[test]
    fn parses_complete_card() {
        let result = parse_search_page(&page(&[card("B0ABC12345", "Monitor Dell 24")]));
        assert!(result.skipped.is_empty());
        assert_eq!(result.products.len(), 1);

        let p = &result.products[0];
        assert_eq!(p.id, "B0ABC12345");
        assert_eq!(p.name, "Monitor Dell 24");
        assert_eq!(p.image_url, "https://m.media-amazon.com/images/I/B0ABC12345.jpg");
        assert_eq!(p.price, "R$\u{a0}1.299,00");
        assert_eq!(p.rating, 4.6);
        assert_eq!(p.votes, 1234);
    }

    #[test]
    fn missing_field_drops_card_without_panicking() {
        let broken = card("B0BROKEN01", "No Price").replace("a-offscreen", "a-price-whole");
        let result = parse_search_page(&page(&[broken, card("B0GOOD0001", "Good")]));

        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].id, "B0GOOD0001");
        assert_eq!(result.skipped, vec![SkipReason::MissingField("price")]);
    }

    #[test]
    fn unparsable_rating_drops_card() {
        let broken = card("B0RATING01", "Odd").replace("4,6 de 5 estrelas", "sem avaliações");
        let result = parse_search_page(&page(&[broken]));
        assert!(result.products.is_empty());
        assert!(matches!(
            result.skipped[0],
            SkipReason::InvalidField { field: "rating", .. }
        ));
    }

    #[test]
    fn only_sponsored_cards_yield_nothing() {
        let result = parse_search_page(&page(&[
            sponsored_card("B0SPONS001"),
            sponsored_card("B0SPONS002"),
        ]));
        assert!(result.products.is_empty());
        assert_eq!(result.skipped, vec![SkipReason::Sponsored, SkipReason::Sponsored]);
    }

    #[test]
    fn link_without_dp_segment_drops_card() {
        let broken = card("B0NODP0001", "Elsewhere").replace("/dp/B0NODP0001/", "/gp/slredirect/");
        let result = parse_search_page(&page(&[broken]));
        assert!(result.products.is_empty());
        assert!(matches!(result.skipped[0], SkipReason::MissingIdentifier { .. }));
    }

    #[test]
    fn empty_markup_yields_nothing() {
        let result = parse_search_page("");
        assert!(result.products.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_extract_product_id() {
        assert_eq!(
            extract_product_id("/Monitor-Dell/dp/B0ABC12345/ref=sr_1_1").as_deref(),
            Some("B0ABC12345")
        );
        assert_eq!(
            extract_product_id("https://www.amazon.com.br/dp/B0ABC12345?th=1").as_deref(),
            Some("B0ABC12345")
        );
        assert_eq!(extract_product_id("/gp/slredirect/picassoRedirect.html"), None);
        assert_eq!(extract_product_id("/x/dp/"), None);
        assert_eq!(extract_product_id("/x/dp/B0-ABC/ref=sr"), None);
        assert_eq!(extract_product_id("/x/dp/B0ABC%2F12/"), None);
        assert_eq!(extract_product_id("/dp/B0ABC12345").as_deref(), Some("B0ABC12345"));
    }

    #[test]
    fn non_alphanumeric_identifier_drops_card() {
        let odd = card("B0ABC12345", "Odd").replace("/dp/B0ABC12345/", "/dp/B0ABC..345/");
        let result = parse_search_page(&page(&[odd, card("B0GOOD0001", "Good")]));
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].id, "B0GOOD0001");
        assert!(matches!(result.skipped[0], SkipReason::MissingIdentifier { .. }));
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("4,5 de 5 estrelas"), Some(4.5));
        assert_eq!(parse_rating("3.9 out of 5 stars"), Some(3.9));
        assert_eq!(parse_rating("5 de 5 estrelas"), None);
        assert_eq!(parse_rating("9,9 de 5"), None);
        assert_eq!(parse_rating(""), None);
    }

    #[test]
    fn test_parse_votes() {
        assert_eq!(parse_votes("1.234"), Some(1234));
        assert_eq!(parse_votes("12,345"), Some(12345));
        assert_eq!(parse_votes("(87)"), Some(87));
        assert_eq!(parse_votes("muitos"), None);
    }
}
