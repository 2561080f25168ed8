use itertools::Itertools;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::configuration::ExtractorSettings;
use crate::domain::scrape_request::FallbackMetadata;

/// The "not found" sentinel. Extraction degrades to this instead of failing;
/// `is_empty()` is the miss test everywhere downstream.
pub const NOT_FOUND: &str = "";

// Currency marker next to a number, dragging an attached range along so
// "$50,000 - $70,000" survives whole. Best effort; false positives and
// misses are acceptable.
const SALARY_PATTERN: &str = r"(?i)(?:[$£€¥]|\b(?:USD|EUR|GBP|RUB|руб))\s*\d{1,3}(?:[ ,.]\d{3})*\s*[kк]?(?:\s*[-–—]\s*(?:[$£€¥]|\b(?:USD|EUR|GBP|RUB|руб))?\s*\d{1,3}(?:[ ,.]\d{3})*\s*[kк]?)?|\b\d{1,3}(?:[ ,.]\d{3})+\s*(?:[$£€¥]|USD|EUR|GBP|RUB|руб)";

pub struct ExtractedContent {
    pub title: String,
    pub h1: String,
    pub company: String,
    pub salary: Option<String>,
    pub description: String,
}

/// Ordered heuristics over rendered HTML. Pure and synchronous: a render
/// success always yields a usable record, however degraded.
pub struct ContentExtractor {
    salary_pattern: Regex,
    company_text_cap: usize,
}

impl ContentExtractor {
    pub fn new(settings: &ExtractorSettings) -> Self {
        ContentExtractor {
            salary_pattern: Regex::new(SALARY_PATTERN).unwrap(),
            company_text_cap: settings.company_text_cap,
        }
    }

    pub fn extract(&self, html: &str, fallback: Option<&FallbackMetadata>) -> ExtractedContent {
        let document = Html::parse_document(html);

        let h1 = first_text(&document, "h1");

        let mut title = first_text(&document, "title");
        if title.is_empty() {
            title = h1.clone();
        }
        if title.is_empty() {
            if let Some(position) = fallback.and_then(|f| f.position.as_deref()) {
                title = position.trim().to_string();
            }
        }

        let mut company = self.find_company(&document);
        if company.is_empty() {
            if let Some(name) = fallback.and_then(|f| f.company.as_deref()) {
                company = name.trim().to_string();
            }
        }

        let salary = self
            .salary_pattern
            .find(html)
            .map(|m| m.as_str().trim().to_string());

        let description = find_description(&document);

        ExtractedContent {
            title,
            h1,
            company,
            salary,
            description,
        }
    }

    fn find_company(&self, document: &Html) -> String {
        let meta_selector = Selector::parse(r#"meta[property="og:site_name"]"#).unwrap();
        let marked_selector = Selector::parse(
            r#"[class*="company"], [class*="employer"], [id*="company"], [id*="employer"]"#,
        )
        .unwrap();

        // og:site_name wins over everything else.
        if let Some(name) = document
            .select(&meta_selector)
            .next()
            .and_then(|el| el.value().attr("content"))
        {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }

        // First marked element with text short enough to not be a whole
        // container block.
        document
            .select(&marked_selector)
            .map(element_text)
            .find(|text| !text.is_empty() && text.chars().count() < self.company_text_cap)
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }
}

fn find_description(document: &Html) -> String {
    let container_selector = Selector::parse(
        r#"[class*="description"], [id*="description"], [class*="job-details"], [id*="job-details"], [class*="content"], [id*="content"]"#,
    )
    .unwrap();
    let block_selector =
        Selector::parse("body p, body h1, body h2, body h3, body h4, body h5, body h6, body li")
            .unwrap();

    // Longest marked container wins, first on ties.
    let best = document
        .select(&container_selector)
        .map(element_text)
        .fold(String::new(), |best, candidate| {
            if candidate.len() > best.len() {
                candidate
            } else {
                best
            }
        });
    if !best.is_empty() {
        return best;
    }

    document
        .select(&block_selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .join("\n\n")
}

fn first_text(document: &Html, selector: &str) -> String {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .map(element_text)
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
