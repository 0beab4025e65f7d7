//! Product metadata table
//!
//! Metadata arrives as JSON lines with heterogeneous field layouts: ids under
//! `parent_asin` or `asin`, prices as numbers or `"$1,299.99"` strings, images
//! under one of three different keys. Everything is normalised into [`Product`]
//! once at load time.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

const MAX_DESCRIPTION_CHARS: usize = 200;

/// One catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub store: Option<String>,
    pub categories: Vec<String>,
    pub image_url: Option<String>,
}

impl Product {
    /// Minimal record for an identifier with no other metadata
    pub fn new(product_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            description: None,
            price: None,
            rating: None,
            rating_count: None,
            store: None,
            categories: Vec::new(),
            image_url: None,
        }
    }

    /// Normalise one raw metadata object; `None` when it carries no identifier
    pub fn from_json(raw: &Value) -> Option<Self> {
        let product_id = non_empty_str(raw.get("parent_asin"))
            .or_else(|| non_empty_str(raw.get("asin")))
            .or_else(|| non_empty_str(raw.get("product_id")))?
            .to_string();

        let title = non_empty_str(raw.get("title"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Product {}", product_id));

        let categories = raw
            .get("categories")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| non_empty_str(Some(v)))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let rating = raw
            .get("average_rating")
            .and_then(Value::as_f64)
            .filter(|r| (0.0..=5.0).contains(r));

        let rating_count = raw.get("rating_number").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
        });

        Some(Self {
            product_id,
            title,
            description: extract_description(raw),
            price: raw.get("price").and_then(parse_price),
            rating,
            rating_count,
            store: non_empty_str(raw.get("store")).map(str::to_string),
            categories,
            image_url: extract_image_url(raw),
        })
    }

    /// Text the content index is built from: title followed by categories
    pub fn content_text(&self) -> String {
        let mut text = self.title.clone();
        for category in &self.categories {
            text.push(' ');
            text.push_str(category);
        }
        text
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    /// Case-insensitive match of an already lowercased needle against title and categories
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(needle))
    }
}

/// Parse a price given as a JSON number or a string such as `"$1,299.99"`
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect::<String>()
                .trim()
                .to_string();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
        }
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn first_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|first| non_empty_str(Some(first)))
        .map(str::to_string)
}

fn extract_image_url(raw: &Value) -> Option<String> {
    if let Some(url) = first_str(raw.get("imageURLHighRes")) {
        return Some(url);
    }
    if let Some(url) = first_str(raw.get("imageURL")) {
        return Some(url);
    }

    let first = raw.get("images")?.as_array()?.first()?;
    match first {
        Value::Object(_) => ["hi_res", "large", "thumb"]
            .iter()
            .find_map(|key| non_empty_str(first.get(*key)))
            .map(str::to_string),
        Value::String(_) => non_empty_str(Some(first)).map(str::to_string),
        _ => None,
    }
}

fn extract_description(raw: &Value) -> Option<String> {
    let description = match raw.get("description") {
        Some(Value::Array(parts)) => parts
            .iter()
            .take(2)
            .filter_map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let description = if description.trim().is_empty() {
        first_str(raw.get("features")).unwrap_or_default()
    } else {
        description
    };

    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        Some(format!("{}...", truncated))
    } else {
        Some(description.to_string())
    }
}

/// Immutable metadata table keyed by product identifier
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog; the first record for an identifier wins
    pub fn from_products<I>(products: I) -> Self
    where
        I: IntoIterator<Item = Product>,
    {
        let mut catalog = Catalog::default();
        for product in products {
            if catalog.by_id.contains_key(&product.product_id) {
                continue;
            }
            catalog
                .by_id
                .insert(product.product_id.clone(), catalog.products.len());
            catalog.products.push(product);
        }
        catalog
    }

    /// Load a JSON-lines metadata file, skipping lines that don't parse.
    ///
    /// Only an I/O failure of the file itself is an error.
    pub fn from_jsonl<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut products = Vec::new();
        let mut skipped = 0usize;

        // Raw bytes so a line with broken UTF-8 is skipped like any other bad line
        for (line_no, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Value>(&line) {
                Ok(raw) => match Product::from_json(&raw) {
                    Some(product) => products.push(product),
                    None => skipped += 1,
                },
                Err(e) => {
                    debug!("Skipping metadata line {}: {}", line_no + 1, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unusable metadata lines", skipped);
        }

        Ok(Self::from_products(products))
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.by_id.get(product_id).map(|&i| &self.products[i])
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.by_id.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products in load order
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Case-insensitive substring search over titles and categories
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|p| p.matches(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price(&json!(13.99)), Some(13.99));
        assert_eq!(parse_price(&json!(20)), Some(20.0));
        assert_eq!(parse_price(&json!("$1,299.99")), Some(1299.99));
        assert_eq!(parse_price(&json!(" $5 ")), Some(5.0));
        assert_eq!(parse_price(&json!("")), None);
        assert_eq!(parse_price(&json!("call for price")), None);
        assert_eq!(parse_price(&json!(null)), None);
    }

    #[test]
    fn test_product_from_heterogeneous_json() {
        let raw = json!({
            "asin": "B01",
            "title": "Chef Knife",
            "price": "$39.50",
            "average_rating": 4.6,
            "rating_number": 1200,
            "store": "Cutlery Co",
            "categories": ["Kitchen", "Knives"],
            "description": [],
            "features": ["High-carbon steel"],
            "images": [{"large": "https://img/large.jpg", "thumb": "https://img/t.jpg"}]
        });

        let product = Product::from_json(&raw).unwrap();
        assert_eq!(product.product_id, "B01");
        assert_eq!(product.price, Some(39.5));
        assert_eq!(product.rating_count, Some(1200));
        assert_eq!(product.description.as_deref(), Some("High-carbon steel"));
        assert_eq!(product.image_url.as_deref(), Some("https://img/large.jpg"));
        assert_eq!(product.content_text(), "Chef Knife Kitchen Knives");
    }

    #[test]
    fn test_parent_asin_preferred_and_title_fallback() {
        let raw = json!({"parent_asin": "P1", "asin": "A1", "imageURL": ["u"]});
        let product = Product::from_json(&raw).unwrap();
        assert_eq!(product.product_id, "P1");
        assert_eq!(product.title, "Product P1");
        assert_eq!(product.image_url.as_deref(), Some("u"));

        assert!(Product::from_json(&json!({"title": "no id"})).is_none());
    }

    #[test]
    fn test_long_description_truncated() {
        let raw = json!({"asin": "X", "description": ["a".repeat(300)]});
        let description = Product::from_json(&raw).unwrap().description.unwrap();
        assert_eq!(description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_catalog_first_record_wins_and_search() {
        let mut dup = Product::new("A", "Second copy");
        dup.categories.push("Bath".to_string());
        let mut pan = Product::new("B", "Cast Iron Pan");
        pan.categories.push("Cookware".to_string());

        let catalog = Catalog::from_products(vec![Product::new("A", "Kettle"), dup, pan]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("A").unwrap().title, "Kettle");

        let hits: Vec<&str> = catalog
            .search("COOKWARE", 10)
            .into_iter()
            .map(|p| p.product_id.as_str())
            .collect();
        assert_eq!(hits, vec!["B"]);
        assert!(catalog.search("  ", 10).is_empty());
    }

    #[test]
    fn test_from_jsonl_skips_invalid_utf8_lines() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", json!({"parent_asin": "A", "title": "Steel Pan"})).unwrap();
        file.write_all(b"{\"parent_asin\": \"\xff\xfe\"}\n").unwrap();
        file.write_all(b"\r\n").unwrap();
        writeln!(file, "{}", json!({"asin": "B", "title": "Wooden Spoon"})).unwrap();
        file.flush().unwrap();

        let catalog = Catalog::from_jsonl(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("A"));
        assert!(catalog.contains("B"));
    }
}
