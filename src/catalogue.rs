//! Catalogue filtering and sorting.
//!
//! [`filter_and_sort`] is a pure derivation: it never clones or invents
//! products, only selects and orders references into the input slice.
//! [`Catalogue`] wraps it with the browsing state of one page.

use crate::models::Product;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ALL: &str = "all";

/// Known categories as `(value, label)`.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("development-tools", "Development Tools"),
    ("productivity", "Productivity"),
    ("design", "Design"),
    ("utilities", "Utilities"),
    ("business", "Business"),
    ("education", "Education"),
    ("entertainment", "Entertainment"),
    ("security", "Security"),
];

/// Platform releases a listing can target, newest first.
pub const COMPATIBILITY_VERSIONS: &[&str] = &["0.6.0", "0.5.4", "0.5.3"];

pub fn category_label(value: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}; expected one of: {expected}")]
pub struct UnknownOption {
    kind: &'static str,
    value: String,
    expected: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PriceBracket {
    #[default]
    All,
    Free,
    Under25,
    From25To50,
    From50To100,
    Over100,
}

impl PriceBracket {
    pub const VALUES: &'static [&'static str] =
        &["all", "free", "under-25", "25-50", "50-100", "over-100"];

    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceBracket::All => true,
            PriceBracket::Free => price == 0.0,
            PriceBracket::Under25 => price > 0.0 && price < 25.0,
            PriceBracket::From25To50 => (25.0..=50.0).contains(&price),
            PriceBracket::From50To100 => price > 50.0 && price <= 100.0,
            PriceBracket::Over100 => price > 100.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceBracket::All => "all",
            PriceBracket::Free => "free",
            PriceBracket::Under25 => "under-25",
            PriceBracket::From25To50 => "25-50",
            PriceBracket::From50To100 => "50-100",
            PriceBracket::Over100 => "over-100",
        }
    }
}

impl FromStr for PriceBracket {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "all" => PriceBracket::All,
            "free" => PriceBracket::Free,
            "under-25" => PriceBracket::Under25,
            "25-50" => PriceBracket::From25To50,
            "50-100" => PriceBracket::From50To100,
            "over-100" => PriceBracket::Over100,
            other => {
                return Err(UnknownOption {
                    kind: "price range",
                    value: other.to_string(),
                    expected: Self::VALUES.join(", "),
                })
            }
        })
    }
}

impl fmt::Display for PriceBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Featured,
    Popular,
    Newest,
    PriceLow,
    PriceHigh,
    TopRated,
}

impl SortKey {
    pub const VALUES: &'static [&'static str] = &[
        "featured",
        "popular",
        "newest",
        "price-low",
        "price-high",
        "top-rated",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Featured => "featured",
            SortKey::Popular => "popular",
            SortKey::Newest => "newest",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::TopRated => "top-rated",
        }
    }

    /// Ordering of `a` relative to `b` under this key. `Equal` keeps input order.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            // true before false
            SortKey::Featured => b.featured.cmp(&a.featured),
            SortKey::Popular => b.download_count.total_cmp(&a.download_count),
            // missing timestamps rank oldest
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::PriceLow => a.price.total_cmp(&b.price),
            SortKey::PriceHigh => b.price.total_cmp(&a.price),
            SortKey::TopRated => b.rating.total_cmp(&a.rating),
        }
    }
}

impl FromStr for SortKey {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "featured" => SortKey::Featured,
            "popular" => SortKey::Popular,
            "newest" => SortKey::Newest,
            "price-low" => SortKey::PriceLow,
            "price-high" => SortKey::PriceHigh,
            "top-rated" => SortKey::TopRated,
            other => {
                return Err(UnknownOption {
                    kind: "sort option",
                    value: other.to_string(),
                    expected: Self::VALUES.join(", "),
                })
            }
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the catalogue page filters and sorts by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Criteria {
    pub query: String,
    /// Exact category value, or `"all"`.
    pub category: String,
    pub price: PriceBracket,
    pub tags: BTreeSet<String>,
    pub sort: SortKey,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL.to_string(),
            price: PriceBracket::All,
            tags: BTreeSet::new(),
            sort: SortKey::Featured,
        }
    }
}

impl Criteria {
    /// Whether `product` passes every active predicate.
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_query(product)
            && (self.category == ALL || product.category == self.category)
            && self.price.contains(product.price)
            && (self.tags.is_empty() || product.tags.iter().any(|t| self.tags.contains(t)))
    }

    fn matches_query(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        product.title.to_lowercase().contains(&query)
            || product.description.to_lowercase().contains(&query)
            || product
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }
}

/// Select and order the products matching `criteria`.
pub fn filter_and_sort<'a>(products: &'a [Product], criteria: &Criteria) -> Vec<&'a Product> {
    ordered_indices(products, criteria)
        .into_iter()
        .map(|i| &products[i])
        .collect()
}

fn ordered_indices(products: &[Product], criteria: &Criteria) -> Vec<usize> {
    let mut indices: Vec<usize> = products
        .iter()
        .enumerate()
        .filter(|(_, p)| criteria.matches(p))
        .map(|(i, _)| i)
        .collect();
    // sort_by is stable: ties keep their relative order
    indices.sort_by(|&a, &b| criteria.sort.compare(&products[a], &products[b]));
    indices
}

/// Loaded products plus the current criteria of one catalogue page.
///
/// The derived ordering is cached as indices into `products` and recomputed
/// only when the criteria change or the product list is replaced.
#[derive(Debug, Default)]
pub struct Catalogue {
    products: Vec<Product>,
    criteria: Criteria,
    cached: Option<(Criteria, Vec<usize>)>,
}

impl Catalogue {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn replace_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.cached = None;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }

    pub fn set_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.criteria.tags.remove(tag) {
            self.criteria.tags.insert(tag.to_string());
        }
    }

    pub fn clear_filters(&mut self) {
        self.criteria = Criteria::default();
    }

    /// Every distinct tag across the loaded products, sorted.
    pub fn all_tags(&self) -> Vec<&str> {
        let tags: BTreeSet<&str> = self
            .products
            .iter()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        tags.into_iter().collect()
    }

    /// The products to display under the current criteria.
    pub fn visible(&mut self) -> Vec<&Product> {
        let stale = !matches!(&self.cached, Some((criteria, _)) if *criteria == self.criteria);
        if stale {
            let indices = ordered_indices(&self.products, &self.criteria);
            self.cached = Some((self.criteria.clone(), indices));
        }

        match &self.cached {
            Some((_, indices)) => indices.iter().map(|&i| &self.products[i]).collect(),
            None => Vec::new(),
        }
    }
}
