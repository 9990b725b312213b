use std::fmt;
use std::str::FromStr;

use crate::types::{Article, FetchScope};
use crate::Error;

/// A category the content service assigns. `wire` is the lower-cased value the
/// service stores and filters by, `alias` is the name accepted on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedCategory {
    pub wire: &'static str,
    pub alias: &'static str,
}

impl NamedCategory {
    pub fn matches(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        category == self.wire || category == self.alias
    }
}

pub const NAMED_CATEGORIES: &[NamedCategory] = &[
    NamedCategory { wire: "дтп", alias: "traffic" },
    NamedCategory { wire: "политика", alias: "politics" },
    NamedCategory { wire: "общество", alias: "society" },
    NamedCategory { wire: "экономика", alias: "economy" },
    NamedCategory { wire: "спорт", alias: "sport" },
    NamedCategory { wire: "культура", alias: "culture" },
    NamedCategory { wire: "происшествия", alias: "incidents" },
    NamedCategory { wire: "другое", alias: "other" },
];

/// Active category filter. `All` and `OnMap` are synthetic and never sent to
/// the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    OnMap,
    Named(NamedCategory),
}

impl CategoryFilter {
    /// Every filter in tab order.
    pub fn catalog() -> Vec<CategoryFilter> {
        let mut catalog = vec![CategoryFilter::All, CategoryFilter::OnMap];
        catalog.extend(NAMED_CATEGORIES.iter().copied().map(CategoryFilter::Named));
        catalog
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::OnMap => "map",
            CategoryFilter::Named(named) => named.alias,
        }
    }

    /// Display name as the service spells it.
    pub fn wire_label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "все",
            CategoryFilter::OnMap => "на карте",
            CategoryFilter::Named(named) => named.wire,
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::OnMap => article.has_location(),
            CategoryFilter::Named(named) => named.matches(&article.category),
        }
    }

    /// Fetch scope a snapshot must have to be filtered by this category.
    pub fn scope(&self) -> FetchScope {
        match self {
            CategoryFilter::All | CategoryFilter::OnMap => FetchScope::All,
            CategoryFilter::Named(named) => FetchScope::Category(named.wire.to_string()),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        match needle.as_str() {
            "" | "all" | "все" => Ok(CategoryFilter::All),
            "map" | "on-map" | "на карте" => Ok(CategoryFilter::OnMap),
            _ => NAMED_CATEGORIES
                .iter()
                .find(|named| named.matches(&needle))
                .map(|named| CategoryFilter::Named(*named))
                .ok_or_else(|| Error::UnknownCategory(s.to_string())),
        }
    }
}
