use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{Error, Result};

/// Article identifier as handed out by the content service. The service uses
/// integer row ids, but string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleId::Int(id) => write!(f, "{}", id),
            ArticleId::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for ArticleId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(ArticleId::Int)
            .unwrap_or_else(|_| ArticleId::Text(s.to_string())))
    }
}

impl From<i64> for ArticleId {
    fn from(id: i64) -> Self {
        ArticleId::Int(id)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        ArticleId::Text(id.to_string())
    }
}

/// A finite latitude/longitude pair. Partial or non-finite pairs never make it
/// into this type; they decode as an absent location instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        (lat.is_finite() && lon.is_finite()).then_some(Self { lat, lon })
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    /// Accepts `[lat, lon]` and `{"lat": .., "lon"|"lng": ..}`; numbers may be
    /// sent as strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        fn number(v: &Value) -> Option<f64> {
            v.as_f64().or_else(|| v.as_str()?.trim().parse().ok())
        }

        match value {
            Value::Array(items) if items.len() == 2 => Self::new(number(&items[0])?, number(&items[1])?),
            Value::Object(map) => {
                let lat = number(map.get("lat")?)?;
                let lon = number(map.get("lon").or_else(|| map.get("lng"))?)?;
                Self::new(lat, lon)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

impl Serialize for Coordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_pair().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| serde::de::Error::custom("invalid coordinate pair"))
    }
}

fn lenient_coords<'de, D>(deserializer: D) -> std::result::Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Coordinates::from_value))
}

/// Parses the display date strings the service emits. The service normalizes
/// to `YYYY-MM-DD`, older rows may still carry RSS or ISO timestamps.
pub fn parse_display_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// List-view article record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_coords", skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Article {
    pub fn has_location(&self) -> bool {
        self.coords.is_some()
    }

    pub fn published_at(&self) -> Option<NaiveDateTime> {
        parse_display_date(&self.date)
    }
}

/// Body of `GET /news/{id}/full`. The service omits the id and most list
/// fields, so everything but the content is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailPayload {
    #[serde(default)]
    pub id: Option<ArticleId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub coords: Option<Coordinates>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl DetailPayload {
    pub fn into_detail(self, requested: &ArticleId) -> ArticleDetail {
        ArticleDetail {
            id: self.id.unwrap_or_else(|| requested.clone()),
            content: self.content.unwrap_or_default(),
            image: self.image,
            coords: self.coords,
            title: self.title,
            date: self.date,
            source: self.source,
            category: self.category,
        }
    }
}

/// Full article. `content` is untrusted markup and is handed to the
/// presentation layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDetail {
    pub id: ArticleId,
    pub content: String,
    pub image: Option<String>,
    pub coords: Option<Coordinates>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
}

/// What a fetch was scoped to. A category-scoped snapshot is only valid for
/// that category; an unscoped one may be filtered locally by any category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FetchScope {
    #[default]
    All,
    Category(String),
}

impl FetchScope {
    pub fn category(&self) -> Option<&str> {
        match self {
            FetchScope::All => None,
            FetchScope::Category(category) => Some(category),
        }
    }

    pub fn is_unscoped(&self) -> bool {
        matches!(self, FetchScope::All)
    }
}

impl fmt::Display for FetchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchScope::All => f.write_str("all"),
            FetchScope::Category(category) => write!(f, "category={}", category),
        }
    }
}

/// Article list captured by one fetch, in service order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    scope: FetchScope,
    articles: Vec<Article>,
}

impl Snapshot {
    /// Builds a snapshot, keeping the first occurrence of any duplicated id.
    pub fn new(scope: FetchScope, articles: Vec<Article>) -> Self {
        let total = articles.len();
        let mut seen = HashSet::with_capacity(total);
        let articles: Vec<Article> = articles
            .into_iter()
            .filter(|article| seen.insert(article.id.clone()))
            .collect();
        if articles.len() != total {
            tracing::warn!(
                "dropped {} duplicate article ids from {} snapshot",
                total - articles.len(),
                scope
            );
        }
        Self { scope, articles }
    }

    pub fn unscoped(articles: Vec<Article>) -> Self {
        Self::new(FetchScope::All, articles)
    }

    pub fn scope(&self) -> &FetchScope {
        &self.scope
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn find(&self, id: &ArticleId) -> Result<&Article> {
        self.articles
            .iter()
            .find(|article| &article.id == id)
            .ok_or_else(|| Error::NotFoundLocally(id.clone()))
    }
}
