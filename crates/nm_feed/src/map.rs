use std::cmp::Ordering;

use nm_core::{Article, ArticleId, Coordinates, Error, Result};

/// Arkhangelsk city centre, used whenever nothing better is known.
pub const DEFAULT_CENTER: Coordinates = Coordinates { lat: 64.5401, lon: 40.5433 };
pub const DEFAULT_ZOOM: u8 = 10;
pub const FOCUS_ZOOM: u8 = 14;

/// Most recent geotagged articles first. Articles with unparseable dates sort
/// after dated ones, ties keep snapshot order.
pub fn latest_geotagged(articles: &[Article], limit: usize) -> Vec<&Article> {
    let mut geotagged: Vec<&Article> = articles.iter().filter(|a| a.has_location()).collect();
    geotagged.sort_by(|a, b| match (a.published_at(), b.published_at()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    geotagged.truncate(limit);
    geotagged
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub id: ArticleId,
    pub title: String,
    pub date: String,
    pub category: String,
    pub coords: Coordinates,
}

/// State behind the map view: a handful of markers and the current camera.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPanel {
    entries: Vec<MapEntry>,
    center: Coordinates,
    zoom: u8,
}

impl MapPanel {
    pub fn from_articles(articles: &[Article], limit: usize) -> Self {
        let entries: Vec<MapEntry> = latest_geotagged(articles, limit)
            .into_iter()
            .filter_map(|article| {
                Some(MapEntry {
                    id: article.id.clone(),
                    title: article.title.clone(),
                    date: article.date.clone(),
                    category: article.category.clone(),
                    coords: article.coords?,
                })
            })
            .collect();
        let center = entries.first().map_or(DEFAULT_CENTER, |entry| entry.coords);
        Self {
            entries,
            center,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Centre the camera on one of the markers.
    pub fn focus(&mut self, id: &ArticleId) -> Result<Coordinates> {
        let entry = self
            .entries
            .iter()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| Error::NotFoundLocally(id.clone()))?;
        self.center = entry.coords;
        self.zoom = FOCUS_ZOOM;
        Ok(self.center)
    }
}
