//! Location grouping via bounded reverse geocoding
//!
//! Groups records that carry GPS coordinates into coarse geographic
//! cells and resolves one place name per cell through an abstract
//! [`Geocoder`]. Platform geocoders are rate and resource sensitive, so
//! lookups run under a semaphore with a small fixed width and resolved
//! names are cached per cell. A failed lookup degrades the cell to a
//! formatted coordinate label instead of failing the whole pass.

use crate::error::Result;
use crate::record::MediaRecord;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Maximum reverse-geocode lookups in flight at once
const MAX_CONCURRENT_LOOKUPS: usize = 2;

/// Cell edge in degrees; about a kilometre at mid latitudes
const CELL_SIZE_DEG: f64 = 0.01;

/// Reverse-geocoding backend
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Human-readable place name for a coordinate pair
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String>;
}

/// One location group of a "places" view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub count: usize,
    /// First record seen for the place, following input order
    pub thumbnail: Option<MediaRecord>,
}

/// Quantized coordinate cell used as grouping and cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Cell {
    lat: i32,
    lon: i32,
}

impl Cell {
    fn of(latitude: f64, longitude: f64) -> Self {
        Cell {
            lat: (latitude / CELL_SIZE_DEG).floor() as i32,
            lon: (longitude / CELL_SIZE_DEG).floor() as i32,
        }
    }

    /// Center of the cell, used for lookups and fallback labels
    fn center(&self) -> (f64, f64) {
        (
            (self.lat as f64 + 0.5) * CELL_SIZE_DEG,
            (self.lon as f64 + 0.5) * CELL_SIZE_DEG,
        )
    }

    fn fallback_label(&self) -> String {
        let (lat, lon) = self.center();
        format!("{lat:.2}, {lon:.2}")
    }
}

/// Groups records by location with cached, bounded name resolution
pub struct PlaceResolver {
    geocoder: Arc<dyn Geocoder>,
    limiter: Arc<Semaphore>,
    cache: Mutex<HashMap<Cell, String>>,
}

impl PlaceResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        PlaceResolver {
            geocoder,
            limiter: Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Group records carrying coordinates into named places
    ///
    /// Records without coordinates are ignored. Place order follows first
    /// occurrence in the input; cells resolving to the same name merge.
    pub async fn place_groups(&self, records: &[MediaRecord]) -> Vec<Place> {
        let mut cell_order: Vec<Cell> = Vec::new();
        let mut by_cell: HashMap<Cell, Vec<&MediaRecord>> = HashMap::new();
        for record in records {
            if let Some((lat, lon)) = record.coordinates() {
                let cell = Cell::of(lat, lon);
                let members = by_cell.entry(cell).or_default();
                if members.is_empty() {
                    cell_order.push(cell);
                }
                members.push(record);
            }
        }

        let names = self.resolve_names(&cell_order).await;

        let mut places: Vec<Place> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for cell in &cell_order {
            let members = &by_cell[cell];
            let name = names[cell].clone();
            match by_name.get(&name) {
                Some(&slot) => places[slot].count += members.len(),
                None => {
                    by_name.insert(name.clone(), places.len());
                    places.push(Place {
                        name,
                        count: members.len(),
                        thumbnail: members.first().map(|r| (*r).clone()),
                    });
                }
            }
        }
        places
    }

    /// Resolve every uncached cell, at most [`MAX_CONCURRENT_LOOKUPS`] in
    /// flight
    async fn resolve_names(&self, cells: &[Cell]) -> HashMap<Cell, String> {
        let mut resolved: HashMap<Cell, String> = HashMap::new();
        let mut pending: Vec<Cell> = Vec::new();
        {
            let cache = self.cache.lock().expect("geocode cache poisoned");
            for cell in cells {
                match cache.get(cell) {
                    Some(name) => {
                        resolved.insert(*cell, name.clone());
                    }
                    None => pending.push(*cell),
                }
            }
        }

        let lookups = pending.iter().map(|cell| {
            let geocoder = Arc::clone(&self.geocoder);
            let limiter = Arc::clone(&self.limiter);
            let cell = *cell;
            async move {
                let _permit = limiter.acquire().await.expect("geocode limiter closed");
                let (lat, lon) = cell.center();
                match geocoder.reverse(lat, lon).await {
                    Ok(name) => (cell, name, true),
                    Err(e) => {
                        warn!(lat, lon, error = %e, "Reverse geocode failed, using coordinate label");
                        (cell, cell.fallback_label(), false)
                    }
                }
            }
        });

        let results = join_all(lookups).await;
        let mut cache = self.cache.lock().expect("geocode cache poisoned");
        for (cell, name, cacheable) in results {
            // Failures are not cached so a later pass can retry them.
            if cacheable {
                cache.insert(cell, name.clone());
            }
            resolved.insert(cell, name);
        }
        debug!(resolved = resolved.len(), "Resolved place names");
        resolved
    }
}
