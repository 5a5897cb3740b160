//! Business lookup: business_id to city and name

use super::table::{ChunkReader, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// City and name of one business
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessInfo {
    pub city: String,
    pub name: Option<String>,
}

/// In-memory lookup of businesses that have a city
#[derive(Debug, Clone, Default)]
pub struct BusinessLookup {
    entries: HashMap<String, BusinessInfo>,
    has_names: bool,
}

impl BusinessLookup {
    /// Load the business table from a CSV file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading business data for city lookup from {}", path.display());
        let lookup = Self::from_chunks(ChunkReader::open(path, DEFAULT_CHUNK_SIZE)?)?;
        info!("Loaded {} businesses with city info", lookup.len());
        Ok(lookup)
    }

    /// Build the lookup from chunked business rows
    ///
    /// Requires `business_id` and `city` columns. Rows without a city are
    /// dropped; when an id repeats, its first row wins.
    pub fn from_chunks<R: Read>(reader: ChunkReader<R>) -> Result<Self> {
        let columns = reader.columns();
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| Error::config(format!("Business table has no '{name}' column")))
        };
        let id_idx = find("business_id")?;
        let city_idx = find("city")?;
        let name_idx = columns.iter().position(|c| c == "name");

        let mut lookup = Self {
            entries: HashMap::new(),
            has_names: name_idx.is_some(),
        };
        let mut skipped = 0usize;

        for chunk in reader {
            for row in chunk?.rows() {
                let (Some(id), Some(city)) = (&row[id_idx], &row[city_idx]) else {
                    skipped += 1;
                    continue;
                };
                let name = name_idx.and_then(|i| row[i].clone());
                lookup.entries.entry(id.clone()).or_insert(BusinessInfo {
                    city: city.clone(),
                    name,
                });
            }
        }

        debug!("Skipped {} business rows without id or city", skipped);
        Ok(lookup)
    }

    /// Build a lookup directly from entries
    pub fn from_entries<I>(entries: I, has_names: bool) -> Self
    where
        I: IntoIterator<Item = (String, BusinessInfo)>,
    {
        let mut map = HashMap::new();
        for (id, info) in entries {
            map.entry(id).or_insert(info);
        }
        Self {
            entries: map,
            has_names,
        }
    }

    pub fn get(&self, business_id: &str) -> Option<&BusinessInfo> {
        self.entries.get(business_id)
    }

    /// City of a business, if known
    pub fn city_of(&self, business_id: &str) -> Option<&str> {
        self.get(business_id).map(|info| info.city.as_str())
    }

    /// Whether the business table carried a `name` column
    pub fn has_names(&self) -> bool {
        self.has_names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
