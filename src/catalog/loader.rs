use std::fs;
use std::path::Path;

use crate::catalog::error::CatalogError;
use crate::predict::SatelliteTrack;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TleRecord {
    name: String,
    line1: String,
    line2: String,
}

/// Satellites listed in a three-line TLE file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<TleRecord>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Splits `content` into name/line1/line2 records. A trailing partial
    /// record is ignored.
    pub fn parse(content: &str) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        let records = lines
            .chunks_exact(3)
            .map(|chunk| TleRecord {
                name: chunk[0].trim().to_string(),
                line1: chunk[1].trim().to_string(),
                line2: chunk[2].trim().to_string(),
            })
            .collect();
        Self { records }
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Result<SatelliteTrack, CatalogError> {
        let wanted = name.trim();
        let record = self
            .records
            .iter()
            .find(|r| r.name == wanted)
            .ok_or_else(|| CatalogError::NotFound(wanted.to_string()))?;

        if !record.line1.starts_with("1 ") || !record.line2.starts_with("2 ") {
            return Err(CatalogError::Malformed(record.name.clone()));
        }

        Ok(SatelliteTrack::from_tle(
            &record.name,
            &record.line1,
            &record.line2,
        )?)
    }
}
