//! Spawn site selection.
//!
//! Candidate sites are drawn uniformly in latitude (within the band the
//! constellation can actually see) and longitude, then screened by a pluggable
//! land/water classifier. A classifier error counts as "not land".

use crate::{EventError, Result};
use orbital_mechanics::transforms::{geodetic_to_cartesian, is_valid_latitude, is_valid_longitude};
use orbital_mechanics::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A fixed point on the planet surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,
    pub position: Vec3,
}

impl Site {
    pub fn on_sphere(latitude: f64, longitude: f64, radius: f64) -> Result<Self> {
        let position = geodetic_to_cartesian(latitude, longitude, radius)?;
        Ok(Self {
            latitude,
            longitude,
            position,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Coordinates outside classifier range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

/// Decides whether a site is on land.
pub trait LandClassifier {
    fn is_on_land(&self, lat: f64, lon: f64) -> std::result::Result<bool, ClassifierError>;
}

impl<F> LandClassifier for F
where
    F: Fn(f64, f64) -> bool,
{
    fn is_on_land(&self, lat: f64, lon: f64) -> std::result::Result<bool, ClassifierError> {
        Ok(self(lat, lon))
    }
}

/// Accepts every site.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyTerrain;

impl LandClassifier for AnyTerrain {
    fn is_on_land(&self, _lat: f64, _lon: f64) -> std::result::Result<bool, ClassifierError> {
        Ok(true)
    }
}

/// Equirectangular land raster. Row 0 is the north pole edge, column 0 is -180°.
#[derive(Debug, Clone)]
pub struct LandMask {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl LandMask {
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(EventError::InvalidMask("mask must have at least one cell".into()));
        }
        if cells.len() != rows * cols {
            return Err(EventError::InvalidMask(format!(
                "expected {} cells for {}x{}, got {}",
                rows * cols,
                rows,
                cols,
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Parse an ASCII raster: `#` marks land, `.` water, one line per row.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let cols = lines.first().map(|l| l.chars().count()).unwrap_or(0);

        let mut cells = Vec::with_capacity(lines.len() * cols);
        for (row, line) in lines.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(EventError::InvalidMask(format!(
                    "row {} has {} columns, expected {}",
                    row,
                    line.chars().count(),
                    cols
                )));
            }
            for c in line.chars() {
                match c {
                    '#' => cells.push(true),
                    '.' => cells.push(false),
                    other => {
                        return Err(EventError::InvalidMask(format!(
                            "unexpected character {:?} in row {}",
                            other, row
                        )))
                    }
                }
            }
        }

        Self::new(lines.len(), cols, cells)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ascii(&text)
    }

    pub fn land_fraction(&self) -> f64 {
        self.cells.iter().filter(|c| **c).count() as f64 / self.cells.len() as f64
    }
}

impl LandClassifier for LandMask {
    fn is_on_land(&self, lat: f64, lon: f64) -> std::result::Result<bool, ClassifierError> {
        if !is_valid_latitude(lat) || !is_valid_longitude(lon) {
            return Err(ClassifierError::OutOfRange { lat, lon });
        }
        let row = (((90.0 - lat) / 180.0) * self.rows as f64).floor() as usize;
        let col = (((lon + 180.0) / 360.0) * self.cols as f64).floor() as usize;
        let row = row.min(self.rows - 1);
        let col = col.min(self.cols - 1);
        Ok(self.cells[row * self.cols + col])
    }
}

/// Latitude range where events may spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatitudeBand {
    pub min_lat: f64,
    pub max_lat: f64,
}

impl LatitudeBand {
    pub fn new(min_lat: f64, max_lat: f64) -> Result<Self> {
        if !is_valid_latitude(min_lat) || !is_valid_latitude(max_lat) || min_lat > max_lat {
            return Err(EventError::InvalidPolicy(format!(
                "invalid latitude band [{}, {}]",
                min_lat, max_lat
            )));
        }
        Ok(Self { min_lat, max_lat })
    }

    /// Symmetric band reaching the constellation's coverage latitude.
    pub fn from_coverage(coverage_deg: f64) -> Self {
        let edge = coverage_deg.abs().min(90.0);
        Self {
            min_lat: -edge,
            max_lat: edge,
        }
    }

    pub fn global() -> Self {
        Self::from_coverage(90.0)
    }

    pub fn contains(&self, lat: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteSelector {
    pub band: LatitudeBand,
    /// Radius of the sphere events sit on.
    pub surface_radius: f64,
    pub max_attempts: u32,
}

impl SiteSelector {
    pub fn new(band: LatitudeBand, surface_radius: f64, max_attempts: u32) -> Self {
        Self {
            band,
            surface_radius,
            max_attempts,
        }
    }

    /// Draw up to `max_attempts` candidates; `None` when none is accepted.
    pub fn select<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        classifier: &dyn LandClassifier,
    ) -> Option<Site> {
        for attempt in 1..=self.max_attempts {
            let lat = rng.gen_range(self.band.min_lat..=self.band.max_lat);
            let lon = rng.gen_range(-180.0..180.0);

            match classifier.is_on_land(lat, lon) {
                Ok(true) => match Site::on_sphere(lat, lon, self.surface_radius) {
                    Ok(site) => return Some(site),
                    Err(e) => debug!("Attempt {}: {}", attempt, e),
                },
                Ok(false) => {}
                Err(e) => debug!("Attempt {}: classifier failed, treating as water: {}", attempt, e),
            }
        }

        debug!("No land site found after {} attempts", self.max_attempts);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzz_harness::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HALF_LAND: &str = "
        ####....
        ####....
    ";

    #[test]
    fn test_mask_lookup() {
        let mask = LandMask::from_ascii(HALF_LAND).unwrap();
        assert_eq!(mask.land_fraction(), 0.5);
        assert_eq!(mask.is_on_land(45.0, -90.0), Ok(true));
        assert_eq!(mask.is_on_land(-45.0, 90.0), Ok(false));
        assert_eq!(mask.is_on_land(90.0, 180.0), Ok(false));
        assert_eq!(mask.is_on_land(-90.0, -180.0), Ok(true));
        assert!(matches!(
            mask.is_on_land(120.0, 0.0),
            Err(ClassifierError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_mask_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HALF_LAND.as_bytes()).unwrap();

        let mask = LandMask::load(file.path()).unwrap();
        assert_eq!(mask.land_fraction(), 0.5);
        assert_eq!(mask.is_on_land(10.0, -170.0), Ok(true));
        assert_eq!(mask.is_on_land(10.0, 170.0), Ok(false));
    }

    #[test]
    fn test_mask_load_errors() {
        assert!(matches!(
            LandMask::load("/nonexistent/land.txt"),
            Err(EventError::Io(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"##\n#?\n").unwrap();
        assert!(matches!(LandMask::load(file.path()), Err(EventError::InvalidMask(_))));
    }

    #[test]
    fn test_mask_rejects_ragged_rows() {
        assert!(LandMask::from_ascii("##\n#").is_err());
        assert!(LandMask::from_ascii("#x").is_err());
        assert!(LandMask::from_ascii("").is_err());
    }

    #[test]
    fn test_selector_honours_classifier() {
        let mask = LandMask::from_ascii(HALF_LAND).unwrap();
        let selector = SiteSelector::new(LatitudeBand::global(), 10.1, 64);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let site = selector.select(&mut rng, &mask).unwrap();
            assert!(site.longitude < 0.0);
            assert!((site.position.norm() - 10.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_selector_gives_up_after_bounded_attempts() {
        let calls = Cell::new(0u32);
        let water = |_lat: f64, _lon: f64| {
            calls.set(calls.get() + 1);
            false
        };
        let selector = SiteSelector::new(LatitudeBand::global(), 10.1, 5);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(selector.select(&mut rng, &water).is_none());
        assert_eq!(calls.get(), 5);
    }

    struct Offline;

    impl LandClassifier for Offline {
        fn is_on_land(&self, _lat: f64, _lon: f64) -> std::result::Result<bool, ClassifierError> {
            Err(ClassifierError::Unavailable("tile server down".into()))
        }
    }

    #[test]
    fn test_classifier_failure_counts_as_water() {
        let selector = SiteSelector::new(LatitudeBand::global(), 10.1, 3);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(selector.select(&mut rng, &Offline).is_none());
    }

    #[test]
    fn test_band_validation() {
        assert!(LatitudeBand::new(10.0, -10.0).is_err());
        assert!(LatitudeBand::new(-95.0, 0.0).is_err());
        assert_eq!(LatitudeBand::from_coverage(120.0), LatitudeBand::global());
    }

    proptest! {
        #[test]
        fn prop_sites_stay_in_band(s in seed(), edge in 0.0f64..90.0) {
            let selector = SiteSelector::new(LatitudeBand::from_coverage(edge), 6371.0, 1);
            let mut rng = StdRng::seed_from_u64(s);
            let site = selector.select(&mut rng, &AnyTerrain).unwrap();
            prop_assert!(site.latitude.abs() <= edge);
            prop_assert!((-180.0..180.0).contains(&site.longitude));
        }
    }
}
