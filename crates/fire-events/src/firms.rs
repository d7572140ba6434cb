//! Fire-record feed ingestion.
//!
//! Records arrive already parsed (the wildfire proxy converts the satellite
//! detection CSV to JSON). Only coordinates are mandatory; everything else is
//! carried through as event metadata.

use crate::{FireAttributes, Result};
use chrono::NaiveDate;
use orbital_mechanics::transforms::{is_valid_latitude, is_valid_longitude};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Smallest and largest map marker radius, in pixels.
pub const MIN_MARKER_RADIUS: f64 = 0.375;
pub const MAX_MARKER_RADIUS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Confidence {
    Low,
    Nominal,
    High,
}

impl Confidence {
    /// Accepts the letter codes (`l`/`n`/`h`, any case), their long forms,
    /// or a 0-100 percentage.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Confidence::Low),
            "n" | "nominal" => Some(Confidence::Nominal),
            "h" | "high" => Some(Confidence::High),
            other => other.parse::<f64>().ok().and_then(Self::from_percent),
        }
    }

    pub fn from_percent(pct: f64) -> Option<Self> {
        match pct {
            p if !(0.0..=100.0).contains(&p) => None,
            p if p < 30.0 => Some(Confidence::Low),
            p if p < 80.0 => Some(Confidence::Nominal),
            _ => Some(Confidence::High),
        }
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> std::result::Result<Option<Confidence>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(t)) => Confidence::parse(&t),
        Some(Value::Number(n)) => n.as_f64().and_then(Confidence::from_percent),
        _ => None,
    })
}

/// Metadata field that degrades to `None` when it has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_confidence(deserializer)?
            .ok_or_else(|| serde::de::Error::custom("unrecognised confidence value"))
    }
}

/// One detection from the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Brightness temperature, Kelvin.
    pub bright_ti4: Option<f64>,
    /// Fire radiative power, MW.
    pub frp: Option<f64>,
    pub confidence: Option<Confidence>,
    pub daynight: Option<String>,
    pub acq_date: Option<NaiveDate>,
}

/// Feed record as it appears on the wire.
#[derive(Debug, Deserialize)]
struct RawFireRecord {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    bright_ti4: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    frp: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_confidence")]
    confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "lenient")]
    daynight: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    acq_date: Option<NaiveDate>,
}

impl FireRecord {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            bright_ti4: None,
            frp: None,
            confidence: None,
            daynight: None,
            acq_date: None,
        }
    }

    pub fn attributes(&self) -> FireAttributes {
        FireAttributes {
            brightness_k: self.bright_ti4,
            frp_mw: self.frp,
            confidence: self.confidence,
            daynight: self.daynight.clone(),
            acq_date: self.acq_date,
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self.confidence, Some(Confidence::Nominal | Confidence::High))
    }

    pub fn marker_radius(&self) -> f64 {
        marker_radius(self.frp.unwrap_or(0.0))
    }
}

/// Map marker radius scaled by radiative power.
pub fn marker_radius(frp_mw: f64) -> f64 {
    (frp_mw / 8.0).clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS)
}

/// Keep nominal and high confidence records; drop low or unknown.
pub fn filter_confident(records: Vec<FireRecord>) -> Vec<FireRecord> {
    records.into_iter().filter(FireRecord::is_confident).collect()
}

/// Parse a JSON array of records. Entries without valid coordinates are
/// skipped; malformed metadata fields are dropped from otherwise valid entries.
pub fn parse_records(reader: impl Read) -> Result<Vec<FireRecord>> {
    let raw: Vec<Value> = serde_json::from_reader(reader)?;
    let total = raw.len();

    let records: Vec<FireRecord> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawFireRecord>(v).ok())
        .filter_map(|r| match (r.latitude, r.longitude) {
            (Some(lat), Some(lon)) if is_valid_latitude(lat) && is_valid_longitude(lon) => {
                Some(FireRecord {
                    latitude: lat,
                    longitude: lon,
                    bright_ti4: r.bright_ti4,
                    frp: r.frp,
                    confidence: r.confidence,
                    daynight: r.daynight,
                    acq_date: r.acq_date,
                })
            }
            _ => None,
        })
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        warn!("Skipped {} malformed fire records or records with invalid coordinates", skipped);
    }

    Ok(records)
}

pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<FireRecord>> {
    let path = path.as_ref();
    info!("Loading fire records from {:?}", path);

    let file = File::open(path)?;
    let records = parse_records(BufReader::new(file))?;

    info!("Loaded {} fire records", records.len());
    Ok(records)
}
