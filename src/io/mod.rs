use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Position;
use crate::graph::RelayNode;
use crate::routing::GroundPoint;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid number `{value}`")]
    InvalidNumber { line: u64, value: String },
    #[error("no ROUTE record")]
    MissingRoute,
    #[error("line {line}: more than one ROUTE record")]
    DuplicateRoute { line: u64 },
    #[error("{name}: latitude {value} outside [-90, 90]")]
    LatitudeOutOfRange { name: String, value: f64 },
    #[error("{name}: longitude {value} outside [-180, 180]")]
    LongitudeOutOfRange { name: String, value: f64 },
    #[error("{name}: invalid altitude {value}")]
    InvalidAltitude { name: String, value: f64 },
    #[error("duplicate relay name {0}")]
    DuplicateRelay(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    pub name: String,
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees
    pub altitude: f64,  // km above surface
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundRecord {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub transmitter: GroundRecord,
    pub receiver: GroundRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub seed: Option<String>,
    pub relays: Vec<RelayRecord>,
    pub route: RouteRecord,
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut names = HashSet::new();
        for relay in &self.relays {
            check_coordinates(&relay.name, relay.latitude, relay.longitude)?;
            if !relay.altitude.is_finite() || relay.altitude < 0.0 {
                return Err(ScenarioError::InvalidAltitude {
                    name: relay.name.clone(),
                    value: relay.altitude,
                });
            }
            if !names.insert(relay.name.as_str()) {
                return Err(ScenarioError::DuplicateRelay(relay.name.clone()));
            }
        }

        let route = &self.route;
        check_coordinates("transmitter", route.transmitter.latitude, route.transmitter.longitude)?;
        check_coordinates("receiver", route.receiver.latitude, route.receiver.longitude)?;
        Ok(())
    }

    pub fn relay_nodes(&self) -> Vec<RelayNode> {
        self.relays
            .iter()
            .map(|r| {
                RelayNode::new(
                    r.name.clone(),
                    Position::from_degrees(r.latitude, r.longitude, r.altitude),
                )
            })
            .collect()
    }

    /// Transmitter and receiver, in that order.
    pub fn endpoints(&self) -> (GroundPoint, GroundPoint) {
        let RouteRecord { transmitter, receiver } = self.route;
        (
            GroundPoint::new(transmitter.latitude, transmitter.longitude),
            GroundPoint::new(receiver.latitude, receiver.longitude),
        )
    }
}

fn check_coordinates(name: &str, latitude: f64, longitude: f64) -> Result<(), ScenarioError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ScenarioError::LatitudeOutOfRange {
            name: name.to_string(),
            value: latitude,
        });
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ScenarioError::LongitudeOutOfRange {
            name: name.to_string(),
            value: longitude,
        });
    }
    Ok(())
}

/// Reads the challenge CSV layout:
///
/// ```text
/// #SEED: 0.1234
/// SAT0,-9.37,-103.25,366.21
/// ROUTE,-45.60,-110.53,10.81,-17.45
/// ```
///
/// Rows whose first field is neither `SAT*` nor `ROUTE` are taken as the seed
/// row; only that first field is kept.
pub fn parse_scenario_csv<R: std::io::Read>(reader: R) -> Result<Scenario, ScenarioError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seed = None;
    let mut relays = Vec::new();
    let mut route = None;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let kind = record.get(0).unwrap_or_default();

        if kind.starts_with("SAT") {
            let values = numeric_fields(&record, line, 4)?;
            relays.push(RelayRecord {
                name: kind.to_string(),
                latitude: values[0],
                longitude: values[1],
                altitude: values[2],
            });
        } else if kind == "ROUTE" {
            if route.is_some() {
                return Err(ScenarioError::DuplicateRoute { line });
            }
            let values = numeric_fields(&record, line, 5)?;
            route = Some(RouteRecord {
                transmitter: GroundRecord { latitude: values[0], longitude: values[1] },
                receiver: GroundRecord { latitude: values[2], longitude: values[3] },
            });
        } else {
            debug!("seed row: {}", kind);
            seed = Some(kind.to_string());
        }
    }

    Ok(Scenario {
        seed,
        relays,
        route: route.ok_or(ScenarioError::MissingRoute)?,
    })
}

/// Parses fields 1.. of `record` as numbers, checking the total field count.
fn numeric_fields(
    record: &csv::StringRecord,
    line: u64,
    expected: usize,
) -> Result<Vec<f64>, ScenarioError> {
    if record.len() != expected {
        return Err(ScenarioError::FieldCount {
            line,
            expected,
            found: record.len(),
        });
    }
    record
        .iter()
        .skip(1)
        .map(|field| {
            field.parse::<f64>().map_err(|_| ScenarioError::InvalidNumber {
                line,
                value: field.to_string(),
            })
        })
        .collect()
}

pub fn load_scenario_from_csv(path: &Path) -> Result<Scenario, ScenarioError> {
    let file = std::fs::File::open(path)?;
    parse_scenario_csv(std::io::BufReader::new(file))
}

pub fn load_scenario_from_json(path: &Path) -> Result<Scenario, ScenarioError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let scenario: Scenario = serde_json::from_reader(reader)?;
    Ok(scenario)
}

/// Loads and validates a scenario, picking the format from the file extension
/// (`.json`, anything else is read as challenge CSV).
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let scenario = if is_json {
        load_scenario_from_json(path)?
    } else {
        load_scenario_from_csv(path)?
    };
    scenario.validate()?;

    info!("loaded {} relays from {:?}", scenario.relays.len(), path);
    Ok(scenario)
}
