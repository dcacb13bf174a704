use geo::MultiPolygon;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One row of the education dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EducationRecord {
    pub fips: i64,
    pub state: String,
    pub area_name: String,
    #[serde(rename = "bachelorsOrHigher")]
    pub bachelors_or_higher: f64,
}

/// A feature `id` as written in the topology. Kept verbatim: only numeric ids
/// can ever equal a FIPS code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

// Largest integer an f64 holds exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        // `1001.0` is the same number as `1001`; other fractions can never be a
        // FIPS code and keep their printed form.
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Integer(n) => FeatureId::Number(n),
            RawId::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => {
                FeatureId::Number(f as i64)
            }
            RawId::Float(f) => FeatureId::Text(f.to_string()),
            RawId::Text(s) => FeatureId::Text(s),
        })
    }
}

impl FeatureId {
    pub fn as_fips(&self) -> Option<i64> {
        match self {
            FeatureId::Number(n) => Some(*n),
            FeatureId::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

/// A county feature expanded from the topology, in plane coordinates.
#[derive(Debug, Clone)]
pub struct County {
    pub id: Option<FeatureId>,
    pub geometry: MultiPolygon<f64>,
}
