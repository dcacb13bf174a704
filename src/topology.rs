//! TopoJSON decoding: expands shared, optionally quantized arcs into
//! standalone polygon features.

use crate::types::{County, FeatureId};
use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: BTreeMap<String, TopoObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// A geometry object. A null or missing `type` is a feature without
/// geometry, which still counts as a feature.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawObject")]
pub struct TopoObject {
    pub id: Option<FeatureId>,
    pub geometry: TopoGeometry,
}

#[derive(Debug, Clone)]
pub enum TopoGeometry {
    GeometryCollection { geometries: Vec<TopoObject> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    /// Points, lines and null geometries enclose no area.
    Other,
}

#[derive(Deserialize)]
struct RawObject {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<FeatureId>,
    #[serde(default)]
    arcs: serde_json::Value,
    #[serde(default)]
    geometries: Vec<TopoObject>,
}

impl TryFrom<RawObject> for TopoObject {
    type Error = serde_json::Error;

    fn try_from(raw: RawObject) -> Result<Self, Self::Error> {
        let geometry = match raw.kind.as_deref() {
            Some("GeometryCollection") => TopoGeometry::GeometryCollection {
                geometries: raw.geometries,
            },
            Some("Polygon") => TopoGeometry::Polygon {
                arcs: serde_json::from_value(raw.arcs)?,
            },
            Some("MultiPolygon") => TopoGeometry::MultiPolygon {
                arcs: serde_json::from_value(raw.arcs)?,
            },
            _ => TopoGeometry::Other,
        };
        Ok(TopoObject { id: raw.id, geometry })
    }
}

impl Topology {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let topology: Topology = serde_json::from_slice(bytes)
            .context("Failed to parse TopoJSON topology")?;
        if topology.kind != "Topology" {
            bail!("Expected a TopoJSON 'Topology', found '{}'", topology.kind);
        }
        Ok(topology)
    }

    /// Expands the named object into one county per geometry. A
    /// `GeometryCollection` yields one county per child, anything else yields
    /// exactly one.
    pub fn features(&self, object_name: &str) -> Result<Vec<County>> {
        let object = self.objects.get(object_name).ok_or_else(|| {
            let available: Vec<&str> = self.objects.keys().map(String::as_str).collect();
            anyhow!(
                "Topology has no object '{}' (available: {})",
                object_name,
                available.join(", ")
            )
        })?;

        let arcs = self.decode_arcs();
        let decoder = ArcDecoder { arcs: &arcs };

        match &object.geometry {
            TopoGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .map(|child| decoder.county(child))
                .collect(),
            _ => Ok(vec![decoder.county(object)?]),
        }
    }

    fn decode_arcs(&self) -> Vec<Vec<Coord<f64>>> {
        self.arcs.iter().map(|arc| self.decode_arc(arc)).collect()
    }

    // Quantized arcs are delta-encoded per arc.
    fn decode_arc(&self, arc: &[Vec<f64>]) -> Vec<Coord<f64>> {
        match self.transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|position| {
                        x += position.first().copied().unwrap_or(0.0);
                        y += position.get(1).copied().unwrap_or(0.0);
                        Coord {
                            x: x * t.scale[0] + t.translate[0],
                            y: y * t.scale[1] + t.translate[1],
                        }
                    })
                    .collect()
            }
            None => arc.iter().map(|position| to_coord(position)).collect(),
        }
    }
}

fn to_coord(position: &[f64]) -> Coord<f64> {
    Coord {
        x: position.first().copied().unwrap_or(0.0),
        y: position.get(1).copied().unwrap_or(0.0),
    }
}

struct ArcDecoder<'a> {
    arcs: &'a [Vec<Coord<f64>>],
}

impl ArcDecoder<'_> {
    fn county(&self, object: &TopoObject) -> Result<County> {
        let mut polygons = Vec::new();
        self.collect_polygons(&object.geometry, &mut polygons)?;
        Ok(County {
            id: object.id.clone(),
            geometry: MultiPolygon::new(polygons),
        })
    }

    fn collect_polygons(&self, geometry: &TopoGeometry, out: &mut Vec<Polygon<f64>>) -> Result<()> {
        match geometry {
            TopoGeometry::Polygon { arcs } => {
                if let Some(polygon) = self.polygon(arcs)? {
                    out.push(polygon);
                }
            }
            TopoGeometry::MultiPolygon { arcs } => {
                for rings in arcs {
                    if let Some(polygon) = self.polygon(rings)? {
                        out.push(polygon);
                    }
                }
            }
            TopoGeometry::GeometryCollection { geometries } => {
                for child in geometries {
                    self.collect_polygons(&child.geometry, out)?;
                }
            }
            TopoGeometry::Other => {
                debug!("non-polygonal geometry has no fill area");
            }
        }
        Ok(())
    }

    fn arc(&self, index: i64) -> Result<&[Coord<f64>]> {
        let resolved = if index < 0 { !index } else { index };
        usize::try_from(resolved)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("Arc index {} out of range ({} arcs)", index, self.arcs.len()))
    }

    /// Stitches arcs end to end; neighbouring arcs share their joining point.
    fn line(&self, refs: &[i64]) -> Result<Vec<Coord<f64>>> {
        let mut points: Vec<Coord<f64>> = Vec::new();
        for &index in refs {
            let arc = self.arc(index)?;
            points.pop();
            let start = points.len();
            points.extend_from_slice(arc);
            if index < 0 {
                points[start..].reverse();
            }
        }
        Ok(points)
    }

    fn ring(&self, refs: &[i64]) -> Result<Vec<Coord<f64>>> {
        let mut points = self.line(refs)?;
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Option<Polygon<f64>>> {
        let mut decoded = Vec::with_capacity(rings.len());
        for refs in rings {
            let ring = self.ring(refs)?;
            if !ring.is_empty() {
                decoded.push(LineString::new(ring));
            }
        }
        let mut decoded = decoded.into_iter();
        Ok(decoded
            .next()
            .map(|exterior| Polygon::new(exterior, decoded.collect())))
    }
}
