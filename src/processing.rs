use crate::config::AppConfig;
use crate::join::JoinIndex;
use crate::legend::{build_legend, Legend};
use crate::render::fmt_path;
use crate::scale::QuantizeScale;
use crate::tooltip::tooltip_text;
use crate::types::{County, EducationRecord, FeatureId};
use anyhow::{anyhow, Result};
use geo::{Coord, MultiPolygon};
use rayon::prelude::*;
use tracing::info;

/// Everything needed to draw one county.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyShape {
    pub fips: Option<FeatureId>,
    pub education: f64,
    pub fill: &'static str,
    pub path: String,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choropleth {
    pub width: u32,
    pub height: u32,
    pub shapes: Vec<CountyShape>,
    pub legend: Legend,
}

/// One full render pass. Pure in its inputs: calling it again with the same
/// data gives the same model.
pub fn process_data(
    config: &AppConfig,
    records: &[EducationRecord],
    counties: &[County],
) -> Result<Choropleth> {
    let color = QuantizeScale::from_records(records)
        .ok_or_else(|| anyhow!("Education dataset is empty, nothing to color"))?;
    let index = JoinIndex::new(records);
    info!(
        records = records.len(),
        distinct_fips = index.fips_count(),
        counties = counties.len(),
        "building choropleth"
    );

    let shapes: Vec<CountyShape> = counties
        .par_iter()
        .map(|county| county_shape(county, &index, &color))
        .collect();

    let joined = shapes.iter().filter(|s| s.tooltip.is_some()).count();
    info!(joined, unmatched = shapes.len() - joined, "joined counties to education records");

    Ok(Choropleth {
        width: config.map.width,
        height: config.map.height,
        shapes,
        legend: build_legend(&color, &config.legend),
    })
}

fn county_shape(county: &County, index: &JoinIndex<'_>, color: &QuantizeScale) -> CountyShape {
    let record = index.lookup(county.id.as_ref());
    let education = record.map_or(0.0, |r| r.bachelors_or_higher);
    CountyShape {
        fips: county.id.clone(),
        education,
        fill: color.color(education),
        path: path_data(&county.geometry),
        tooltip: record.map(tooltip_text),
    }
}

/// SVG path for planar geometry, no projection. Each ring is `M`, then `L`
/// per point, then `Z`; the ring's closing duplicate is not repeated.
pub fn path_data(geometry: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in geometry {
        push_ring(&mut d, &polygon.exterior().0);
        for interior in polygon.interiors() {
            push_ring(&mut d, &interior.0);
        }
    }
    d
}

fn push_ring(d: &mut String, coords: &[Coord<f64>]) {
    let open = match coords {
        [first, .., last] if first == last => &coords[..coords.len() - 1],
        _ => coords,
    };
    if open.is_empty() {
        return;
    }
    for (i, c) in open.iter().enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&fmt_path(c.x));
        d.push(',');
        d.push_str(&fmt_path(c.y));
    }
    d.push('Z');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::BLUES;
    use geo::{polygon, Polygon};

    fn config() -> AppConfig {
        AppConfig::from_toml(
            "[input]\neducation = \"e.json\"\ncounties = \"c.json\"\n[output]\ndir = \"out\"\n",
        )
        .unwrap()
    }

    fn record(fips: i64, name: &str, state: &str, value: f64) -> EducationRecord {
        EducationRecord {
            fips,
            state: state.to_string(),
            area_name: name.to_string(),
            bachelors_or_higher: value,
        }
    }

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        let p: Polygon<f64> = polygon![
            (x: x, y: y),
            (x: x + 10.0, y: y),
            (x: x + 10.0, y: y + 10.0),
            (x: x, y: y + 10.0),
        ];
        MultiPolygon::new(vec![p])
    }

    fn county(id: Option<FeatureId>, x: f64) -> County {
        County {
            id,
            geometry: square(x, 0.0),
        }
    }

    fn sample() -> (Vec<EducationRecord>, Vec<County>) {
        let records = vec![
            record(1001, "Autauga County", "AL", 21.4),
            record(1003, "Baldwin County", "AL", 28.6),
            record(1005, "Barbour County", "AL", 2.6),
            record(56045, "Weston County", "WY", 75.1),
        ];
        let counties = vec![
            county(Some(FeatureId::Number(1001)), 0.0),
            county(Some(FeatureId::Number(1003)), 10.0),
            county(Some(FeatureId::Number(99999)), 20.0),
            county(None, 30.0),
            county(Some(FeatureId::Number(56045)), 40.0),
        ];
        (records, counties)
    }

    #[test]
    fn one_shape_per_feature_regardless_of_joins() {
        let (records, counties) = sample();
        let map = process_data(&config(), &records, &counties).unwrap();
        assert_eq!(map.shapes.len(), counties.len());
        assert_eq!(map.width, 960);
        assert_eq!(map.height, 600);
    }

    #[test]
    fn joined_county_carries_record_value_and_tooltip() {
        let (records, counties) = sample();
        let map = process_data(&config(), &records, &counties).unwrap();
        let color = QuantizeScale::from_records(&records).unwrap();

        let autauga = &map.shapes[0];
        assert_eq!(autauga.fips, Some(FeatureId::Number(1001)));
        assert_eq!(autauga.education, 21.4);
        assert_eq!(autauga.fill, color.color(21.4));
        assert_eq!(autauga.tooltip.as_deref(), Some("Autauga County, AL: 21.4%"));
    }

    #[test]
    fn unmatched_county_defaults_to_zero_without_tooltip() {
        let (records, counties) = sample();
        let map = process_data(&config(), &records, &counties).unwrap();
        let color = QuantizeScale::from_records(&records).unwrap();

        for shape in &map.shapes[2..4] {
            assert_eq!(shape.education, 0.0);
            assert_eq!(shape.fill, color.color(0.0));
            assert_eq!(shape.fill, BLUES[0]);
            assert!(shape.tooltip.is_none());
        }
        assert_eq!(map.shapes[3].fips, None);
    }

    #[test]
    fn fill_darkens_with_attainment() {
        let (records, counties) = sample();
        let map = process_data(&config(), &records, &counties).unwrap();

        let mut joined: Vec<&CountyShape> = map.shapes.iter().filter(|s| s.tooltip.is_some()).collect();
        joined.sort_by(|a, b| a.education.total_cmp(&b.education));
        let ranks: Vec<usize> = joined
            .iter()
            .map(|s| BLUES.iter().position(|&c| c == s.fill).unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let (records, counties) = sample();
        let first = process_data(&config(), &records, &counties).unwrap();
        let second = process_data(&config(), &records, &counties).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_education_dataset_is_rejected() {
        let (_, counties) = sample();
        assert!(process_data(&config(), &[], &counties).is_err());
    }

    #[test]
    fn path_data_closes_each_ring_once() {
        assert_eq!(path_data(&square(0.0, 0.0)), "M0,0L10,0L10,10L0,10Z");
    }

    #[test]
    fn path_data_includes_holes_and_rounds_coordinates() {
        let p = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0)],
            interiors: [[(x: 10.12345, y: 10.0), (x: 20.0, y: 10.0), (x: 20.0, y: 20.0006)]]
        );
        let d = path_data(&MultiPolygon::new(vec![p]));
        assert_eq!(d, "M0,0L100,0L100,100ZM10.123,10L20,10L20,20.001Z");
    }

    #[test]
    fn empty_geometry_has_empty_path() {
        assert_eq!(path_data(&MultiPolygon::new(vec![])), "");
    }
}
