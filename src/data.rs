use crate::config::AppConfig;
use crate::topology::Topology;
use crate::types::EducationRecord;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Where a dataset comes from: fetched over HTTP or read from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }

    async fn read_bytes(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            Source::Url(url) => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Bad response from {}", url))?;
                let bytes = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read body of {}", url))?;
                Ok(bytes.to_vec())
            }
            Source::File(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path)),
        }
    }
}

/// The two independently loaded datasets. A render is only possible once
/// both are present and the education list is not empty.
#[derive(Debug, Default)]
pub struct DatasetSlots {
    pub education: Option<Vec<EducationRecord>>,
    pub topology: Option<Topology>,
}

impl DatasetSlots {
    pub fn ready(&self) -> Option<(&[EducationRecord], &Topology)> {
        match (&self.education, &self.topology) {
            (Some(education), Some(topology)) if !education.is_empty() => {
                Some((education.as_slice(), topology))
            }
            _ => None,
        }
    }

    /// Like [`DatasetSlots::ready`], but names what is missing.
    pub fn require_ready(&self) -> Result<(&[EducationRecord], &Topology)> {
        if let Some(ready) = self.ready() {
            return Ok(ready);
        }
        let mut missing = Vec::new();
        match &self.education {
            None => missing.push("education records"),
            Some(records) if records.is_empty() => missing.push("education records (empty)"),
            Some(_) => {}
        }
        if self.topology.is_none() {
            missing.push("county topology");
        }
        Err(anyhow!("Cannot render map, missing: {}", missing.join(", ")))
    }
}

pub async fn load_education(source: &Source, client: &reqwest::Client) -> Result<Vec<EducationRecord>> {
    let bytes = source.read_bytes(client).await?;
    let records: Vec<EducationRecord> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse education records from {:?}", source))?;
    Ok(records)
}

pub async fn load_topology(source: &Source, client: &reqwest::Client) -> Result<Topology> {
    let bytes = source.read_bytes(client).await?;
    Topology::from_slice(&bytes).with_context(|| format!("Failed to load topology from {:?}", source))
}

/// Loads both datasets concurrently. A failed load is logged and leaves its
/// slot empty; it never cancels the other load.
pub async fn load_data(config: &AppConfig) -> DatasetSlots {
    let client = reqwest::Client::new();
    let education_source = Source::parse(&config.input.education);
    let counties_source = Source::parse(&config.input.counties);
    info!(education = ?education_source, counties = ?counties_source, "loading datasets");

    let (education, topology) = tokio::join!(
        load_education(&education_source, &client),
        load_topology(&counties_source, &client),
    );

    let mut slots = DatasetSlots::default();
    match education {
        Ok(records) => {
            info!(records = records.len(), "loaded education records");
            slots.education = Some(records);
        }
        Err(e) => warn!("failed to load education records: {e:#}"),
    }
    match topology {
        Ok(topology) => {
            info!(objects = topology.objects.len(), arcs = topology.arcs.len(), "loaded county topology");
            slots.topology = Some(topology);
        }
        Err(e) => warn!("failed to load county topology: {e:#}"),
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EDUCATION: &str = r#"[
        {"fips":1001,"state":"AL","area_name":"Autauga County","bachelorsOrHigher":21.4},
        {"fips":1003,"state":"AL","area_name":"Baldwin County","bachelorsOrHigher":28.6}
    ]"#;

    const COUNTIES: &str = r#"{
        "type": "Topology",
        "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
        "objects": {"counties": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "id": 1001, "arcs": [[0]]}
        ]}}
    }"#;

    fn config_for(education: &str, counties: &str) -> AppConfig {
        AppConfig::from_toml(&format!(
            "[input]\neducation = {:?}\ncounties = {:?}\n[output]\ndir = \"out\"\n",
            education, counties
        ))
        .unwrap()
    }

    #[test]
    fn parses_urls_and_paths() {
        assert_eq!(
            Source::parse("https://example.com/a.json"),
            Source::Url("https://example.com/a.json".to_string())
        );
        assert_eq!(Source::parse("data/a.json"), Source::File(PathBuf::from("data/a.json")));
    }

    #[tokio::test]
    async fn loads_both_datasets_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let education = dir.path().join("education.json");
        let counties = dir.path().join("counties.json");
        fs::write(&education, EDUCATION).unwrap();
        fs::write(&counties, COUNTIES).unwrap();

        let config = config_for(education.to_str().unwrap(), counties.to_str().unwrap());
        let slots = load_data(&config).await;
        let (records, topology) = slots.require_ready().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(topology.features("counties").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_failed_load_leaves_the_other_slot_filled() {
        let dir = tempfile::tempdir().unwrap();
        let education = dir.path().join("education.json");
        fs::write(&education, EDUCATION).unwrap();
        let missing = dir.path().join("missing.json");

        let config = config_for(education.to_str().unwrap(), missing.to_str().unwrap());
        let slots = load_data(&config).await;

        assert!(slots.education.is_some());
        assert!(slots.topology.is_none());
        assert!(slots.ready().is_none());
        let err = slots.require_ready().unwrap_err().to_string();
        assert!(err.contains("county topology"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let education = dir.path().join("education.json");
        fs::write(&education, "[{\"fips\": ").unwrap();

        let client = reqwest::Client::new();
        let result = load_education(&Source::File(education), &client).await;
        assert!(result.is_err());
    }

    #[test]
    fn empty_education_is_not_ready() {
        let topology = Topology::from_slice(COUNTIES.as_bytes()).unwrap();
        let slots = DatasetSlots {
            education: Some(Vec::new()),
            topology: Some(topology),
        };
        assert!(slots.ready().is_none());
        assert!(slots.require_ready().unwrap_err().to_string().contains("empty"));
    }
}
