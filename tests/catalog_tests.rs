//! # Catalog Tests
//!
//! Loading of the shipped plant data and class mapping, and profile rendering.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use doctor_roots::catalog::{ClassMapping, PlantCatalog, PlantRecord, FEATURED_PLANTS};

fn data_path(file: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
}

fn sample_record() -> PlantRecord {
    PlantRecord {
        scientific_name: "Citrus limon".into(),
        common_name: "Lemon".into(),
        local_name: "Mulemoni".into(),
        description: "Small thorny tree.".into(),
        uses: "Colds and sore throats.".into(),
        preparation: "Juice in warm water.".into(),
        conservation_status: "Not Evaluated".into(),
        citations: vec![
            "Zeta et al. (2020). Later paper.".into(),
            "Alpha, B. (1999). Earlier paper.".into(),
            "Kew POWO entry.".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The shipped data covers every mapped class and every menu entry
    #[test]
    fn test_shipped_data_is_consistent() -> Result<()> {
        let catalog = PlantCatalog::load(&data_path("plant_data.json"))?;
        let mapping = ClassMapping::load(&data_path("class_mapping.json"))?;

        assert_eq!(catalog.len(), 7);
        assert_eq!(mapping.len(), 7);
        assert!(catalog.check_integrity(&mapping).is_empty());

        for plant in FEATURED_PLANTS.iter() {
            assert!(catalog.lookup(plant.scientific_name).is_some(), "{}", plant.scientific_name);
        }
        Ok(())
    }

    /// Profile text lists every citation on its own line, in source order
    #[test]
    fn test_profile_renders_citations_in_order() {
        let record = sample_record();
        let profile = record.render_profile();

        let tail = profile
            .split("📚 Want to learn more? Check out these papers: \n")
            .nth(1)
            .unwrap();
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines, record.citations.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_profile_exact_layout() {
        let mut record = sample_record();
        record.citations = vec!["Only citation".into()];
        assert_eq!(
            record.render_profile(),
            "🌿 *Plant Profile: Lemon* 🌿\n\
             - Scientific Name: Citrus limon\n\
             - Shona Name: Mulemoni\n\
             \n🍃 What it looks like: \nSmall thorny tree.\n\
             \n💊 Reported Medicinal Uses: \nColds and sore throats.\n\
             \n🧪 How it's prepared & used: \nJuice in warm water.\n\
             \n🌱 Conservation Status (on the IUCN Red List): Not Evaluated\n\
             \n📚 Want to learn more? Check out these papers: \nOnly citation"
        );
    }

    /// Plant data files are read with the original field names
    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"[{{
                "Scientific Name": "Citrus limon",
                "Common Name": "Lemon",
                "Shona Name": "Mulemoni",
                "Physical Description": "d",
                "Reported Medicinal Uses": "u",
                "Preparation Methods & Parts Used": "p",
                "IUCN Red List of Threatened Species": "s",
                "Citations": ["c1", "c2"]
            }}]"#
        )?;

        let catalog = PlantCatalog::load(file.path())?;
        let record = catalog.lookup("Citrus limon").unwrap();
        assert_eq!(record.local_name, "Mulemoni");
        assert_eq!(record.citations, vec!["c1", "c2"]);
        assert!(catalog.lookup("Citrus").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = PlantCatalog::load(Path::new("/nonexistent/plant_data.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read plant data"));
    }
}
