//! # Plant Catalog Module
//!
//! The entity information store: immutable plant records loaded once at
//! startup, the mapping from classifier output indices to scientific names,
//! and the fixed ordering of plants offered from the menu.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{error, info};

/// A plant offered from the "learn more" menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturedPlant {
    pub display_name: &'static str,
    pub scientific_name: &'static str,
}

/// Plants listed by menu option 1, in the order they are numbered
pub const FEATURED_PLANTS: [FeaturedPlant; 7] = [
    FeaturedPlant {
        display_name: "Madagascar Periwinkle",
        scientific_name: "Catharanthus roseus",
    },
    FeaturedPlant {
        display_name: "Guava",
        scientific_name: "Psidium guajava",
    },
    FeaturedPlant {
        display_name: "Ginger",
        scientific_name: "Zingiber officinale Roscoe",
    },
    FeaturedPlant {
        display_name: "Lemon",
        scientific_name: "Citrus limon",
    },
    FeaturedPlant {
        display_name: "Mango",
        scientific_name: "Mangifera indica",
    },
    FeaturedPlant {
        display_name: "Moringa",
        scientific_name: "Moringa oleifera Lour",
    },
    FeaturedPlant {
        display_name: "Aloe vera",
        scientific_name: "Aloe barbadensis",
    },
];

/// One plant's full informational profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    #[serde(rename = "Scientific Name")]
    pub scientific_name: String,
    #[serde(rename = "Common Name")]
    pub common_name: String,
    #[serde(rename = "Shona Name")]
    pub local_name: String,
    #[serde(rename = "Physical Description")]
    pub description: String,
    #[serde(rename = "Reported Medicinal Uses")]
    pub uses: String,
    #[serde(rename = "Preparation Methods & Parts Used")]
    pub preparation: String,
    #[serde(rename = "IUCN Red List of Threatened Species")]
    pub conservation_status: String,
    #[serde(rename = "Citations", default)]
    pub citations: Vec<String>,
}

impl PlantRecord {
    /// Render the profile text shown to users, citations one per line in source order
    pub fn render_profile(&self) -> String {
        format!(
            "🌿 *Plant Profile: {}* 🌿\n\
             - Scientific Name: {}\n\
             - Shona Name: {}\n\
             \n🍃 What it looks like: \n{}\n\
             \n💊 Reported Medicinal Uses: \n{}\n\
             \n🧪 How it's prepared & used: \n{}\n\
             \n🌱 Conservation Status (on the IUCN Red List): {}\n\
             \n📚 Want to learn more? Check out these papers: \n{}",
            self.common_name,
            self.scientific_name,
            self.local_name,
            self.description,
            self.uses,
            self.preparation,
            self.conservation_status,
            self.citations.join("\n"),
        )
    }
}

/// Immutable set of plant records keyed by scientific name
#[derive(Debug, Clone, Default)]
pub struct PlantCatalog {
    records: Vec<PlantRecord>,
}

impl PlantCatalog {
    /// Build a catalog, rejecting duplicate scientific names
    pub fn new(records: Vec<PlantRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.scientific_name.as_str()) {
                return Err(anyhow!(
                    "Duplicate scientific name in plant data: {}",
                    record.scientific_name
                ));
            }
        }
        Ok(Self { records })
    }

    /// Parse a JSON array of plant records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<PlantRecord> =
            serde_json::from_str(json).context("Failed to parse plant data")?;
        Self::new(records)
    }

    /// Load plant records from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plant data from {}", path.display()))?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), records = catalog.len(), "Plant catalog loaded");
        Ok(catalog)
    }

    pub fn lookup(&self, scientific_name: &str) -> Option<&PlantRecord> {
        self.records
            .iter()
            .find(|record| record.scientific_name == scientific_name)
    }

    /// Resolve a 1-based menu selection to its record
    pub fn featured(&self, selection: usize) -> Option<&PlantRecord> {
        let plant = FEATURED_PLANTS.get(selection.checked_sub(1)?)?;
        self.lookup(plant.scientific_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names referenced by the mapping or the menu that have no record
    ///
    /// Each one is logged as a data-integrity error.
    pub fn check_integrity(&self, mapping: &ClassMapping) -> Vec<String> {
        let mut missing: Vec<String> = mapping
            .names()
            .chain(FEATURED_PLANTS.iter().map(|plant| plant.scientific_name))
            .filter(|name| self.lookup(name).is_none())
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();

        for name in &missing {
            error!(scientific_name = %name, "data integrity: referenced plant has no record");
        }
        missing
    }
}

/// Mapping from classifier output index to scientific name
#[derive(Debug, Clone, Default)]
pub struct ClassMapping {
    names: HashMap<usize, String>,
}

impl ClassMapping {
    pub fn new(names: HashMap<usize, String>) -> Self {
        Self { names }
    }

    /// Parse a JSON object whose keys are decimal class indices
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> =
            serde_json::from_str(json).context("Failed to parse class mapping")?;
        let names = raw
            .into_iter()
            .map(|(key, name)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, name))
                    .with_context(|| format!("Class mapping key is not an index: {key:?}"))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { names })
    }

    /// Load the class mapping from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class mapping from {}", path.display()))?;
        let mapping = Self::from_json(&json)?;
        info!(path = %path.display(), classes = mapping.len(), "Class mapping loaded");
        Ok(mapping)
    }

    pub fn resolve(&self, class_index: usize) -> Option<&str> {
        self.names.get(&class_index).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
