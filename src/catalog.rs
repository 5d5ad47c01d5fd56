use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::map::{Coordinate, MAX_ZOOM, MIN_ZOOM};

/// A top-level administrative region with its wards and default map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub wards: Vec<String>,
    pub center: Coordinate,
    pub zoom: u8,
}

impl Region {
    fn new(name: &str, wards: &[&str], lat: f64, lng: f64, zoom: u8) -> Self {
        Self {
            name: name.to_string(),
            wards: wards.iter().map(|w| w.to_string()).collect(),
            center: Coordinate { lat, lng },
            zoom,
        }
    }

    pub fn has_ward(&self, ward: &str) -> bool {
        self.wards.iter().any(|w| w == ward)
    }
}

/// Ordered, read-only region table. Built once at startup and handed to the app.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    regions: Vec<Region>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    regions: Vec<Region>,
}

impl Catalog {
    /// Validate and wrap a region list.
    pub fn from_regions(regions: Vec<Region>) -> Result<Self> {
        if regions.is_empty() {
            bail!("Catalog must contain at least one region");
        }

        let mut names = HashSet::new();
        for region in &regions {
            if region.name.trim().is_empty() {
                bail!("Region name must not be empty");
            }
            if !names.insert(region.name.as_str()) {
                bail!("Duplicate region '{}'", region.name);
            }
            if region.wards.is_empty() {
                bail!("Region '{}' has no wards", region.name);
            }
            let mut wards = HashSet::new();
            for ward in &region.wards {
                if ward.trim().is_empty() {
                    bail!("Region '{}' has an empty ward name", region.name);
                }
                if !wards.insert(ward.as_str()) {
                    bail!("Duplicate ward '{}' in region '{}'", ward, region.name);
                }
            }
            if !(MIN_ZOOM..=MAX_ZOOM).contains(&region.zoom) {
                bail!(
                    "Region '{}' has zoom {} (expected {}..={})",
                    region.name,
                    region.zoom,
                    MIN_ZOOM,
                    MAX_ZOOM
                );
            }
            if !region.center.is_valid() {
                bail!(
                    "Region '{}' has an out-of-range center ({}, {})",
                    region.name,
                    region.center.lat,
                    region.center.lng
                );
            }
        }

        Ok(Self { regions })
    }

    /// The built-in Tanzania region table.
    pub fn tanzania() -> Self {
        Self {
            regions: vec![
                Region::new(
                    "Dar es Salaam",
                    &["Ilala", "Kinondoni", "Temeke", "Ubungo", "Kigamboni"],
                    -6.8,
                    39.28,
                    12,
                ),
                Region::new(
                    "Arusha",
                    &[
                        "Arusha Urban",
                        "Arusha Rural",
                        "Meru",
                        "Karatu",
                        "Monduli",
                        "Longido",
                        "Ngorongoro",
                    ],
                    -3.386925,
                    36.682993,
                    10,
                ),
                Region::new(
                    "Kilimanjaro",
                    &[
                        "Moshi Urban",
                        "Moshi Rural",
                        "Hai",
                        "Rombo",
                        "Siha",
                        "Mwanga",
                        "Same",
                    ],
                    -3.375,
                    37.343,
                    10,
                ),
                Region::new(
                    "Dodoma",
                    &[
                        "Dodoma Urban",
                        "Dodoma Rural",
                        "Bahi",
                        "Chamwino",
                        "Chemba",
                        "Kondoa",
                        "Kongwa",
                        "Mpwapwa",
                    ],
                    -6.172,
                    35.739,
                    10,
                ),
                Region::new(
                    "Mwanza",
                    &[
                        "Nyamagana",
                        "Ilemela",
                        "Kwimba",
                        "Magu",
                        "Misungwi",
                        "Sengerema",
                        "Ukerewe",
                    ],
                    -2.516,
                    32.917,
                    10,
                ),
                Region::new(
                    "Mbeya",
                    &[
                        "Mbeya Urban",
                        "Mbeya Rural",
                        "Chunya",
                        "Kyela",
                        "Mbarali",
                        "Rungwe",
                        "Busokelo",
                    ],
                    -8.909,
                    33.460,
                    10,
                ),
                Region::new(
                    "Morogoro",
                    &[
                        "Morogoro Urban",
                        "Morogoro Rural",
                        "Kilosa",
                        "Kilombero",
                        "Ulanga",
                        "Mvomero",
                        "Malinyi",
                        "Gairo",
                    ],
                    -6.827,
                    37.663,
                    10,
                ),
                Region::new(
                    "Tanga",
                    &[
                        "Tanga Urban",
                        "Tanga Rural",
                        "Handeni",
                        "Kilindi",
                        "Korogwe",
                        "Lushoto",
                        "Mkinga",
                        "Muheza",
                        "Pangani",
                    ],
                    -5.068,
                    39.098,
                    10,
                ),
                Region::new(
                    "Mara",
                    &[
                        "Musoma Urban",
                        "Musoma Rural",
                        "Bunda",
                        "Butiama",
                        "Rorya",
                        "Serengeti",
                        "Tarime",
                    ],
                    -1.663,
                    34.473,
                    10,
                ),
                Region::new(
                    "Iringa",
                    &["Iringa Urban", "Iringa Rural", "Kilolo", "Mufindi"],
                    -7.770,
                    35.693,
                    10,
                ),
            ],
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn find(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Load a replacement catalog from a `.yml`/`.yaml` or `.csv` file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let regions = match extension.as_str() {
        "yml" | "yaml" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
            parse_yaml_regions(&content)
                .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?
        }
        "csv" => {
            let reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(path)
                .with_context(|| format!("Failed to open catalog file: {}", path.display()))?;
            parse_csv_regions(reader)
                .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?
        }
        other => bail!(
            "Unsupported catalog format '{}' for {} (expected .yml, .yaml or .csv)",
            other,
            path.display()
        ),
    };

    Catalog::from_regions(regions)
}

fn parse_yaml_regions(content: &str) -> Result<Vec<Region>> {
    let file: CatalogFile = serde_yaml::from_str(content)?;
    Ok(file.regions)
}

/// One row per ward: `region,ward,lat,lng,zoom`. The first row of a region
/// fixes its center and zoom. Later rows may leave those columns blank; when
/// filled they must still parse, but only the first row's values are used.
/// Regions keep first-seen order.
fn parse_csv_regions<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Region>> {
    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect::<Vec<_>>();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Missing required '{}' header", name))
    };
    let region_idx = column("region")?;
    let ward_idx = column("ward")?;
    let lat_idx = column("lat")?;
    let lng_idx = column("lng")?;
    let zoom_idx = column("zoom")?;

    let mut regions: Vec<Region> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for (idx, record) in reader.records().enumerate() {
        let row_number = idx + 2;
        let record = record.with_context(|| format!("Failed to parse CSV row {}", row_number))?;
        let field = |i: usize| record.get(i).unwrap_or_default();

        let name = field(region_idx);
        let ward = field(ward_idx);
        if name.is_empty() || ward.is_empty() {
            bail!("Row {}: region and ward are required", row_number);
        }

        let lat: Option<f64> = parse_optional(field(lat_idx), row_number, "lat")?;
        let lng: Option<f64> = parse_optional(field(lng_idx), row_number, "lng")?;
        let zoom: Option<u8> = parse_optional(field(zoom_idx), row_number, "zoom")?;

        match index_by_name.get(name) {
            Some(&i) => regions[i].wards.push(ward.to_string()),
            None => {
                let (Some(lat), Some(lng), Some(zoom)) = (lat, lng, zoom) else {
                    bail!(
                        "Row {}: first row of region '{}' needs lat, lng and zoom",
                        row_number,
                        name
                    );
                };
                index_by_name.insert(name.to_string(), regions.len());
                regions.push(Region {
                    name: name.to_string(),
                    wards: vec![ward.to_string()],
                    center: Coordinate { lat, lng },
                    zoom,
                });
            }
        }
    }

    Ok(regions)
}

/// Blank cells are `None`; anything else must parse.
fn parse_optional<T: std::str::FromStr>(
    value: &str,
    row_number: usize,
    column: &str,
) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => bail!("Row {}: invalid {} '{}'", row_number, column, value),
    }
}
