use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::models::FoodEntry;

/// Foods shipped with the app: `(name, kcal, protein, carb, fat)` per 100 g.
const BUILTIN_FOODS: &[(&str, f64, f64, f64, f64)] = &[
    ("Apple", 52.0, 0.3, 13.8, 0.2),
    ("Avocado", 160.0, 2.0, 8.5, 14.7),
    ("Banana", 89.0, 1.1, 22.8, 0.3),
    ("Beans, black, cooked", 132.0, 8.9, 23.7, 0.5),
    ("Beef, ground, cooked", 250.0, 26.0, 0.0, 15.0),
    ("Bread, white", 265.0, 9.0, 49.0, 3.2),
    ("Bread, whole wheat", 247.0, 13.0, 41.0, 3.4),
    ("Broccoli, cooked", 35.0, 2.4, 7.2, 0.4),
    ("Cheese, cheddar", 403.0, 24.9, 1.3, 33.1),
    ("Chicken breast, cooked", 165.0, 31.0, 0.0, 3.6),
    ("Cottage cheese", 98.0, 11.1, 3.4, 4.3),
    ("Egg, whole, boiled", 155.0, 12.6, 1.1, 10.6),
    ("Egg white", 52.0, 10.9, 0.7, 0.2),
    ("Lentils, cooked", 116.0, 9.0, 20.1, 0.4),
    ("Milk, skim", 34.0, 3.4, 5.0, 0.1),
    ("Milk, whole", 61.0, 3.2, 4.8, 3.3),
    ("Oats, rolled", 379.0, 13.2, 67.7, 6.5),
    ("Olive oil", 884.0, 0.0, 0.0, 100.0),
    ("Pasta, cooked", 158.0, 5.8, 30.9, 0.9),
    ("Peanut butter", 588.0, 25.1, 20.0, 50.4),
    ("Potato, boiled", 87.0, 1.9, 20.1, 0.1),
    ("Rice, brown, cooked", 123.0, 2.7, 25.6, 1.0),
    ("Rice, white, cooked", 130.0, 2.7, 28.0, 0.3),
    ("Salmon, cooked", 206.0, 22.1, 0.0, 12.4),
    ("Sweet potato, boiled", 76.0, 1.4, 17.7, 0.1),
    ("Tofu, firm", 144.0, 17.3, 2.8, 8.7),
    ("Tuna, canned in water", 116.0, 25.5, 0.0, 0.8),
    ("Whey protein", 400.0, 80.0, 8.0, 6.0),
    ("Yogurt, greek, plain", 97.0, 9.0, 3.9, 5.0),
];

/// Name → per-100 g macros. Loaded once at startup and read-only afterwards.
///
/// Names are kept sorted so listings come out alphabetically.
#[derive(Debug, Clone, Default)]
pub struct FoodCatalog {
    foods: BTreeMap<String, FoodEntry>,
}

/// Per-food object in a JSON catalog document.
#[derive(Debug, Deserialize)]
struct JsonFood {
    kcal: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carb: f64,
    #[serde(default)]
    fat: f64,
}

impl FoodCatalog {
    /// Build from entries; a repeated name replaces the earlier one.
    pub fn from_entries<I: IntoIterator<Item = FoodEntry>>(entries: I) -> Self {
        let foods = entries
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect();
        Self { foods }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_FOODS.iter().map(|&(name, kcal, protein, carb, fat)| {
            FoodEntry {
                name: name.to_string(),
                kcal,
                protein,
                carb,
                fat,
            }
        }))
    }

    /// Load a catalog file, picking the format from its extension (`.csv` or `.json`).
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open food catalog: {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let catalog = match ext.as_deref() {
            Some("csv") => Self::from_csv_reader(file),
            Some("json") => Self::from_json_reader(file),
            _ => bail!(
                "Unsupported catalog format: {}. Use a .csv or .json file",
                path.display()
            ),
        }
        .with_context(|| format!("Failed to load food catalog: {}", path.display()))?;

        tracing::debug!(path = %path.display(), foods = catalog.len(), "loaded food catalog");
        Ok(catalog)
    }

    /// Parse a CSV catalog.
    ///
    /// Expected header: `name,kcal,protein,carb,fat` (any order, any case).
    /// Only `name` and `kcal` are required; missing macro columns read as 0.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
        let col =
            |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

        let idx_name = col("name").context("Missing required column: name")?;
        let idx_kcal = col("kcal").context("Missing required column: kcal")?;
        let idx_protein = col("protein");
        let idx_carb = col("carb");
        let idx_fat = col("fat");

        let mut entries = Vec::new();

        for (line_num, result) in rdr.records().enumerate() {
            let line = line_num + 2;
            let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;

            let name = record.get(idx_name).unwrap_or("").trim().to_string();
            if name.is_empty() {
                continue;
            }

            let parse = |column: &str, idx: Option<usize>| -> Result<f64> {
                let raw = idx.and_then(|i| record.get(i)).unwrap_or("").trim();
                if raw.is_empty() {
                    return Ok(0.0);
                }
                let value: f64 = raw
                    .parse()
                    .with_context(|| format!("Invalid {column} '{raw}' on row {line}"))?;
                if !value.is_finite() || value < 0.0 {
                    bail!("{column} for '{name}' must not be negative (row {line})");
                }
                Ok(value)
            };

            entries.push(FoodEntry {
                kcal: parse("kcal", Some(idx_kcal))?,
                protein: parse("protein", idx_protein)?,
                carb: parse("carb", idx_carb)?,
                fat: parse("fat", idx_fat)?,
                name,
            });
        }

        Ok(Self::from_entries(entries))
    }

    /// Parse a JSON catalog: `{ "name": { "kcal": .., "protein": .., "carb": .., "fat": .. } }`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: BTreeMap<String, JsonFood> =
            serde_json::from_reader(reader).context("Invalid catalog JSON")?;

        let mut entries = Vec::with_capacity(raw.len());
        for (name, food) in raw {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("Food name must not be empty");
            }
            for (field, value) in [
                ("kcal", food.kcal),
                ("protein", food.protein),
                ("carb", food.carb),
                ("fat", food.fat),
            ] {
                if !value.is_finite() || value < 0.0 {
                    bail!("{field} for '{name}' must not be negative");
                }
            }
            entries.push(FoodEntry {
                name,
                kcal: food.kcal,
                protein: food.protein,
                carb: food.carb,
                fat: food.fat,
            });
        }

        Ok(Self::from_entries(entries))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FoodEntry> {
        self.foods.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.foods.contains_key(name)
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = &FoodEntry> {
        self.foods.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Case-insensitive substring match on the food name.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&FoodEntry> {
        let needle = query.trim().to_lowercase();
        self.entries()
            .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Resolve user input to a catalog name: exact match first, then a
    /// case-insensitive exact match, then a unique substring match.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<&FoodEntry> {
        let query = query.trim();
        if let Some(entry) = self.get(query) {
            return Some(entry);
        }
        if let Some(entry) = self
            .entries()
            .find(|e| e.name.eq_ignore_ascii_case(query))
        {
            return Some(entry);
        }
        match self.search(query).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}
