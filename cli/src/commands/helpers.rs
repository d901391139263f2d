use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macroplan_core::catalog::FoodCatalog;
use macroplan_core::models::{LineItem, Totals};
use macroplan_core::nutrition::MacroStatus;

/// Parse a quantity like "200" or "200g" into grams.
pub(crate) fn parse_grams(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid quantity: '{s}'. Use a number like '200' or '200g'"))?;
    if value <= 0.0 {
        bail!("Quantity must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse a 1-based entry number as shown in tables into an index.
pub(crate) fn parse_entry_number(n: usize) -> Result<usize> {
    if n == 0 {
        bail!("Entry numbers start at 1");
    }
    Ok(n - 1)
}

/// Why a typed food name did not pick exactly one catalog entry.
#[derive(Debug, PartialEq)]
pub(crate) enum FoodLookupError {
    NotFound(String),
    Ambiguous {
        query: String,
        candidates: Vec<String>,
        total: usize,
    },
}

impl fmt::Display for FoodLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(query) => write!(
                f,
                "No food found for '{query}'. Use `macroplan food list` to see the catalog"
            ),
            Self::Ambiguous {
                query,
                candidates,
                total,
            } => {
                let more = if *total > candidates.len() { ", ..." } else { "" };
                write!(
                    f,
                    "'{query}' matches several foods: {}{more}. Be more specific",
                    candidates.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for FoodLookupError {}

/// Map what the user typed to a catalog name.
pub(crate) fn resolve_food(
    catalog: &FoodCatalog,
    query: &str,
) -> std::result::Result<String, FoodLookupError> {
    if let Some(entry) = catalog.resolve(query) {
        return Ok(entry.name.clone());
    }
    let matches = catalog.search(query);
    if matches.is_empty() {
        return Err(FoodLookupError::NotFound(query.to_string()));
    }
    Err(FoodLookupError::Ambiguous {
        query: query.to_string(),
        candidates: matches.iter().take(5).map(|e| e.name.clone()).collect(),
        total: matches.len(),
    })
}

pub(crate) fn print_items_table(items: &[LineItem]) {
    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Grams")]
        grams: String,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carb: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let rows: Vec<ItemRow> = items
        .iter()
        .enumerate()
        .map(|(i, item)| ItemRow {
            idx: i + 1,
            food: truncate(&item.food, 35),
            grams: format_grams(item.grams),
            kcal: format!("{:.0}", item.kcal),
            protein: format!("{:.1}g", item.protein),
            carb: format!("{:.1}g", item.carb),
            fat: format!("{:.1}g", item.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_grams(grams: f64) -> String {
    if grams.fract() == 0.0 {
        format!("{grams:.0}g")
    } else {
        format!("{grams}g")
    }
}

/// kcal at whole units, macros at one decimal.
pub(crate) fn format_totals(t: &Totals) -> String {
    let kcal = no_neg_zero(t.kcal);
    let p = no_neg_zero(t.protein);
    let c = no_neg_zero(t.carb);
    let f = no_neg_zero(t.fat);
    format!("{kcal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{f:.1}g")
}

fn format_delta_field(value: f64, decimals: i32, unit: &str) -> String {
    let prec = usize::try_from(decimals).unwrap_or(0);
    match MacroStatus::classify(value, decimals) {
        MacroStatus::Remaining => format!("{value:.prec$}{unit} left"),
        MacroStatus::Met => "met".to_string(),
        MacroStatus::Over => format!("{:.prec$}{unit} over", -value),
    }
}

/// Negative deltas read as "over", never as zero.
pub(crate) fn format_delta(d: &Totals) -> String {
    format!(
        "{} | P:{} C:{} F:{}",
        format_delta_field(d.kcal, 0, " kcal"),
        format_delta_field(d.protein, 1, "g"),
        format_delta_field(d.carb, 1, "g"),
        format_delta_field(d.fat, 1, "g"),
    )
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// The line printed for a rejected input: JSON on stdout with `--json`,
/// plain text on stderr otherwise.
pub(crate) fn rejection(message: &str, json: bool) -> String {
    if json {
        json_error(message)
    } else {
        message.to_string()
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grams() {
        assert!((parse_grams("200").unwrap() - 200.0).abs() < f64::EPSILON);
        assert!((parse_grams("200g").unwrap() - 200.0).abs() < f64::EPSILON);
        assert!((parse_grams(" 150.5 g ").unwrap() - 150.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_grams_invalid() {
        assert!(parse_grams("abc").is_err());
        assert!(parse_grams("0").is_err());
        assert!(parse_grams("-50g").is_err());
    }

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(parse_date(Some("15/01/2024".to_string())).is_err());
    }

    #[test]
    fn test_parse_entry_number() {
        assert_eq!(parse_entry_number(1).unwrap(), 0);
        assert!(parse_entry_number(0).is_err());
    }

    #[test]
    fn test_resolve_food() {
        let catalog = FoodCatalog::builtin();
        assert_eq!(resolve_food(&catalog, "banana").unwrap(), "Banana");
        assert_eq!(
            resolve_food(&catalog, "pizza"),
            Err(FoodLookupError::NotFound("pizza".to_string()))
        );
        match resolve_food(&catalog, "rice") {
            Err(FoodLookupError::Ambiguous {
                candidates, total, ..
            }) => {
                assert!(candidates.iter().any(|c| c == "Rice, brown, cooked"));
                assert!(candidates.iter().any(|c| c == "Rice, white, cooked"));
                assert_eq!(total, candidates.len());
            }
            other => panic!("expected an ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_food_rejection_is_json() {
        let err = FoodLookupError::NotFound("pizza".to_string());
        let line = rejection(&err.to_string(), true);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value["error"].as_str().unwrap().starts_with("No food found for 'pizza'"));
        assert_eq!(rejection(&err.to_string(), false), err.to_string());
    }

    #[test]
    fn test_bad_quantity_rejection_is_json() {
        let err = parse_grams("lots").unwrap_err();
        let line = rejection(&format!("{err:#}"), true);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value["error"].as_str().unwrap().contains("Invalid quantity: 'lots'"));
    }

    #[test]
    fn test_format_totals() {
        let t = Totals::new(425.0, 36.4, 56.0, 4.2);
        assert_eq!(format_totals(&t), "425 kcal | P:36.4g C:56.0g F:4.2g");
    }

    #[test]
    fn test_format_delta_over_is_not_clamped() {
        let d = Totals::new(-200.0, 12.5, 0.0, -3.0);
        assert_eq!(
            format_delta(&d),
            "200 kcal over | P:12.5g left C:met F:3.0g over"
        );
    }

    #[test]
    fn test_format_grams() {
        assert_eq!(format_grams(200.0), "200g");
        assert_eq!(format_grams(12.5), "12.5g");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }
}
