use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macroplan_core::models::{DayReport, LineItem};

use super::{Service, reject};
use super::helpers::{format_delta, format_totals, no_neg_zero, parse_date, print_items_table};

#[derive(Serialize)]
struct LogView<'a> {
    #[serde(flatten)]
    report: &'a DayReport,
    items: &'a [LineItem],
}

pub(crate) fn cmd_log_show(svc: &Service, date: Option<String>, json: bool) -> Result<()> {
    let date = reject(parse_date(date), json);
    let log = svc.log(date);
    let report = svc.day_report(date);

    if json {
        let view = LogView {
            report: &report,
            items: &log.items,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("=== {date} ===\n");

    if report.target.is_zero() {
        println!("  No plan found. Build one with `macroplan meal add` to get daily targets.\n");
    } else {
        println!("  TARGET:    {}\n", format_totals(&report.target));
    }

    if log.is_empty() {
        eprintln!("Nothing logged on {date}. Use `macroplan log add <food> <grams>`.");
        process::exit(2);
    }

    print_items_table(&log.items);
    println!();
    println!("  CONSUMED:  {}", format_totals(&report.consumed));

    // A zero target means there is no plan; showing "remaining" would mislead.
    if let Some(delta) = &report.delta {
        println!("  REMAINING: {}", format_delta(delta));
    }

    Ok(())
}

pub(crate) fn cmd_history(svc: &Service, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Entries")]
        entries: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "vs Plan")]
        delta: String,
    }

    let today = Local::now().date_naive();
    let reports = svc.history(today, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.iter().all(|r| r.entries == 0) {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = reports
        .iter()
        .map(|r| {
            let c = &r.consumed;
            let delta = match (&r.delta, r.entries) {
                (_, 0) | (None, _) => "-".to_string(),
                (Some(d), _) => {
                    let kcal = no_neg_zero(d.kcal);
                    if kcal < 0.0 {
                        format!("{:.0} over", -kcal)
                    } else {
                        format!("{kcal:.0} left")
                    }
                }
            };
            HistoryRow {
                date: r.date.to_string(),
                entries: r.entries,
                calories: format!("{:.0}", no_neg_zero(c.kcal)),
                protein: format!("{:.1}g", no_neg_zero(c.protein)),
                carbs: format!("{:.1}g", no_neg_zero(c.carb)),
                fat: format!("{:.1}g", no_neg_zero(c.fat)),
                delta,
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
