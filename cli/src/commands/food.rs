use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macroplan_core::catalog::FoodCatalog;

use super::helpers::truncate;

pub(crate) fn cmd_food_list(catalog: &FoodCatalog, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "kcal/100g")]
        kcal: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "C/100g")]
        carb: String,
        #[tabled(rename = "F/100g")]
        fat: String,
    }

    let foods = catalog.search(search.unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        match search {
            Some(q) => eprintln!("No foods matching '{q}'"),
            None => eprintln!("The food catalog is empty"),
        }
        process::exit(2);
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            name: truncate(&f.name, 40),
            kcal: format!("{:.0}", f.kcal),
            protein: format!("{:.1}", f.protein),
            carb: format!("{:.1}", f.carb),
            fat: format!("{:.1}", f.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
