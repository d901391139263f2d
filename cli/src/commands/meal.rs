use anyhow::Result;
use serde::Serialize;
use std::process;

use macroplan_core::models::{LineItem, Meal, Totals};

use super::helpers::{
    format_grams, format_totals, parse_entry_number, parse_grams, print_items_table,
    resolve_food,
};
use super::{Service, or_report, reject};

#[derive(Serialize)]
struct MealView<'a> {
    name: &'a str,
    items: &'a [LineItem],
    totals: Totals,
}

impl<'a> From<&'a Meal> for MealView<'a> {
    fn from(meal: &'a Meal) -> Self {
        Self {
            name: &meal.name,
            items: &meal.items,
            totals: meal.totals(),
        }
    }
}

#[derive(Serialize)]
struct PlanView<'a> {
    meals: Vec<MealView<'a>>,
    totals: Totals,
}

pub(crate) fn cmd_plan_show(svc: &Service, json: bool) -> Result<()> {
    let plan = svc.plan();

    if json {
        let view = PlanView {
            meals: plan.meals().iter().map(MealView::from).collect(),
            totals: plan.totals(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if plan.is_empty() {
        eprintln!("No meals yet. Use `macroplan meal add <name>` to start your plan.");
        process::exit(2);
    }

    for meal in plan.meals() {
        let totals = meal.totals();
        let name = &meal.name;
        println!("=== {name} ({:.0} kcal) ===", totals.kcal);
        if meal.items.is_empty() {
            println!("  No foods in this meal yet.\n");
            continue;
        }
        print_items_table(&meal.items);
        println!("  Subtotal: {}\n", format_totals(&totals));
    }

    let day = plan.totals();
    if day.is_zero() {
        println!("Add foods to your meals to see the daily total.");
    } else {
        println!("DAILY TOTAL: {}", format_totals(&day));
    }

    Ok(())
}

pub(crate) fn cmd_meal_add(svc: &mut Service, name: &str, json: bool) -> Result<()> {
    let meal = or_report(svc.add_meal(name), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&MealView::from(&meal))?);
    } else {
        println!("Added meal '{}'", meal.name);
    }
    Ok(())
}

pub(crate) fn cmd_meal_remove(svc: &mut Service, name: &str, json: bool) -> Result<()> {
    let meal = or_report(svc.remove_meal(name), json)?;

    if json {
        println!("{}", serde_json::json!({ "removed": meal.name }));
    } else {
        let count = meal.items.len();
        println!("Removed meal '{}' ({count} foods)", meal.name);
    }
    Ok(())
}

pub(crate) fn cmd_meal_add_food(
    svc: &mut Service,
    meal: &str,
    food_query: &str,
    grams: &str,
    json: bool,
) -> Result<()> {
    let grams = reject(parse_grams(grams), json);
    let food = reject(resolve_food(svc.catalog(), food_query), json);
    let (meal, item) = or_report(svc.add_to_meal(meal, &food, grams), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&MealView::from(&meal))?);
    } else {
        let grams = format_grams(item.grams);
        let kcal = item.kcal;
        println!("Added {grams} {} to '{}' — {kcal:.0} kcal", item.food, meal.name);
        println!("  Meal now: {}", format_totals(&meal.totals()));
    }
    Ok(())
}

pub(crate) fn cmd_meal_remove_food(
    svc: &mut Service,
    meal: &str,
    number: usize,
    json: bool,
) -> Result<()> {
    let index = reject(parse_entry_number(number), json);
    let item = or_report(svc.remove_from_meal(meal, index), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let grams = format_grams(item.grams);
        println!("Removed {grams} {} from '{meal}'", item.food);
    }
    Ok(())
}

pub(crate) fn cmd_meal_clear(svc: &mut Service, json: bool) -> Result<()> {
    let count = svc.plan().len();
    or_report(svc.clear_meals(), json)?;

    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else if count == 0 {
        eprintln!("No meals to clear");
    } else {
        println!("Cleared {count} meals. Start again with `macroplan meal add <name>`.");
    }
    Ok(())
}
