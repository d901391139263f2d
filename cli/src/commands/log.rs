use anyhow::Result;

use super::helpers::{
    format_delta, format_grams, parse_date, parse_entry_number, parse_grams, resolve_food,
};
use super::{Service, or_report, reject};

pub(crate) fn cmd_log_add(
    svc: &mut Service,
    food_query: &str,
    grams: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let grams = reject(parse_grams(grams), json);
    let date = reject(parse_date(date), json);
    let food = reject(resolve_food(svc.catalog(), food_query), json);
    let item = or_report(svc.log_food(date, &food, grams), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    let grams = format_grams(item.grams);
    let kcal = item.kcal;
    println!("Logged: {grams} {} on {date} — {kcal:.0} kcal", item.food);
    if let Some(delta) = svc.day_report(date).delta {
        println!("  Versus plan: {}", format_delta(&delta));
    }
    Ok(())
}

pub(crate) fn cmd_log_remove(
    svc: &mut Service,
    number: usize,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let index = reject(parse_entry_number(number), json);
    let date = reject(parse_date(date), json);
    let item = or_report(svc.remove_from_log(date, index), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let grams = format_grams(item.grams);
        println!("Removed {grams} {} from {date}", item.food);
    }
    Ok(())
}

pub(crate) fn cmd_log_clear(svc: &mut Service, date: Option<String>, json: bool) -> Result<()> {
    let date = reject(parse_date(date), json);
    let count = svc.log(date).items.len();
    or_report(svc.clear_log(date), json)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "date": date.to_string(), "cleared": count })
        );
    } else if count == 0 {
        eprintln!("Nothing logged on {date}");
    } else {
        println!("Cleared {count} entries from {date}");
    }
    Ok(())
}
