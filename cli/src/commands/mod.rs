mod food;
mod helpers;
mod log;
mod meal;
mod summary;

use anyhow::Result;
use std::fmt::Display;
use std::process;

use macroplan_core::error::DietError;
use macroplan_core::service::DietService;
use macroplan_core::store::JsonFileStore;

use helpers::{json_error, rejection};

pub(crate) use food::cmd_food_list;
pub(crate) use log::{cmd_log_add, cmd_log_clear, cmd_log_remove};
pub(crate) use meal::{
    cmd_meal_add, cmd_meal_add_food, cmd_meal_clear, cmd_meal_remove, cmd_meal_remove_food,
    cmd_plan_show,
};
pub(crate) use summary::{cmd_history, cmd_log_show};

pub(crate) type Service = DietService<JsonFileStore>;

/// Print a rejected input or action and exit 2.
pub(super) fn reject<T, E: Display>(result: Result<T, E>, json: bool) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            let line = rejection(&format!("{e:#}"), json);
            if json {
                println!("{line}");
            } else {
                eprintln!("{line}");
            }
            process::exit(2);
        }
    }
}

/// Report a rejected action and exit 2; storage failures exit 1.
pub(super) fn or_report<T>(result: Result<T, DietError>, json: bool) -> Result<T> {
    match result {
        Err(e) if e.is_storage() => {
            let err = anyhow::Error::new(e).context("The change was not saved");
            if json {
                println!("{}", json_error(&format!("{err:#}")));
                process::exit(1);
            }
            Err(err)
        }
        other => Ok(reject(other, json)),
    }
}
