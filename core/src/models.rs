use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DietError, Result};

/// A catalog row. All macro values are per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    pub kcal: f64,
    pub protein: f64,
    pub carb: f64,
    pub fat: f64,
}

/// One recorded instance of a food at a given quantity.
///
/// Only built by [`crate::nutrition::compute_line_item`], so the macro fields
/// always match the catalog at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub food: String,
    pub grams: f64,
    pub kcal: f64,
    pub protein: f64,
    pub carb: f64,
    pub fat: f64,
}

impl LineItem {
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals {
            kcal: self.kcal,
            protein: self.protein,
            carb: self.carb,
            fat: self.fat,
        }
    }
}

/// Energy and macro totals. Always derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub kcal: f64,
    pub protein: f64,
    pub carb: f64,
    pub fat: f64,
}

impl Totals {
    #[must_use]
    pub fn new(kcal: f64, protein: f64, carb: f64, fat: f64) -> Self {
        Self {
            kcal,
            protein,
            carb,
            fat,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.kcal == 0.0 && self.protein == 0.0 && self.carb == 0.0 && self.fat == 0.0
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Totals) -> Totals {
        Totals {
            kcal: self.kcal + rhs.kcal,
            protein: self.protein + rhs.protein,
            carb: self.carb + rhs.carb,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Totals) {
        *self = *self + rhs;
    }
}

impl Sub for Totals {
    type Output = Totals;

    fn sub(self, rhs: Totals) -> Totals {
        Totals {
            kcal: self.kcal - rhs.kcal,
            protein: self.protein - rhs.protein,
            carb: self.carb - rhs.carb,
            fat: self.fat - rhs.fat,
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::default(), Add::add)
    }
}

impl<'a> Sum<&'a Totals> for Totals {
    fn sum<I: Iterator<Item = &'a Totals>>(iter: I) -> Totals {
        iter.copied().sum()
    }
}

/// A named group of line items within a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meal {
    pub name: String,
    pub items: Vec<LineItem>,
}

impl Meal {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        crate::nutrition::sum_totals(&self.items)
    }
}

/// Trim a meal name and reject it if nothing is left.
pub fn validate_meal_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DietError::InvalidName(
            "meal name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// The intended daily diet: meals in the order they were added.
///
/// Serialised as a JSON object mapping meal name to its line items, with
/// insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    meals: Vec<Meal>,
}

impl Plan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    #[must_use]
    pub fn meal(&self, name: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.name == name)
    }

    fn meal_mut(&mut self, name: &str) -> Result<&mut Meal> {
        self.meals
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| DietError::InvalidName(format!("no meal named '{name}'")))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meals.len()
    }

    /// Add an empty meal. Names are trimmed and compared case-sensitively.
    pub fn add_meal(&mut self, name: &str) -> Result<&Meal> {
        let name = validate_meal_name(name)?;
        if self.meal(&name).is_some() {
            return Err(DietError::InvalidName(format!(
                "meal '{name}' already exists"
            )));
        }
        self.meals.push(Meal::new(name));
        Ok(&self.meals[self.meals.len() - 1])
    }

    pub fn remove_meal(&mut self, name: &str) -> Result<Meal> {
        let idx = self
            .meals
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| DietError::InvalidName(format!("no meal named '{name}'")))?;
        Ok(self.meals.remove(idx))
    }

    pub fn push_item(&mut self, meal: &str, item: LineItem) -> Result<&Meal> {
        let meal = self.meal_mut(meal)?;
        meal.items.push(item);
        Ok(&*meal)
    }

    pub fn remove_item(&mut self, meal: &str, index: usize) -> Result<LineItem> {
        let meal = self.meal_mut(meal)?;
        take_item(&mut meal.items, index)
    }

    pub fn clear(&mut self) {
        self.meals.clear();
    }

    /// Day-level target: the sum of every meal's sum.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.meals.iter().map(Meal::totals).sum()
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.meals.len()))?;
        for meal in &self.meals {
            map.serialize_entry(&meal.name, &meal.items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PlanVisitor;

        impl<'de> Visitor<'de> for PlanVisitor {
            type Value = Plan;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of meal name to line items")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Plan, A::Error> {
                let mut meals: Vec<Meal> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, items)) = access.next_entry::<String, Vec<LineItem>>()? {
                    // Later duplicates win, matching how a JSON object is usually read.
                    if let Some(existing) = meals.iter_mut().find(|m| m.name == name) {
                        existing.items = items;
                    } else {
                        meals.push(Meal { name, items });
                    }
                }
                Ok(Plan { meals })
            }
        }

        deserializer.deserialize_map(PlanVisitor)
    }
}

/// What was actually eaten on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
}

impl DailyLog {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Result<LineItem> {
        take_item(&mut self.items, index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        crate::nutrition::sum_totals(&self.items)
    }
}

fn take_item(items: &mut Vec<LineItem>, index: usize) -> Result<LineItem> {
    if index >= items.len() {
        return Err(DietError::EntryNotFound {
            index,
            len: items.len(),
        });
    }
    Ok(items.remove(index))
}

/// Target, consumption and remaining amounts for one day.
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub target: Totals,
    pub consumed: Totals,
    /// `None` when no plan is defined; a zero target has nothing to compare against.
    pub delta: Option<Totals>,
    pub entries: usize,
}
