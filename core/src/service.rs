use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

use crate::catalog::FoodCatalog;
use crate::error::Result;
use crate::models::{DailyLog, DayReport, LineItem, Meal, Plan, Totals};
use crate::nutrition::{self, DEFAULT_MAX_GRAMS};
use crate::store::Store;

/// The single session over a plan and its daily logs.
///
/// Every mutating action loads the current document, applies the change,
/// saves it, and hands back the new state. A failed save is returned to the
/// caller as an error; the change is not kept anywhere else.
pub struct DietService<S: Store> {
    catalog: FoodCatalog,
    store: S,
    max_grams: f64,
}

impl<S: Store> DietService<S> {
    pub fn new(catalog: FoodCatalog, store: S) -> Self {
        Self {
            catalog,
            store,
            max_grams: DEFAULT_MAX_GRAMS,
        }
    }

    #[must_use]
    pub fn with_max_grams(mut self, max_grams: f64) -> Self {
        self.max_grams = max_grams;
        self
    }

    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    pub fn line_item(&self, food: &str, grams: f64) -> Result<LineItem> {
        nutrition::compute_line_item(&self.catalog, food, grams, self.max_grams)
    }

    // --- Plan ---

    /// The saved plan, or an empty one if it cannot be read.
    pub fn plan(&self) -> Plan {
        self.store.load_plan().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load plan; treating it as empty");
            Plan::default()
        })
    }

    /// Load, change, and save the plan. An unreadable plan is an error here,
    /// so a bad document is never overwritten.
    fn update_plan<T>(&mut self, f: impl FnOnce(&mut Plan) -> Result<T>) -> Result<T> {
        let mut plan = self.store.load_plan()?;
        let out = f(&mut plan)?;
        self.store.save_plan(&plan)?;
        Ok(out)
    }

    pub fn add_meal(&mut self, name: &str) -> Result<Meal> {
        let meal = self.update_plan(|plan| plan.add_meal(name).cloned())?;
        tracing::info!(meal = %meal.name, "added meal");
        Ok(meal)
    }

    pub fn remove_meal(&mut self, name: &str) -> Result<Meal> {
        let meal = self.update_plan(|plan| plan.remove_meal(name))?;
        tracing::info!(meal = %meal.name, "removed meal");
        Ok(meal)
    }

    pub fn add_to_meal(&mut self, meal: &str, food: &str, grams: f64) -> Result<(Meal, LineItem)> {
        let item = self.line_item(food, grams)?;
        let meal = self.update_plan(|plan| plan.push_item(meal, item.clone()).cloned())?;
        Ok((meal, item))
    }

    pub fn remove_from_meal(&mut self, meal: &str, index: usize) -> Result<LineItem> {
        let item = self.update_plan(|plan| plan.remove_item(meal, index))?;
        Ok(item)
    }

    pub fn clear_meals(&mut self) -> Result<()> {
        self.update_plan(|plan| {
            plan.clear();
            Ok(())
        })?;
        tracing::info!("cleared all meals");
        Ok(())
    }

    // --- Daily log ---

    /// The saved log for `date`, or an empty one if it cannot be read.
    pub fn log(&self, date: NaiveDate) -> DailyLog {
        self.store.load_log(date).unwrap_or_else(|e| {
            tracing::warn!(%date, error = %e, "could not load log; treating it as empty");
            DailyLog::empty(date)
        })
    }

    fn update_log<T>(
        &mut self,
        date: NaiveDate,
        f: impl FnOnce(&mut DailyLog) -> Result<T>,
    ) -> Result<T> {
        let mut log = self.store.load_log(date)?;
        let out = f(&mut log)?;
        self.store.save_log(&log)?;
        Ok(out)
    }

    pub fn log_food(&mut self, date: NaiveDate, food: &str, grams: f64) -> Result<LineItem> {
        let item = self.line_item(food, grams)?;
        self.update_log(date, |log| {
            log.push(item.clone());
            Ok(())
        })?;
        Ok(item)
    }

    pub fn remove_from_log(&mut self, date: NaiveDate, index: usize) -> Result<LineItem> {
        self.update_log(date, |log| log.remove(index))
    }

    pub fn clear_log(&mut self, date: NaiveDate) -> Result<()> {
        self.update_log(date, |log| {
            log.clear();
            Ok(())
        })?;
        tracing::info!(%date, "cleared log");
        Ok(())
    }

    // --- Reports ---

    /// Compare one day's log against the plan.
    pub fn day_report(&self, date: NaiveDate) -> DayReport {
        report(self.plan().totals(), &self.log(date))
    }

    /// Reports for `days` consecutive days ending at `end`, newest first.
    ///
    /// Only days with a saved log are read; the rest report as empty.
    /// The range stops early at the first date chrono cannot represent.
    pub fn history(&self, end: NaiveDate, days: u32) -> Vec<DayReport> {
        let target = self.plan().totals();
        let logged: Option<BTreeSet<NaiveDate>> = match self.store.list_log_dates() {
            Ok(dates) => Some(dates.into_iter().collect()),
            Err(e) => {
                tracing::warn!(error = %e, "could not list logs; reading every day");
                None
            }
        };
        (0..days)
            .map_while(|i| end.checked_sub_days(Days::new(u64::from(i))))
            .map(|date| match &logged {
                Some(dates) if !dates.contains(&date) => report(target, &DailyLog::empty(date)),
                _ => report(target, &self.log(date)),
            })
            .collect()
    }
}

fn report(target: Totals, log: &DailyLog) -> DayReport {
    let consumed = log.totals();
    DayReport {
        date: log.date,
        target,
        consumed,
        delta: nutrition::target_delta(target, consumed),
        entries: log.items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DietError;
    use crate::models::FoodEntry;
    use crate::store::{JsonFileStore, MemoryStore};

    fn catalog() -> FoodCatalog {
        FoodCatalog::from_entries([
            FoodEntry {
                name: "rice".to_string(),
                kcal: 130.0,
                protein: 2.7,
                carb: 28.0,
                fat: 0.3,
            },
            FoodEntry {
                name: "chicken".to_string(),
                kcal: 165.0,
                protein: 31.0,
                carb: 0.0,
                fat: 3.6,
            },
        ])
    }

    fn service() -> DietService<MemoryStore> {
        DietService::new(catalog(), MemoryStore::new())
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_fresh_plan_is_empty() {
        let svc = service();
        let plan = svc.plan();
        assert!(plan.is_empty());
        assert!(plan.totals().is_zero());
    }

    #[test]
    fn test_add_meal_and_items_persist() {
        let mut svc = service();
        let meal = svc.add_meal("  Lunch ").unwrap();
        assert_eq!(meal.name, "Lunch");

        let (meal, item) = svc.add_to_meal("Lunch", "rice", 200.0).unwrap();
        assert_eq!(item.kcal, 260.0);
        assert_eq!(meal.items.len(), 1);
        svc.add_to_meal("Lunch", "chicken", 100.0).unwrap();

        let totals = svc.plan().meal("Lunch").unwrap().totals();
        assert!((totals.kcal - 425.0).abs() < 1e-9);
        assert!((totals.protein - 36.4).abs() < 1e-9);
        assert!((totals.carb - 56.0).abs() < 1e-9);
        assert!((totals.fat - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_add_meal_errors() {
        let mut svc = service();
        svc.add_meal("Lunch").unwrap();
        assert!(matches!(svc.add_meal("Lunch"), Err(DietError::InvalidName(_))));
        assert!(matches!(svc.add_meal(" "), Err(DietError::InvalidName(_))));
        assert!(matches!(
            svc.add_to_meal("Dinner", "rice", 100.0),
            Err(DietError::InvalidName(_))
        ));
        assert!(matches!(
            svc.add_to_meal("Lunch", "pizza", 100.0),
            Err(DietError::UnknownFood(_))
        ));
        assert!(matches!(
            svc.add_to_meal("Lunch", "rice", 0.0),
            Err(DietError::InvalidQuantity { .. })
        ));
        assert!(svc.plan().meal("Lunch").unwrap().items.is_empty());
    }

    #[test]
    fn test_max_grams_configurable() {
        let mut svc = service().with_max_grams(1000.0);
        assert!(matches!(
            svc.log_food(day(), "rice", 1500.0),
            Err(DietError::InvalidQuantity { max, .. }) if max == 1000.0
        ));
        assert!(svc.log_food(day(), "rice", 1000.0).is_ok());
    }

    #[test]
    fn test_remove_and_clear_meals() {
        let mut svc = service();
        svc.add_meal("Breakfast").unwrap();
        svc.add_meal("Lunch").unwrap();
        svc.add_to_meal("Lunch", "rice", 100.0).unwrap();
        svc.add_to_meal("Lunch", "chicken", 100.0).unwrap();

        let removed = svc.remove_from_meal("Lunch", 0).unwrap();
        assert_eq!(removed.food, "rice");
        assert_eq!(svc.plan().meal("Lunch").unwrap().items[0].food, "chicken");

        svc.remove_meal("Breakfast").unwrap();
        assert_eq!(svc.plan().len(), 1);

        svc.clear_meals().unwrap();
        assert!(svc.plan().is_empty());
    }

    #[test]
    fn test_log_food_and_clear() {
        let mut svc = service();
        svc.log_food(day(), "rice", 200.0).unwrap();
        svc.log_food(day(), "chicken", 100.0).unwrap();
        assert_eq!(svc.log(day()).items.len(), 2);
        assert!(svc.log(day().succ_opt().unwrap()).is_empty());

        assert_eq!(svc.remove_from_log(day(), 1).unwrap().food, "chicken");
        assert!(matches!(
            svc.remove_from_log(day(), 3),
            Err(DietError::EntryNotFound { .. })
        ));

        svc.clear_log(day()).unwrap();
        assert!(svc.log(day()).is_empty());
    }

    #[test]
    fn test_day_report_without_plan_has_no_delta() {
        let mut svc = service();
        svc.log_food(day(), "rice", 200.0).unwrap();
        let report = svc.day_report(day());
        assert!(report.target.is_zero());
        assert_eq!(report.consumed.kcal, 260.0);
        assert!(report.delta.is_none());
        assert_eq!(report.entries, 1);
    }

    #[test]
    fn test_day_report_over_target_is_negative() {
        let mut svc = service();
        svc.add_meal("Lunch").unwrap();
        svc.add_to_meal("Lunch", "rice", 100.0).unwrap();
        svc.log_food(day(), "rice", 300.0).unwrap();

        let delta = svc.day_report(day()).delta.unwrap();
        assert!((delta.kcal + 260.0).abs() < 1e-9);
        assert!(delta.protein < 0.0);
    }

    #[test]
    fn test_day_report_target_met() {
        let mut svc = service();
        svc.add_meal("Lunch").unwrap();
        svc.add_to_meal("Lunch", "rice", 200.0).unwrap();
        svc.add_to_meal("Lunch", "chicken", 100.0).unwrap();
        svc.log_food(day(), "rice", 200.0).unwrap();
        svc.log_food(day(), "chicken", 100.0).unwrap();
        assert!(svc.day_report(day()).delta.unwrap().is_zero());
    }

    #[test]
    fn test_history() {
        let mut svc = service();
        let yesterday = day().pred_opt().unwrap();
        svc.log_food(yesterday, "rice", 100.0).unwrap();
        let reports = svc.history(day(), 3);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].date, day());
        assert_eq!(reports[1].date, yesterday);
        assert_eq!(reports[1].consumed.kcal, 130.0);
        assert!(reports[2].consumed.is_zero());
        assert_eq!(reports[2].entries, 0);
    }

    #[test]
    fn test_history_stops_at_earliest_date() {
        let svc = service();
        let reports = svc.history(NaiveDate::MIN, 5);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].date, NaiveDate::MIN);

        let near_min = NaiveDate::MIN + chrono::Duration::days(2);
        assert_eq!(svc.history(near_min, u32::MAX).len(), 3);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let mut svc = DietService::new(catalog(), JsonFileStore::new(&blocker));

        let err = svc.log_food(day(), "rice", 100.0).unwrap_err();
        assert!(err.is_storage());
        let err = svc.add_meal("Lunch").unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_unreadable_plan_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.json"), "[oops").unwrap();
        let svc = DietService::new(catalog(), JsonFileStore::new(dir.path()));
        assert!(svc.plan().is_empty());
        assert!(svc.day_report(day()).delta.is_none());
    }

    #[test]
    fn test_unreadable_plan_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let broken = r#"{"Breakfast": [], "Lunch": [], "Dinner": [],}"#;
        std::fs::write(&path, broken).unwrap();
        let mut svc = DietService::new(catalog(), JsonFileStore::new(dir.path()));

        assert!(svc.add_meal("Snack").unwrap_err().is_storage());
        assert!(svc.add_to_meal("Lunch", "rice", 100.0).unwrap_err().is_storage());
        assert!(svc.remove_meal("Lunch").unwrap_err().is_storage());
        assert!(svc.clear_meals().unwrap_err().is_storage());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_unreadable_log_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("logs")).unwrap();
        let path = dir.path().join("logs").join("2024-06-15.json");
        let broken = r#"[{"food": "rice", "grams": 100"#;
        std::fs::write(&path, broken).unwrap();
        let mut svc = DietService::new(catalog(), JsonFileStore::new(dir.path()));

        assert!(svc.log(day()).is_empty());
        assert!(svc.log_food(day(), "rice", 100.0).unwrap_err().is_storage());
        assert!(svc.remove_from_log(day(), 0).unwrap_err().is_storage());
        assert!(svc.clear_log(day()).unwrap_err().is_storage());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }
}
