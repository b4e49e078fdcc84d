//! Administrative operations over recurring availability rules.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::{AvailabilityRule, DayOfWeek, NewAvailabilityRule, UpdateAvailabilityRule};
use crate::repository::RuleRepository;

#[derive(Clone)]
pub struct RuleService {
    repo: Arc<dyn RuleRepository>,
}

impl RuleService {
    pub fn new(repo: Arc<dyn RuleRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_all(&self) -> BookingResult<Vec<AvailabilityRule>> {
        let rules = self.repo.list_rules().await?;
        debug!("Loaded {} availability rules", rules.len());
        Ok(rules)
    }

    pub async fn list_by_weekday(&self, day: DayOfWeek) -> BookingResult<Vec<AvailabilityRule>> {
        Ok(self.repo.list_active_rules(day).await?)
    }

    pub async fn get(&self, id: Uuid) -> BookingResult<AvailabilityRule> {
        self.repo
            .get_rule(id)
            .await?
            .ok_or_else(|| rule_not_found(id))
    }

    pub async fn create(&self, input: NewAvailabilityRule) -> BookingResult<AvailabilityRule> {
        input.validate()?;
        let rule = self.repo.insert_rule(&input).await?;
        info!(
            rule_id = %rule.id,
            day_of_week = %rule.day_of_week,
            "Created availability rule"
        );
        Ok(rule)
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: UpdateAvailabilityRule,
    ) -> BookingResult<AvailabilityRule> {
        let current = self.get(id).await?;
        let merged = changes.apply_to(&current);
        merged.validate()?;

        let saved = self
            .repo
            .save_rule(&merged)
            .await?
            .ok_or_else(|| rule_not_found(id))?;
        info!(rule_id = %id, active = saved.active, "Updated availability rule");
        Ok(saved)
    }

    /// Deleting an unknown id is not an error.
    pub async fn delete(&self, id: Uuid) -> BookingResult<()> {
        self.repo.delete_rule(id).await?;
        info!(rule_id = %id, "Deleted availability rule");
        Ok(())
    }

    pub async fn list_available_weekdays(&self) -> BookingResult<Vec<DayOfWeek>> {
        let mut days = self.repo.list_active_weekdays().await?;
        days.sort();
        days.dedup();
        Ok(days)
    }
}

fn rule_not_found(id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Availability rule with ID {id} not found"))
}
