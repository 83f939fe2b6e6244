//! Lending configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors fall back to the domain defaults.
//! Values come from `LENDING_*` environment variables or a configuration
//! file.

use ortho_config::OrthoConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    ConflictRetryPolicy, DEFAULT_RECONCILE_BATCH_SIZE, DailyRate, RateError, RentalPolicy,
};

/// Configured values that cannot form a valid policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The late fee rate is negative.
    #[error("late_fee_per_day: {0}")]
    LateFee(#[from] RateError),
    /// A loan cannot last zero days.
    #[error("default_rental_days must be at least 1")]
    ZeroRentalDays,
}

/// Configuration values controlling lending rules and reconciliation.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LENDING")]
pub struct LendingSettings {
    /// Loan length in days when no due date is supplied.
    pub default_rental_days: Option<u32>,
    /// Longest single extension in days.
    pub max_extension_days: Option<u32>,
    /// Late fee per overdue day.
    pub late_fee_per_day: Option<Decimal>,
    /// Retries after a version or serialization conflict.
    pub max_conflict_retries: Option<u32>,
    /// Rentals read per reconciliation batch.
    pub reconcile_batch_size: Option<usize>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
}

impl LendingSettings {
    /// Build the lending policy, rejecting a negative rate or zero-day loans.
    pub fn rental_policy(&self) -> Result<RentalPolicy, SettingsError> {
        let default_rental_days = self
            .default_rental_days
            .unwrap_or(RentalPolicy::DEFAULT_RENTAL_DAYS);
        if default_rental_days == 0 {
            return Err(SettingsError::ZeroRentalDays);
        }
        let late_fee_per_day = match self.late_fee_per_day {
            Some(amount) => DailyRate::new(amount)?,
            None => DailyRate::ONE_PER_DAY,
        };
        Ok(RentalPolicy::new(
            default_rental_days,
            self.max_extension_days
                .unwrap_or(RentalPolicy::DEFAULT_MAX_EXTENSION_DAYS),
            late_fee_per_day,
        ))
    }

    /// Retry budget for conflicting writes.
    pub fn retry_policy(&self) -> ConflictRetryPolicy {
        self.max_conflict_retries
            .map_or_else(ConflictRetryPolicy::default, ConflictRetryPolicy::new)
    }

    /// Rentals read per reconciliation batch, never zero.
    pub fn reconcile_batch_size(&self) -> usize {
        self.reconcile_batch_size
            .unwrap_or(DEFAULT_RECONCILE_BATCH_SIZE)
            .max(1)
    }

    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for lending configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 6] = [
        "LENDING_DEFAULT_RENTAL_DAYS",
        "LENDING_MAX_EXTENSION_DAYS",
        "LENDING_LATE_FEE_PER_DAY",
        "LENDING_MAX_CONFLICT_RETRIES",
        "LENDING_RECONCILE_BATCH_SIZE",
        "LENDING_DATABASE_URL",
    ];

    fn load_from_empty_args() -> LendingSettings {
        LendingSettings::load_from_iter([OsString::from("lending")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        let policy = settings.rental_policy().expect("default policy");
        assert_eq!(policy, RentalPolicy::default());
        assert_eq!(settings.retry_policy(), ConflictRetryPolicy::default());
        assert_eq!(settings.reconcile_batch_size(), 100);
        assert!(settings.database_url().is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("LENDING_DEFAULT_RENTAL_DAYS", Some("21".to_owned())),
            ("LENDING_MAX_EXTENSION_DAYS", Some("5".to_owned())),
            ("LENDING_LATE_FEE_PER_DAY", Some("2.5".to_owned())),
            ("LENDING_MAX_CONFLICT_RETRIES", Some("6".to_owned())),
            ("LENDING_RECONCILE_BATCH_SIZE", Some("25".to_owned())),
            (
                "LENDING_DATABASE_URL",
                Some("postgres://localhost/lending".to_owned()),
            ),
        ]);

        let settings = load_from_empty_args();
        let policy = settings.rental_policy().expect("valid policy");
        assert_eq!(policy.default_rental_days(), 21);
        assert_eq!(policy.max_extension_days(), 5);
        assert_eq!(policy.late_fee_per_day().amount(), Decimal::new(25, 1));
        assert_eq!(settings.retry_policy().max_retries(), 6);
        assert_eq!(settings.reconcile_batch_size(), 25);
        assert_eq!(settings.database_url(), Some("postgres://localhost/lending"));
    }

    fn unset() -> LendingSettings {
        LendingSettings {
            default_rental_days: None,
            max_extension_days: None,
            late_fee_per_day: None,
            max_conflict_retries: None,
            reconcile_batch_size: None,
            database_url: None,
        }
    }

    #[rstest]
    fn negative_rate_is_rejected() {
        let settings = LendingSettings {
            late_fee_per_day: Some(Decimal::new(-1, 0)),
            ..unset()
        };
        assert!(matches!(
            settings.rental_policy(),
            Err(SettingsError::LateFee(_))
        ));
    }

    #[rstest]
    fn rate_above_the_cap_is_rejected() {
        let amount = Decimal::MAX / Decimal::TWO;
        let settings = LendingSettings {
            late_fee_per_day: Some(amount),
            ..unset()
        };
        assert_eq!(
            settings.rental_policy(),
            Err(SettingsError::LateFee(RateError::TooLarge(amount)))
        );
    }

    #[rstest]
    fn zero_day_loans_are_rejected() {
        let settings = LendingSettings {
            default_rental_days: Some(0),
            ..unset()
        };
        assert_eq!(settings.rental_policy(), Err(SettingsError::ZeroRentalDays));
    }

    #[rstest]
    fn zero_batch_size_is_clamped() {
        let settings = LendingSettings {
            reconcile_batch_size: Some(0),
            ..unset()
        };
        assert_eq!(settings.reconcile_batch_size(), 1);
    }
}
