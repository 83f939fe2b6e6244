//! Lending rules applied by the rental lifecycle services.

use chrono::TimeDelta;

use super::{DailyRate, LendingError};

/// Loan length, extension limit and late fee rate.
///
/// # Examples
///
/// ```
/// use lending::domain::RentalPolicy;
///
/// let policy = RentalPolicy::default();
/// assert_eq!(policy.default_rental_days(), 14);
/// assert!(policy.extension(3).is_ok());
/// assert!(policy.extension(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPolicy {
    default_rental_days: u32,
    max_extension_days: u32,
    late_fee_per_day: DailyRate,
}

impl RentalPolicy {
    /// Default loan length in days.
    pub const DEFAULT_RENTAL_DAYS: u32 = 14;

    /// Default upper bound for a single extension.
    pub const DEFAULT_MAX_EXTENSION_DAYS: u32 = 7;

    /// Build a policy from explicit values.
    pub fn new(
        default_rental_days: u32,
        max_extension_days: u32,
        late_fee_per_day: DailyRate,
    ) -> Self {
        Self {
            default_rental_days,
            max_extension_days,
            late_fee_per_day,
        }
    }

    /// Days a rental lasts when no due date is supplied.
    pub fn default_rental_days(&self) -> u32 {
        self.default_rental_days
    }

    /// Longest single extension accepted.
    pub fn max_extension_days(&self) -> u32 {
        self.max_extension_days
    }

    /// Fee charged per late day.
    pub fn late_fee_per_day(&self) -> DailyRate {
        self.late_fee_per_day
    }

    /// Loan length applied when no due date is supplied.
    pub fn default_rental_period(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.default_rental_days))
    }

    /// Validate a requested extension, returning it as a duration.
    ///
    /// Accepts `0 < days <= max_extension_days`.
    pub fn extension(&self, days: i64) -> Result<TimeDelta, LendingError> {
        if days <= 0 || days > i64::from(self.max_extension_days) {
            return Err(LendingError::invalid_extension(days, self.max_extension_days));
        }
        Ok(TimeDelta::days(days))
    }
}

impl Default for RentalPolicy {
    fn default() -> Self {
        Self {
            default_rental_days: Self::DEFAULT_RENTAL_DAYS,
            max_extension_days: Self::DEFAULT_MAX_EXTENSION_DAYS,
            late_fee_per_day: DailyRate::ONE_PER_DAY,
        }
    }
}
