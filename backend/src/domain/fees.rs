//! Late fee calculation.
//!
//! Fees are derived on demand and never stored. Amounts use fixed-point
//! [`Decimal`] arithmetic.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Rental;

/// Validation error for [`DailyRate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The amount is below zero.
    Negative(Decimal),
    /// The amount exceeds [`DailyRate::MAX_AMOUNT`].
    TooLarge(Decimal),
}

impl fmt::Display for RateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative(amount) => {
                write!(f, "late fee rate must not be negative (got {amount})")
            }
            Self::TooLarge(amount) => write!(
                f,
                "late fee rate must not exceed {} (got {amount})",
                DailyRate::MAX_AMOUNT
            ),
        }
    }
}

impl std::error::Error for RateError {}

/// Late fee charged per overdue day.
///
/// Bounded so that a fee over any representable number of late days fits in
/// a [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DailyRate(Decimal);

impl DailyRate {
    /// One currency unit per day.
    pub const ONE_PER_DAY: Self = Self(Decimal::ONE);

    /// Largest accepted per-day amount.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

    /// Validate a per-day amount between zero and [`Self::MAX_AMOUNT`].
    pub fn new(amount: Decimal) -> Result<Self, RateError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(RateError::Negative(amount));
        }
        if amount > Self::MAX_AMOUNT {
            return Err(RateError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Returns the per-day amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for DailyRate {
    type Error = RateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DailyRate> for Decimal {
    fn from(value: DailyRate) -> Self {
        value.0
    }
}

/// Fee owed for a rental at a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LateFee {
    late_days: u32,
    amount: Decimal,
}

impl LateFee {
    /// A fee of zero for a rental that was not late.
    pub const NONE: Self = Self {
        late_days: 0,
        amount: Decimal::ZERO,
    };

    /// Whole days charged.
    pub fn late_days(&self) -> u32 {
        self.late_days
    }

    /// Amount owed.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Whether anything is owed.
    pub fn is_chargeable(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Reference instant for fee calculation: the return date once set, else
/// `now`.
pub fn fee_reference_time(rental: &Rental, now: DateTime<Utc>) -> DateTime<Utc> {
    rental.return_date().unwrap_or(now)
}

/// Whether the rental was past due at its fee reference time.
///
/// For a returned rental the return date proves the copy was still out up to
/// that instant, so only the dates are compared.
pub fn was_late(rental: &Rental, now: DateTime<Utc>) -> bool {
    match rental.return_date() {
        Some(returned_at) => rental.due_date() < returned_at,
        None => rental.is_overdue(now),
    }
}

/// Whole days charged: `max(1, floor(hours late / 24))`, or zero when the
/// rental was not late.
pub fn late_days(rental: &Rental, now: DateTime<Utc>) -> u32 {
    if !was_late(rental, now) {
        return 0;
    }
    let elapsed = fee_reference_time(rental, now) - rental.due_date();
    let whole_days = u32::try_from(elapsed.num_days()).unwrap_or(u32::MAX);
    whole_days.max(1)
}

/// Late fee for `rental` at `now` with `rate` per day.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use lending::domain::{fees, BookId, DailyRate, Rental, RentalId, UserId};
/// use rust_decimal::Decimal;
///
/// let day0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid date");
/// let rental = Rental::open(
///     RentalId::random(),
///     BookId::random(),
///     UserId::random(),
///     day0,
///     day0 + Duration::days(5),
/// )?
/// .returned_at(day0 + Duration::days(7))?;
/// let rate = DailyRate::new(Decimal::new(200, 2))?;
///
/// let fee = fees::late_fee(&rental, day0 + Duration::days(30), rate);
/// assert_eq!(fee.late_days(), 2);
/// assert_eq!(fee.amount(), Decimal::new(400, 2));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn late_fee(rental: &Rental, now: DateTime<Utc>, rate: DailyRate) -> LateFee {
    let late_days = late_days(rental, now);
    if late_days == 0 {
        return LateFee::NONE;
    }
    LateFee {
        late_days,
        amount: rate.amount() * Decimal::from(late_days),
    }
}

#[cfg(test)]
mod tests {
    //! Fee arithmetic coverage.

    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{BookId, RentalId, UserId};

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    #[fixture]
    fn rate() -> DailyRate {
        DailyRate::new(Decimal::new(200, 2)).expect("valid rate")
    }

    #[fixture]
    fn rental() -> Rental {
        Rental::open(
            RentalId::random(),
            BookId::random(),
            UserId::random(),
            day0(),
            day0() + Duration::days(5),
        )
        .expect("valid rental")
    }

    #[rstest]
    fn returned_two_days_late_costs_two_days(rental: Rental, rate: DailyRate) {
        let returned = rental
            .returned_at(day0() + Duration::days(7))
            .expect("return succeeds");
        let fee = late_fee(&returned, day0() + Duration::days(40), rate);
        assert_eq!(fee.late_days(), 2);
        assert_eq!(fee.amount(), Decimal::new(400, 2));
    }

    #[rstest]
    fn minutes_late_costs_one_day(rental: Rental, rate: DailyRate) {
        let returned = rental
            .returned_at(day0() + Duration::days(5) + Duration::minutes(3))
            .expect("return succeeds");
        let fee = late_fee(&returned, day0(), rate);
        assert_eq!(fee.late_days(), 1);
        assert_eq!(fee.amount(), rate.amount());
    }

    #[rstest]
    #[case(Duration::days(5))]
    #[case(Duration::days(2))]
    fn on_time_return_is_free(rental: Rental, rate: DailyRate, #[case] after: Duration) {
        let returned = rental
            .returned_at(day0() + after)
            .expect("return succeeds");
        assert_eq!(late_fee(&returned, day0() + Duration::days(90), rate), LateFee::NONE);
    }

    #[rstest]
    fn open_rental_accrues_against_now(rental: Rental, rate: DailyRate) {
        let now = day0() + Duration::days(8) + Duration::hours(23);
        let fee = late_fee(&rental, now, rate);
        assert_eq!(fee.late_days(), 3);
        assert!(fee.is_chargeable());
    }

    #[rstest]
    fn open_rental_before_due_date_accrues_nothing(rental: Rental, rate: DailyRate) {
        assert!(!late_fee(&rental, day0() + Duration::days(1), rate).is_chargeable());
    }

    #[rstest]
    fn zero_rate_is_never_chargeable(rental: Rental) {
        let free = DailyRate::new(Decimal::ZERO).expect("zero rate");
        let fee = late_fee(&rental, day0() + Duration::days(9), free);
        assert_eq!(fee.late_days(), 4);
        assert!(!fee.is_chargeable());
    }

    #[rstest]
    fn negative_rate_is_rejected() {
        assert!(matches!(
            DailyRate::new(Decimal::new(-1, 2)),
            Err(RateError::Negative(_))
        ));
    }

    #[rstest]
    #[case(Decimal::MAX / Decimal::TWO)]
    #[case(DailyRate::MAX_AMOUNT + Decimal::new(1, 2))]
    fn oversized_rate_is_rejected(#[case] amount: Decimal) {
        assert_eq!(DailyRate::new(amount), Err(RateError::TooLarge(amount)));
    }

    #[rstest]
    fn largest_rate_over_the_longest_delay_does_not_overflow(rental: Rental) {
        let rate = DailyRate::new(DailyRate::MAX_AMOUNT).expect("largest rate");
        let fee = late_fee(&rental, DateTime::<Utc>::MAX_UTC, rate);
        assert!(fee.late_days() > 1_000_000);
        assert_eq!(
            fee.amount(),
            DailyRate::MAX_AMOUNT * Decimal::from(fee.late_days())
        );
    }

    #[rstest]
    fn oversized_rate_is_rejected_when_deserialized() {
        let err = serde_json::from_str::<DailyRate>("\"2000000\"")
            .expect_err("rate above the cap");
        assert!(err.to_string().contains("must not exceed"));
    }
}
