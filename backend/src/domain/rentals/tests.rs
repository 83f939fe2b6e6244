//! Lifecycle coverage for the rental aggregate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{BookId, UserId};

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
        + Duration::days(n)
}

#[fixture]
fn active() -> Rental {
    Rental::open(
        RentalId::random(),
        BookId::random(),
        UserId::random(),
        day(0),
        day(5),
    )
    .expect("valid rental")
}

#[rstest]
fn open_rejects_due_before_rental_date() {
    let err = Rental::open(
        RentalId::random(),
        BookId::random(),
        UserId::random(),
        day(3),
        day(2),
    )
    .expect_err("due date precedes rental date");
    assert!(matches!(
        err,
        RentalValidationError::DueBeforeRentalDate { .. }
    ));
}

#[rstest]
fn due_date_equal_to_rental_date_is_accepted() {
    let rental = Rental::open(
        RentalId::random(),
        BookId::random(),
        UserId::random(),
        day(1),
        day(1),
    )
    .expect("same-day rental");
    assert_eq!(rental.version(), 0);
}

#[rstest]
#[case(RentalStatus::Returned, None, false)]
#[case(RentalStatus::Active, Some(day(2)), false)]
#[case(RentalStatus::Overdue, Some(day(2)), false)]
#[case(RentalStatus::Returned, Some(day(2)), true)]
#[case(RentalStatus::Overdue, None, true)]
fn return_date_is_set_iff_returned(
    #[case] status: RentalStatus,
    #[case] return_date: Option<DateTime<Utc>>,
    #[case] valid: bool,
) {
    let result = Rental::new(RentalDraft {
        id: RentalId::random(),
        book_id: BookId::random(),
        user_id: UserId::random(),
        rental_date: day(0),
        due_date: day(5),
        return_date,
        status,
        version: 3,
    });
    assert_eq!(result.is_ok(), valid, "{result:?}");
}

#[rstest]
#[case(day(5), false)]
#[case(day(5) + Duration::seconds(1), true)]
#[case(day(4), false)]
fn overdue_requires_due_date_strictly_before_now(
    active: Rental,
    #[case] now: DateTime<Utc>,
    #[case] expected: bool,
) {
    assert_eq!(active.is_overdue(now), expected);
}

#[rstest]
fn returned_rental_is_never_overdue(active: Rental) {
    let returned = active.returned_at(day(9)).expect("return succeeds");
    assert!(!returned.is_overdue(day(30)));
}

#[rstest]
fn return_sets_date_status_and_version(active: Rental) {
    let returned = active.returned_at(day(7)).expect("return succeeds");
    assert_eq!(returned.status(), RentalStatus::Returned);
    assert_eq!(returned.return_date(), Some(day(7)));
    assert_eq!(returned.version(), active.version() + 1);
}

#[rstest]
fn return_is_accepted_from_overdue(active: Rental) {
    let overdue = active.marked_overdue(day(6)).expect("past due");
    let returned = overdue.returned_at(day(7)).expect("return succeeds");
    assert_eq!(returned.status(), RentalStatus::Returned);
}

#[rstest]
fn second_return_is_rejected(active: Rental) {
    let returned = active.returned_at(day(7)).expect("return succeeds");
    let err = returned.returned_at(day(8)).expect_err("already returned");
    assert_eq!(
        err,
        RentalTransitionError::NotActive {
            rental_id: active.id(),
            status: RentalStatus::Returned,
        }
    );
}

#[rstest]
fn marking_overdue_is_idempotent(active: Rental) {
    assert!(active.marked_overdue(day(5)).is_none());
    let overdue = active.marked_overdue(day(6)).expect("past due");
    assert_eq!(overdue.status(), RentalStatus::Overdue);
    assert!(overdue.marked_overdue(day(10)).is_none());
}

#[rstest]
fn returned_rental_is_never_marked_overdue(active: Rental) {
    let returned = active.returned_at(day(3)).expect("return succeeds");
    assert!(returned.marked_overdue(day(30)).is_none());
}

#[rstest]
fn extension_moves_due_date_forward(active: Rental) {
    let extended = active
        .extended_by(Duration::days(3), day(1))
        .expect("extension succeeds");
    assert_eq!(extended.due_date(), day(8));
    assert_eq!(extended.status(), RentalStatus::Active);
    assert_eq!(extended.version(), 1);
}

#[rstest]
fn extending_overdue_rental_past_now_clears_overdue(active: Rental) {
    let overdue = active.marked_overdue(day(6)).expect("past due");
    let extended = overdue
        .extended_by(Duration::days(3), day(6))
        .expect("extension succeeds");
    assert_eq!(extended.status(), RentalStatus::Active);
    assert!(!extended.is_overdue(day(6)));
}

#[rstest]
fn extending_overdue_rental_still_past_due_keeps_overdue(active: Rental) {
    let overdue = active.marked_overdue(day(20)).expect("past due");
    let extended = overdue
        .extended_by(Duration::days(2), day(20))
        .expect("extension succeeds");
    assert_eq!(extended.status(), RentalStatus::Overdue);
}

#[rstest]
fn extending_returned_rental_is_rejected(active: Rental) {
    let returned = active.returned_at(day(2)).expect("return succeeds");
    let err = returned
        .extended_by(Duration::days(1), day(2))
        .expect_err("returned rentals cannot be extended");
    assert!(matches!(err, RentalTransitionError::NotActive { .. }));
}

#[rstest]
#[case("active", RentalStatus::Active)]
#[case("returned", RentalStatus::Returned)]
#[case("overdue", RentalStatus::Overdue)]
fn status_round_trips_through_storage_text(#[case] raw: &str, #[case] status: RentalStatus) {
    assert_eq!(raw.parse::<RentalStatus>(), Ok(status));
    assert_eq!(status.as_str(), raw);
}

#[rstest]
fn unknown_status_text_is_rejected() {
    assert!("lost".parse::<RentalStatus>().is_err());
}
