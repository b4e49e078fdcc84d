use chrono::{NaiveTime, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{from_str, json, to_value};
use slotbook_core::errors::BookingError;
use slotbook_core::models::{
    AvailabilityRule, DayOfWeek, NewAvailabilityRule, Period, ReservationStatus,
    UpdateAvailabilityRule,
};
use uuid::Uuid;

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn morning_rule() -> AvailabilityRule {
    AvailabilityRule {
        id: Uuid::new_v4(),
        day_of_week: DayOfWeek::MONDAY,
        period: Period::Morning,
        start_time: hm(8, 0),
        end_time: hm(12, 0),
        step_minutes: 30,
        active: true,
        created_at: Utc::now(),
    }
}

#[test]
fn test_new_rule_deserialization() {
    let input: NewAvailabilityRule = from_str(
        r#"{"day_of_week": 1, "period": "manha", "start_time": "08:00", "end_time": "09:30:00", "step_minutes": 30}"#,
    )
    .unwrap();

    assert_eq!(input.day_of_week, DayOfWeek::MONDAY);
    assert_eq!(input.period, Period::Morning);
    assert_eq!(input.start_time, hm(8, 0));
    assert_eq!(input.end_time, hm(9, 30));
    assert!(input.active);
}

#[test]
fn test_rule_serializes_times_as_hh_mm() {
    let rule = morning_rule();
    let value = to_value(&rule).unwrap();

    assert_eq!(value["start_time"], json!("08:00"));
    assert_eq!(value["end_time"], json!("12:00"));
    assert_eq!(value["period"], json!("morning"));
    assert_eq!(value["day_of_week"], json!(1));
}

#[test]
fn test_day_of_week_out_of_range_is_rejected() {
    assert!(from_str::<DayOfWeek>("7").is_err());
    assert!(matches!(DayOfWeek::new(9), Err(BookingError::Validation(_))));
    assert_eq!(DayOfWeek::new(0).unwrap(), DayOfWeek::SUNDAY);
}

#[rstest]
#[case(hm(9, 0), hm(8, 0), 30)]
#[case(hm(8, 0), hm(8, 0), 30)]
#[case(hm(8, 0), hm(9, 0), 0)]
#[case(hm(8, 0), hm(9, 0), -5)]
fn test_invalid_windows_are_rejected(
    #[case] start: NaiveTime,
    #[case] end: NaiveTime,
    #[case] step: i32,
) {
    let input = NewAvailabilityRule {
        day_of_week: DayOfWeek::MONDAY,
        period: Period::Morning,
        start_time: start,
        end_time: end,
        step_minutes: step,
        active: true,
    };
    assert!(matches!(input.validate(), Err(BookingError::Validation(_))));
}

#[test]
fn test_partial_update_keeps_unset_fields() {
    let rule = morning_rule();
    let changes: UpdateAvailabilityRule = from_str(r#"{"active": false, "end_time": "10:00"}"#).unwrap();
    let merged = changes.apply_to(&rule);

    assert_eq!(merged.id, rule.id);
    assert_eq!(merged.start_time, rule.start_time);
    assert_eq!(merged.end_time, hm(10, 0));
    assert!(!merged.active);
    assert_eq!(merged.created_at, rule.created_at);
}

#[test]
fn test_merged_update_is_revalidated() {
    let rule = morning_rule();
    let changes = UpdateAvailabilityRule {
        start_time: Some(hm(13, 0)),
        ..Default::default()
    };
    assert!(changes.apply_to(&rule).validate().is_err());
}

#[rstest]
#[case("Reservado", ReservationStatus::Confirmed)]
#[case("confirmado", ReservationStatus::Confirmed)]
#[case("pendente", ReservationStatus::Pending)]
#[case("cancelado", ReservationStatus::Cancelled)]
#[case("confirmed", ReservationStatus::Confirmed)]
fn test_reservation_status_labels(#[case] raw: &str, #[case] expected: ReservationStatus) {
    assert_eq!(raw.parse::<ReservationStatus>().unwrap(), expected);
}

#[rstest]
#[case(hm(0, 0), Period::Morning)]
#[case(hm(11, 59), Period::Morning)]
#[case(hm(12, 0), Period::Afternoon)]
#[case(hm(17, 30), Period::Afternoon)]
fn test_period_of_local_time(#[case] time: NaiveTime, #[case] expected: Period) {
    assert_eq!(Period::of(time), expected);
}
