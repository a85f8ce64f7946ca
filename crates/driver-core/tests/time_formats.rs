use chrono::{Duration, NaiveDate};
use driver_core::time::{
    duration_from_seconds, format_clock_duration, format_duration, format_timestamp,
    offset_timestamp, parse_duration, parse_timestamp,
};
use driver_core::DriverError;
use proptest::prelude::*;

#[test]
fn durations_use_total_hours() {
    assert_eq!(format_duration(&Duration::minutes(6)), "00:06:00.0");
    assert_eq!(format_duration(&Duration::days(12)), "288:00:00.0");
    assert_eq!(format_duration(&Duration::milliseconds(1500)), "00:00:01.5");
    assert_eq!(format_duration(&Duration::seconds(-90)), "-00:01:30.0");
}

#[test]
fn clock_durations_round_seconds() {
    assert_eq!(format_clock_duration(&Duration::milliseconds(5_999_600)), "01:40:00");
    assert_eq!(format_clock_duration(&Duration::hours(6)), "06:00:00");
}

#[test]
fn duration_text_forms() {
    assert_eq!(parse_duration("06:00:00").expect("clock"), Duration::hours(6));
    assert_eq!(parse_duration("1:00:00:00").expect("days"), Duration::days(1));
    assert_eq!(parse_duration("3600").expect("seconds"), Duration::hours(1));
    assert_eq!(parse_duration("0.5").expect("fraction"), Duration::milliseconds(500));
    let err = parse_duration("six hours").unwrap_err();
    assert!(matches!(err, DriverError::TypeCoercion(_)));
    assert_eq!(err.info().code, "invalid_duration");
}

#[test]
fn timestamps_accept_common_separators() {
    let expected = NaiveDate::from_ymd_opt(2008, 8, 23)
        .and_then(|date| date.and_hms_opt(6, 0, 0))
        .expect("date");
    assert_eq!(parse_timestamp("2008-08-23 06:00:00").expect("space"), expected);
    assert_eq!(parse_timestamp("2008-08-23T06:00:00").expect("iso"), expected);
    assert_eq!(parse_timestamp("2008-08-23T06:00").expect("minutes"), expected);
    assert_eq!(format_timestamp(&expected), "2008-08-23 06:00:00");
    let midnight = parse_timestamp("2008-08-23").expect("date only");
    assert_eq!(format_timestamp(&midnight), "2008-08-23 00:00:00");
    assert!(parse_timestamp("yesterday").is_err());
}

#[test]
fn out_of_range_durations_are_rejected() {
    for text in ["1e30", "-1e30", "99999999999999999999", "inf", "NaN"] {
        let err = parse_duration(text).unwrap_err();
        assert!(matches!(err, DriverError::TypeCoercion(_)), "{text}");
        assert_eq!(err.info().code, "invalid_duration");
    }
    assert_eq!(duration_from_seconds(f64::INFINITY), None);
    assert_eq!(duration_from_seconds(1e300), None);
    assert_eq!(duration_from_seconds(-1.5), Some(Duration::milliseconds(-1500)));
}

#[test]
fn timestamps_shifted_out_of_the_calendar_are_errors() {
    let start = NaiveDate::from_ymd_opt(2008, 8, 23)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("date");
    assert_eq!(
        offset_timestamp(start, -Duration::days(12), "tidal_spinup_duration").expect("shift"),
        NaiveDate::from_ymd_opt(2008, 8, 11)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("date")
    );
    let err = offset_timestamp(start, Duration::seconds(9_000_000_000_000), "modeled_duration")
        .unwrap_err();
    assert!(matches!(err, DriverError::TypeCoercion(_)));
    assert_eq!(err.info().code, "timestamp_out_of_range");
    assert_eq!(err.info().context["field"], "modeled_duration");
}

proptest! {
    #[test]
    fn formatted_durations_parse_back(micros in -10_000_000_000_000i64..10_000_000_000_000i64) {
        let duration = Duration::microseconds(micros);
        let text = format_duration(&duration);
        prop_assert_eq!(parse_duration(&text).expect("parse"), duration);
    }
}
