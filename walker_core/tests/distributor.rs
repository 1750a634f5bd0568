use std::time::{Duration, Instant};

use proptest::prelude::*;
use rstest::rstest;
use walker_core::WalkerError;
use walker_core::distributor::MotorDistributor;
use walker_core::mocks::{FailingLink, NullLink, RecordingLink};

fn fresh() -> MotorDistributor<NullLink> {
    let mut d = MotorDistributor::with_guard(NullLink, Duration::ZERO);
    d.reset();
    d
}

#[test]
fn documented_frame_layout() {
    let mut d = fresh();
    d.set_pic_addr(2).unwrap();
    d.set_servo_addr(1).unwrap();
    d.set_mode(0).unwrap();
    d.set_servo_val(200).unwrap();
    let b0 = 0x80 | (2 << 5) | (1 << 3) | (0 << 1) | ((200 >> 7) & 1);
    assert_eq!(d.data(), [b0, 200 & 0x7f]);
    assert_eq!(d.data(), [0xc9, 0x48]);
}

#[rstest]
#[case::pic("pic", 4)]
#[case::servo("servo", 5)]
#[case::mode("mode", -1)]
#[case::value("value", 256)]
fn out_of_domain_leaves_buffer_untouched(#[case] field: &str, #[case] value: i64) {
    let mut d = fresh();
    d.set_pic_addr(1).unwrap();
    d.set_servo_val(77).unwrap();
    let before = d.data();
    let err = match field {
        "pic" => d.set_pic_addr(value),
        "servo" => d.set_servo_addr(value),
        "mode" => d.set_mode(value),
        _ => d.set_servo_val(value),
    }
    .unwrap_err();
    assert!(matches!(err, WalkerError::Range { value: v, .. } if v == value));
    assert_eq!(d.data(), before);
}

#[test]
fn setters_accumulate_without_reset() {
    let mut d = fresh();
    d.set_pic_addr(1).unwrap();
    d.set_pic_addr(2).unwrap();
    // 01 | 10 = 11: the caller must reset between frames.
    assert_eq!(d.data()[0], 0x80 | (3 << 5));
}

#[test]
fn send_writes_both_bytes_in_order() {
    let link = RecordingLink::new();
    let bytes = link.bytes();
    let mut d = MotorDistributor::with_guard(link, Duration::ZERO);
    d.reset();
    d.set_pic_addr(3).unwrap();
    d.set_servo_val(129).unwrap();
    d.send().unwrap();
    assert_eq!(*bytes.lock().unwrap(), vec![0x80 | (3 << 5) | 1, 1]);
}

#[test]
fn guard_delay_follows_each_byte() {
    let guard = Duration::from_micros(300);
    let mut d = MotorDistributor::with_guard(NullLink, guard);
    d.reset();
    let start = Instant::now();
    d.send().unwrap();
    assert!(start.elapsed() >= guard * 2);
}

#[test]
fn link_failure_is_typed() {
    let mut d = MotorDistributor::with_guard(FailingLink, Duration::ZERO);
    d.reset();
    assert_eq!(d.send(), Err(WalkerError::Io("link down".into())));
}

#[test]
fn command_with_bad_value_sends_nothing() {
    let link = RecordingLink::new();
    let bytes = link.bytes();
    let mut d = MotorDistributor::with_guard(link, Duration::ZERO);
    assert!(d.command(1, 0, 0, 300).is_err());
    assert!(bytes.lock().unwrap().is_empty());
}

proptest! {
    #[test]
    fn fields_round_trip_through_bits(pic in 0i64..=3, servo in 0i64..=3, mode in 0i64..=3, val in 0i64..=255) {
        let mut d = fresh();
        d.set_pic_addr(pic).unwrap();
        d.set_servo_addr(servo).unwrap();
        d.set_mode(mode).unwrap();
        d.set_servo_val(val).unwrap();
        let [b0, b1] = d.data();
        prop_assert_eq!(b0 & 0x80, 0x80);
        prop_assert_eq!(i64::from((b0 >> 5) & 3), pic);
        prop_assert_eq!(i64::from((b0 >> 3) & 3), servo);
        prop_assert_eq!(i64::from((b0 >> 1) & 3), mode);
        prop_assert_eq!(i64::from(b0 & 1) << 7 | i64::from(b1), val);
        prop_assert_eq!(b1 & 0x80, 0);
    }
}
