use proptest::prelude::*;
use walker_core::parser::{parse_step, parse_str};
use walker_core::step::{deg_from_raw, rad_from_raw, raw_from_deg, raw_from_rad, truncate_raw};

proptest! {
    #[test]
    fn deg_to_raw_is_monotonic(a in 0.0f64..191.0, b in 0.0f64..191.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(raw_from_deg(lo) <= raw_from_deg(hi));
        prop_assert!(truncate_raw(raw_from_deg(lo)) <= truncate_raw(raw_from_deg(hi)));
    }

    #[test]
    fn deg_raw_round_trip_within_one_raw_unit(deg in 0i64..=191) {
        let raw = truncate_raw(raw_from_deg(deg as f64));
        prop_assert!((36..=157).contains(&raw));
        // One raw unit spans 191/121 degrees.
        let back = deg_from_raw(raw);
        prop_assert!((back - deg as f64).abs() < 191.0 / 121.0 + 1e-9);
    }

    #[test]
    fn rad_raw_round_trip(raw in 36i32..=157) {
        let rad = rad_from_raw(raw);
        prop_assert!((raw_from_rad(rad) - f64::from(raw)).abs() < 1e-9);
    }

    #[test]
    fn raw_specs_fill_left_to_right(values in proptest::collection::vec(0i32..=255, 0..20), delay in 0u64..10_000) {
        let body: Vec<String> = values.iter().map(ToString::to_string).collect();
        let line = format!(">{}:{delay}", body.join(","));
        let step = parse_step(&line, 1).unwrap();
        prop_assert_eq!(step.delay_ms(), delay);
        for slot in 0..12 {
            let want = values.get(slot).copied().unwrap_or(0);
            prop_assert_eq!(step.raw(slot), Some(want));
        }
    }

    #[test]
    fn parser_never_panics(text in "(\\PC{0,40}\n){0,30}") {
        let _ = parse_str(&text);
    }

    #[test]
    fn parser_never_panics_on_near_grammar(lines in proptest::collection::vec(
        prop_oneof![
            Just("[info]".to_string()),
            Just("[prg]".to_string()),
            Just("[setup]".to_string()),
            Just("[end]".to_string()),
            Just("-".to_string()),
            "\\[m[0-9]{1,3}\\]",
            ">[dr]?[0-9]{0,4}(\\.\\.[0-9]{0,3})?(,[0-9]{1,3}){0,4}(:[0-9]{0,5})?",
            "Interval=[0-9]{1,5},[0-9]{1,5}",
            "Function=[-+*/t0-9() ]{0,12}",
            "[A-Za-z]{1,6}=[A-Za-z0-9]{0,4}",
        ],
        0..40,
    )) {
        let _ = parse_str(&lines.join("\n"));
    }
}
