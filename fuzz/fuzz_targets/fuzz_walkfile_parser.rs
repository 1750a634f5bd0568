#![no_main]
use libfuzzer_sys::fuzz_target;
use walker_core::mocks::NullLink;
use walker_core::parser::parse_with_report;
use walker_core::FileWalker;

fuzz_target!(|data: &str| {
    // Arbitrary text must parse into some Program (bad lines are skipped),
    // and a valid one must be playable without panicking.
    let outcome = parse_with_report(data);
    if outcome.program.validate().is_err() {
        return;
    }
    let mut walker = FileWalker::new(NullLink);
    let Ok(name) = walker.register(outcome.program) else {
        return;
    };
    walker.select_program(Some(&name));
    for _ in 0..64 {
        let Some(step) = walker.get_next_step() else {
            break;
        };
        let _ = walker.do_step(&step);
    }
});
