use rstest::rstest;
use walker_hardware::SimulatedLink;
use walker_hardware::error::HwError;
use walker_traits::ByteLink;

#[test]
fn disconnected_link_reports_closed() {
    let probe = SimulatedLink::new();
    let mut link = probe.clone();
    link.putc(1).unwrap();
    probe.disconnect();
    let err = link.putc(2).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Closed)));
    assert_eq!(probe.written(), vec![1]);
}

#[rstest]
#[case(&[], 0)]
#[case(&[0x80, 0x10], 1)]
#[case(&[0x80, 0x10, 0xa0], 1)]
#[case(&[0x80, 0x10, 0xa0, 0x7f], 2)]
fn frames_group_pairs(#[case] bytes: &[u8], #[case] want: usize) {
    let probe = SimulatedLink::new();
    let mut link = probe.clone();
    for b in bytes {
        link.putc(*b).unwrap();
    }
    assert_eq!(probe.frames().len(), want);
}

#[test]
fn boxed_link_forwards() {
    let probe = SimulatedLink::new();
    probe.script_replies(&[9]);
    let mut boxed: Box<dyn ByteLink + Send> = Box::new(probe.clone());
    boxed.putc(7).unwrap();
    assert_eq!(boxed.read().unwrap(), Some(9));
    assert_eq!(probe.written(), vec![7]);
}
