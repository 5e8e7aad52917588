use nyx::time::{Epoch, Unit};
use nyx::Window;
use rstest::*;

fn day(d: u8) -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2021, 1, d)
}

#[test]
fn window_bounds_are_ordered() {
    assert_eq!(Window::new(day(3), day(2)), Window::new(day(2), day(3)));
    let window = Window::new(day(3), day(2));
    assert_eq!(window.start(), day(2));
    assert_eq!(window.end(), day(3));
    assert_eq!(window.length(), Unit::Day * 1);
}

#[test]
fn window_merge_and_intersection() {
    let w1 = Window::new(day(2), day(10));
    let w2 = Window::new(day(4), day(12));
    assert!(w1.intersects(&w2));
    assert_eq!(w1.merge(&w2), Window::new(day(2), day(12)));
    assert_eq!(w1.intersection(&w2), Some(Window::new(day(4), day(10))));
    assert_eq!(w2.intersection(&w1), Some(Window::new(day(4), day(10))));

    let w3 = Window::new(day(20), day(21));
    assert!(!w1.intersects(&w3));
    assert_eq!(w1.intersection(&w3), None);
}

#[rstest]
#[case(day(2), true)]
#[case(day(5), true)]
#[case(day(10), true)]
#[case(day(1), false)]
#[case(day(11), false)]
fn window_contains(#[case] epoch: Epoch, #[case] expected: bool) {
    assert_eq!(Window::new(day(2), day(10)).contains(epoch), expected);
}

#[test]
fn window_split_per_day() {
    let window = Window::new(day(1), day(4) + Unit::Hour * 12);
    let chunks = window.split(Unit::Day * 1);
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0], Window::new(day(1), day(2)));
    assert_eq!(chunks[3].length(), Unit::Hour * 12);
    assert_eq!(chunks.last().unwrap().end(), window.end());
}
