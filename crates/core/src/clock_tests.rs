// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn deadline_is_offset_from_now() {
    let clock = FakeClock::new();
    let start = clock.now();
    assert_eq!(
        clock.deadline_after(Duration::from_secs(30)),
        start + Duration::from_secs(30)
    );
}

#[test]
fn fake_clock_advance_is_shared_between_clones() {
    let clock = FakeClock::new();
    let observer = clock.clone();
    let start = observer.now();

    clock.advance(Duration::from_secs(30));

    assert_eq!(observer.now().duration_since(start), Duration::from_secs(30));
}

#[test]
fn system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    let t2 = clock.now();
    assert!(t2 >= t1);
}
