// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock;
    let first = clock.now();
    assert!(clock.now() >= first);
}

#[test]
fn fake_clock_stands_still_until_advanced() {
    let clock = FakeClock::new();
    let first = clock.now();
    assert_eq!(clock.now(), first);

    clock.advance(Duration::from_secs(601));
    assert_eq!(clock.now().duration_since(first), Duration::from_secs(601));
}

#[test]
fn fake_clock_handles_share_time() {
    let scheduler_handle = FakeClock::new();
    let test_handle = scheduler_handle.clone();

    let start = scheduler_handle.now();
    test_handle.advance(Duration::from_secs(30));
    assert_eq!(
        scheduler_handle.now().duration_since(start),
        Duration::from_secs(30)
    );
}

#[test]
fn advances_accumulate() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance(Duration::from_secs(300));
    clock.advance(Duration::from_secs(300));
    assert_eq!(clock.now().duration_since(start), Duration::from_secs(600));
}
