// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    idle_triggered = { LoopPhase::Idle, LoopSignal::Triggered, LoopPhase::Evaluating },
    scheduled_triggered = { LoopPhase::Scheduled, LoopSignal::Triggered, LoopPhase::Evaluating },
    evaluating_imbalanced = { LoopPhase::Evaluating, LoopSignal::Imbalanced, LoopPhase::Correcting },
    evaluating_settled = { LoopPhase::Evaluating, LoopSignal::Settled, LoopPhase::Scheduled },
    correcting_settled = { LoopPhase::Correcting, LoopSignal::Settled, LoopPhase::Scheduled },
    correcting_vanished = { LoopPhase::Correcting, LoopSignal::Vanished, LoopPhase::Idle },
    scheduled_vanished = { LoopPhase::Scheduled, LoopSignal::Vanished, LoopPhase::Idle },
    busy_ignores_trigger = { LoopPhase::Evaluating, LoopSignal::Triggered, LoopPhase::Evaluating },
    idle_ignores_settled = { LoopPhase::Idle, LoopSignal::Settled, LoopPhase::Idle },
    scheduled_ignores_imbalance = { LoopPhase::Scheduled, LoopSignal::Imbalanced, LoopPhase::Scheduled },
)]
fn transitions(from: LoopPhase, signal: LoopSignal, expected: LoopPhase) {
    assert_eq!(from.on(signal), expected);
}

#[test]
fn a_full_pass_returns_to_scheduled() {
    let phase = LoopPhase::Scheduled
        .on(LoopSignal::Triggered)
        .on(LoopSignal::Imbalanced)
        .on(LoopSignal::Settled);
    assert_eq!(phase, LoopPhase::Scheduled);
    assert!(!phase.is_busy());
}

fn any_signal() -> impl Strategy<Value = LoopSignal> {
    prop_oneof![
        Just(LoopSignal::Triggered),
        Just(LoopSignal::Imbalanced),
        Just(LoopSignal::Settled),
        Just(LoopSignal::Vanished),
    ]
}

proptest! {
    #[test]
    fn the_loop_can_always_be_triggered_again(signals in proptest::collection::vec(any_signal(), 0..32)) {
        let mut phase = LoopPhase::Idle;
        for signal in signals {
            phase = phase.on(signal);
        }
        // Whatever happened, settling and triggering re-enters evaluation
        let next = phase.on(LoopSignal::Settled).on(LoopSignal::Triggered);
        prop_assert_eq!(next, LoopPhase::Evaluating);
    }
}
