//! Closed-loop regulation against a linear heater divider.

mod common;

use common::MockBoard;
use hp_controls::{
    AbortPolicy, ActuatorCodec, BoardConfig, Channel, ChannelState, ControlError, HeaterRegulator,
    HotplateBoard, IterationRecord, RegulationState,
};
use proptest::prelude::*;

fn traced(target_mv: u16, ratio: f64) -> (Vec<IterationRecord>, ChannelState) {
    let regulator = HeaterRegulator::new(&BoardConfig::default());
    let mut hw = MockBoard::new(ratio);
    let mut state = ChannelState::default();
    let mut steps = Vec::new();
    regulator
        .regulate_traced(&mut hw, &mut state, Channel::Hp1, target_mv, |rec| {
            steps.push(*rec)
        })
        .unwrap();
    (steps, state)
}

#[test]
fn commanded_sequence_converges_towards_twice_target() {
    let (steps, state) = traced(1000, 0.5);
    assert_eq!(steps.len(), 9);

    let commanded: Vec<u16> = steps.iter().map(|s| s.commanded_mv).collect();
    assert_eq!(commanded[0], 300);
    // One correction lands close; the rest stay within a few mV of 2 * target
    for &mv in &commanded[1..] {
        assert!(mv.abs_diff(2000) <= 30, "commanded {mv} mV strayed");
    }

    let last = steps.last().unwrap();
    assert!(last.measured_mv.abs_diff(1000) <= 8);
    let expected_code = ActuatorCodec::default().to_code(2000);
    assert!(last.code.abs_diff(expected_code) <= 10);
    assert_eq!(state.commanded_mv(), last.commanded_mv);
    assert_eq!(state.last_heater_mv(), last.measured_mv);
    assert_eq!(state.target_mv(), 1000);
    assert_eq!(state.regulation_state(), RegulationState::Regulated);
}

#[test]
fn tolerance_stops_early_once_converged() {
    let mut cfg = BoardConfig::default();
    cfg.regulator.convergence_tolerance_mv = Some(10);
    let regulator = HeaterRegulator::new(&cfg);
    let mut hw = MockBoard::new(0.5);
    let mut state = ChannelState::default();

    let report = regulator
        .regulate(&mut hw, &mut state, Channel::Hp3, 1000)
        .unwrap();
    assert_eq!(report.converged, Some(true));
    assert!(report.iterations < 9);
    assert_eq!(hw.writes_for(Channel::Hp3).len(), usize::from(report.iterations));
    assert!(report.last_measured_mv.abs_diff(1000) <= 10);
}

#[test]
fn zero_target_writes_zero_regardless_of_prior_state() {
    let mut board = HotplateBoard::new(MockBoard::new(0.5), BoardConfig::default()).unwrap();
    board.regulate(Channel::Hp1, 1200).unwrap();
    assert!(board.state(Channel::Hp1).enabled());

    board.regulate(Channel::Hp1, 0).unwrap();
    assert_eq!(board.hardware().last_code(Channel::Hp1), 0);
    assert_eq!(board.state(Channel::Hp1).commanded_mv(), 0);
    assert!(!board.state(Channel::Hp1).enabled());
}

#[test]
fn above_ceiling_issues_no_write() {
    let mut board = HotplateBoard::new(MockBoard::new(0.5), BoardConfig::default()).unwrap();
    let err = board.regulate(Channel::Hp3, 3001).unwrap_err();
    assert!(matches!(err, ControlError::Range { .. }));
    assert!(board.hardware().writes.is_empty());
}

#[test]
fn rejected_target_leaves_regulated_channel_off() {
    let mut board = HotplateBoard::new(MockBoard::new(0.5), BoardConfig::default()).unwrap();
    board.regulate(Channel::Hp1, 1000).unwrap();
    assert_eq!(board.state(Channel::Hp1).regulation_state(), RegulationState::Regulated);
    let writes = board.hardware().writes.len();

    let err = board.regulate(Channel::Hp1, 3500).unwrap_err();
    assert!(matches!(err, ControlError::Range { value_mv: 3500, .. }));
    assert_eq!(board.state(Channel::Hp1).regulation_state(), RegulationState::Off);
    assert!(!board.state(Channel::Hp1).enabled());
    assert_eq!(board.hardware().writes.len(), writes);
}

#[test]
fn channels_do_not_share_state() {
    let mut board = HotplateBoard::new(MockBoard::new(0.5), BoardConfig::default()).unwrap();
    board.regulate(Channel::Hp3, 800).unwrap();
    assert_eq!(board.state(Channel::Hp1), &ChannelState::default());
    assert!(board.hardware().writes_for(Channel::Hp1).is_empty());
}

#[test]
fn failed_writes_keep_iterating_and_report_bus_fault() {
    // The loop does not retry or stop on a failed write; it only reports the last one.
    let mut hw = MockBoard::new(0.5);
    hw.write_fails = true;
    let mut board = HotplateBoard::new(hw, BoardConfig::default()).unwrap();
    let err = board.regulate(Channel::Hp1, 1000).unwrap_err();
    assert_eq!(err, ControlError::BusTransfer { channel: Channel::Hp1 });
    assert_eq!(board.hardware().writes_for(Channel::Hp1).len(), 9);
    assert_eq!(board.state(Channel::Hp1).regulation_state(), RegulationState::Regulated);
}

#[test]
fn divergence_holds_output_by_default() {
    let mut board = HotplateBoard::new(MockBoard::new(0.05), BoardConfig::default()).unwrap();
    assert!(matches!(
        board.regulate(Channel::Hp1, 1000),
        Err(ControlError::Range { .. })
    ));
    assert_eq!(board.hardware().last_code(Channel::Hp1), 372);
    assert_eq!(board.state(Channel::Hp1).regulation_state(), RegulationState::Off);
}

#[test]
fn divergence_can_disable_output() {
    let mut cfg = BoardConfig::default();
    cfg.regulator.abort_policy = AbortPolicy::DisableOutput;
    let mut board = HotplateBoard::new(MockBoard::new(0.05), cfg).unwrap();
    assert!(board.regulate(Channel::Hp1, 1000).is_err());
    assert_eq!(board.hardware().last_code(Channel::Hp1), 0);
    assert_eq!(board.state(Channel::Hp1).commanded_mv(), 0);
}

#[test]
fn disabled_channel_can_be_driven_after_fault() {
    let mut board = HotplateBoard::new(MockBoard::new(0.05), BoardConfig::default()).unwrap();
    assert!(board.regulate(Channel::Hp1, 1000).is_err());
    board.disable(Channel::Hp1).unwrap();
    assert_eq!(board.hardware().last_code(Channel::Hp1), 0);
}

#[test]
fn sense_fault_aborts_regulation() {
    let mut hw = MockBoard::new(0.5);
    hw.sense_fails.hp3 = true;
    let mut board = HotplateBoard::new(hw, BoardConfig::default()).unwrap();
    let err = board.regulate(Channel::Hp3, 600).unwrap_err();
    assert!(matches!(err, ControlError::Sense { channel: Channel::Hp3, .. }));
    assert_eq!(board.hardware().writes_for(Channel::Hp3).len(), 1);
}

proptest! {
    #[test]
    fn any_reachable_target_runs_full_bound_and_lands_near_target(target in 50_u16..=1400) {
        let (steps, _) = traced(target, 0.5);
        prop_assert_eq!(steps.len(), 9);
        let last = steps.last().unwrap();
        prop_assert!(last.measured_mv.abs_diff(target) <= 8);
        let ideal = 2.0 * f64::from(target);
        prop_assert!((f64::from(last.commanded_mv) - ideal).abs() <= 0.02 * ideal + 8.0);
    }
}
