//! End-to-end session scenarios driven through the state machine

use oscar_grind::{
    session::{BetInput, SessionStateMachine, SetupInput},
    BetResult, Milestone, SessionError, SessionPolicy, SessionState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn started(bankroll: Decimal, base_bet: Decimal, target: Decimal) -> SessionStateMachine {
    let mut machine = SessionStateMachine::new(SessionPolicy::default());
    machine.create(bankroll, base_bet, target).expect("valid setup");
    machine
}

#[test]
fn test_two_round_scenario() {
    let mut machine = started(dec!(1000), dec!(10), dec!(100));

    let round1 = machine.record_bet(dec!(10), BetResult::Win).unwrap();
    assert_eq!(round1.round, 1);
    assert!(round1.followed_suggestion);
    {
        let session = machine.session().unwrap();
        assert_eq!(session.current_bankroll(), dec!(1010));
        assert_eq!(session.highest_bankroll(), dec!(1010));
        assert_eq!(session.round_number(), 2);
        assert_eq!(session.current_bet(), round1.suggested_next_bet);
    }

    let round2 = machine.record_bet(dec!(20), BetResult::Loss).unwrap();
    assert_eq!(round2.round, 2);
    assert_eq!(round2.suggested_next_bet, dec!(20));

    let session = machine.session().unwrap();
    assert_eq!(session.current_bankroll(), dec!(990));
    assert_eq!(session.highest_bankroll(), dec!(1010));
    assert_eq!(session.current_bet(), dec!(20));
    assert_eq!(session.round_number(), 3);
    assert_eq!(session.last_record().unwrap().round, 2);
}

#[test]
fn test_invariants_hold_over_long_sequence() {
    let mut machine = started(dec!(500), dec!(5), dec!(50));
    // deterministic win/loss pattern
    let pattern = [
        BetResult::Loss,
        BetResult::Loss,
        BetResult::Win,
        BetResult::Loss,
        BetResult::Win,
        BetResult::Win,
        BetResult::Win,
        BetResult::Loss,
        BetResult::Win,
    ];

    let mut previous_high = machine.session().unwrap().highest_bankroll();
    for (i, result) in pattern.iter().cycle().take(90).enumerate() {
        let bet = machine.session().unwrap().current_bet();
        let record = machine.record_bet(bet, *result).unwrap();
        let session = machine.session().unwrap();

        assert_eq!(record.round, i as u64 + 1);
        assert_eq!(session.round_number(), i as u64 + 2);
        assert_eq!(
            session.highest_bankroll(),
            previous_high.max(session.current_bankroll())
        );
        assert!(session.highest_bankroll() >= session.current_bankroll());

        let current = session.current_bet();
        assert!(current >= session.base_bet());
        assert_eq!((current / session.base_bet()).fract(), Decimal::ZERO);
        assert!(record.followed_suggestion);

        previous_high = session.highest_bankroll();
    }
}

#[test]
fn test_rejections_do_not_advance_round() {
    let mut machine = started(dec!(100), dec!(10), dec!(50));
    let before = machine.session().unwrap().clone();

    assert!(matches!(
        machine.record_bet(dec!(15), BetResult::Win),
        Err(SessionError::NonMultipleBet { .. })
    ));
    assert!(matches!(
        machine.record_bet(dec!(0), BetResult::Win),
        Err(SessionError::InvalidInput { .. })
    ));
    assert!(matches!(
        machine.record_bet(dec!(110), BetResult::Win),
        Err(SessionError::InsufficientBankroll { .. })
    ));

    assert_eq!(machine.session().unwrap(), &before);
}

#[test]
fn test_parsed_inputs_drive_the_machine() {
    let setup = SetupInput::parse("200", "2.50", "25").unwrap();
    let mut machine = SessionStateMachine::default();
    machine.create_from(setup).unwrap();

    let bet = BetInput::parse("7.5", "win").unwrap();
    let record = machine.record_bet(bet.amount, bet.result).unwrap();
    assert_eq!(record.bankroll_after, dec!(207.5));
    assert!(!record.followed_suggestion);

    assert!(BetInput::parse("ten", "win").is_err());
    assert!(BetInput::parse("10", "tie").is_err());
}

#[test]
fn test_target_and_low_bankroll_are_advisory() {
    let mut machine = started(dec!(20), dec!(10), dec!(10));
    machine.record_bet(dec!(10), BetResult::Win).unwrap();
    assert!(matches!(
        machine.check_milestones().unwrap().as_slice(),
        [Milestone::TargetReached { .. }]
    ));

    // still playable after the target
    machine.record_bet(dec!(30), BetResult::Loss).unwrap();
    assert!(matches!(
        machine.check_milestones().unwrap().as_slice(),
        [Milestone::LowBankroll { .. }]
    ));
    assert!(machine.is_active());
}

#[test]
fn test_reset_twice() {
    let mut machine = started(dec!(1000), dec!(10), dec!(100));
    machine.record_bet(dec!(10), BetResult::Loss).unwrap();

    machine.reset();
    assert_eq!(machine.state(), &SessionState::NoSession);
    machine.reset();
    assert_eq!(machine.state(), &SessionState::NoSession);

    assert_eq!(
        machine.record_bet(dec!(10), BetResult::Win).unwrap_err(),
        SessionError::NoActiveSession
    );
}

#[test]
fn test_session_serializes_for_external_storage() {
    let mut machine = started(dec!(1000), dec!(10), dec!(100));
    machine.record_bet(dec!(10), BetResult::Win).unwrap();
    let session = machine.into_session().unwrap();

    let json = serde_json::to_string(&session).unwrap();
    assert!(json.contains("\"current_bankroll\":\"1010\""));
    let restored = serde_json::from_str(&json).unwrap();

    let mut machine = SessionStateMachine::with_session(SessionPolicy::default(), Some(restored));
    machine.record_bet(dec!(10), BetResult::Loss).unwrap();
    assert_eq!(machine.session().unwrap().round_number(), 3);
}
