//! Fuzz target for task, lesson and vault account decoding
//!
//! Tests:
//! - Every generated task account decodes to exactly the encoded fields
//! - Out-of-range status bytes decode as Open
//! - Truncated accounts are rejected, trailing bytes are ignored
//! - Arbitrary bytes never panic any decoder
//!
//! Run with: cargo test --release -p opclw-dashboard-fuzz task_decode

use crate::*;
use opclw_dashboard::accounts::{decode_lesson_account, decode_task_account, decode_vault_state};
use opclw_dashboard::Pubkey;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_task_decode_matches_input(input in any::<TaskAccountInput>()) {
        let bytes = input.to_bytes();
        let record = decode_task_account(Pubkey::new_from_array([7u8; 32]), &bytes);
        prop_assert!(record.is_ok(), "well-formed account rejected: {:?}", record);

        let record = record.expect("checked above");
        let result = check_task_decode(&input, &record);
        prop_assert!(result.is_valid(), "{:?}\nInput: {:?}", result, input);
    }

    #[test]
    fn fuzz_truncated_task_is_rejected(
        input in any::<TaskAccountInput>(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = input.to_bytes();
        let len = cut.index(bytes.len());
        prop_assert!(decode_task_account(Pubkey::default(), &bytes[..len]).is_err(),
            "prefix of {} / {} bytes decoded", len, bytes.len());
    }

    #[test]
    fn fuzz_trailing_bytes_are_ignored(
        input in any::<TaskAccountInput>(),
        tail in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let bytes = input.to_bytes();
        let mut padded = bytes.clone();
        padded.extend_from_slice(&tail);

        let exact = decode_task_account(Pubkey::default(), &bytes);
        let with_tail = decode_task_account(Pubkey::default(), &padded);
        prop_assert_eq!(exact, with_tail);
    }

    #[test]
    fn fuzz_arbitrary_bytes_never_panic(data in arb_account_bytes()) {
        let first = decode_task_account(Pubkey::default(), &data);
        let second = decode_task_account(Pubkey::default(), &data);
        prop_assert_eq!(first, second);

        let _ = decode_lesson_account(Pubkey::default(), &data);
        let vault = decode_vault_state(&data);
        if data.len() >= 8 + 32 + 1 + 8 {
            prop_assert!(vault.is_ok());
        } else {
            prop_assert!(vault.is_err());
        }
    }
}

#[test]
fn status_transitions_follow_the_lifecycle() {
    use opclw_dashboard::TaskStatus::{self, *};

    for from in TaskStatus::ORDERED {
        for to in TaskStatus::ORDERED {
            let result = check_status_transition(from, to);
            assert!(result.is_valid(), "{from} -> {to}: {result:?}");
        }
    }

    let allowed: Vec<(TaskStatus, TaskStatus)> = TaskStatus::ORDERED
        .into_iter()
        .flat_map(|from| TaskStatus::ORDERED.into_iter().map(move |to| (from, to)))
        .filter(|(from, to)| from.can_transition_to(*to))
        .collect();
    assert_eq!(allowed.len(), LIFECYCLE.len());

    for (from, to) in [
        (Open, Completed),
        (InProgress, Open),
        (InProgress, Cancelled),
        (Completed, Open),
        (Completed, InProgress),
        (Cancelled, Open),
        (Open, Open),
    ] {
        assert!(!from.can_transition_to(to), "{from} -> {to} must be forbidden");
    }
}
