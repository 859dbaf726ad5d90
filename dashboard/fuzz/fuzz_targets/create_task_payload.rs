//! Fuzz target for create-task form validation and payload encoding
//!
//! Tests:
//! - Valid forms always encode with the create-task discriminator
//! - Payload length matches the argument layout exactly
//! - Minimum reputation is clamped to 0..=100
//!
//! Run with: cargo test --release -p opclw-dashboard-fuzz create_task_payload

use crate::*;
use opclw_dashboard::forms::{to_smallest_units, CreateTaskForm};
use opclw_dashboard::instructions::encode_create_task;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_create_task_payload(input in any::<CreateTaskFormInput>()) {
        let form = input.to_form();
        let args = form.validate();
        prop_assert!(args.is_ok(), "valid form rejected: {:?}\nInput: {:?}", args, input);
        let args = args.expect("checked above");

        prop_assert_eq!(args.reward, to_smallest_units(input.reward).expect("finite reward"));
        prop_assert!(args.min_reputation <= 100);

        let data = encode_create_task(&args).expect("short fields encode");
        let result = check_create_task_payload(&args, &data);
        prop_assert!(result.is_valid(), "{:?}\nArgs: {:?}", result, args);
    }

    #[test]
    fn fuzz_out_of_range_reputation_is_clamped(reputation in 0u8..=255u8) {
        let args = opclw_dashboard::instructions::CreateTaskArgs {
            title: "t".into(),
            description: "d".into(),
            min_reputation: reputation,
            ..Default::default()
        };
        let data = encode_create_task(&args).expect("short fields encode");
        prop_assert_eq!(data.last().copied(), Some(reputation.min(100)));
    }

    #[test]
    fn fuzz_negative_reward_is_rejected(reward in -1_000_000.0f64..-0.000_001f64) {
        let mut form = CreateTaskFormInput::simple().to_form();
        form.reward = reward.to_string();
        prop_assert!(form.validate().is_err());
    }
}

impl CreateTaskFormInput {
    fn simple() -> Self {
        Self {
            title: "Audit contract".into(),
            description: "Check for reentrancy".into(),
            reward: 5.0,
            skills: vec!["security".into()],
            min_reputation: 50.0,
        }
    }

    fn to_form(&self) -> CreateTaskForm {
        CreateTaskForm {
            title: self.title.clone(),
            description: self.description.clone(),
            reward: self.reward.to_string(),
            deadline: String::new(),
            skills: self.skills.join(", "),
            min_reputation: self.min_reputation.to_string(),
        }
    }
}
