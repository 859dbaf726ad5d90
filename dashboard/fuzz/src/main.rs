//! Fuzz test runner for OPCLW account decoding
//!
//! Run with: cargo run --release -p opclw-dashboard-fuzz
//! Or: cargo test -p opclw-dashboard-fuzz (for property-based tests)

use opclw_dashboard::accounts::decode_task_account;
use opclw_dashboard::forms::CreateTaskForm;
use opclw_dashboard::instructions::encode_create_task;
use opclw_dashboard::Pubkey;
use opclw_dashboard_fuzz::*;
use proptest::prelude::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;
use std::time::Instant;

fn main() {
    println!("=== OPCLW Dashboard Fuzz Testing ===\n");

    let start = Instant::now();
    let mut passed = 0;
    let mut failed = 0;

    println!("Running task decode fuzz tests...");
    let (p, f) = run_task_decode_fuzz(500);
    passed += p;
    failed += f;

    println!("Running truncation fuzz tests...");
    let (p, f) = run_truncation_fuzz(500);
    passed += p;
    failed += f;

    println!("Running create_task payload fuzz tests...");
    let (p, f) = run_create_task_fuzz(500);
    passed += p;
    failed += f;

    println!("\n=== Fuzz Testing Complete ===");
    println!("Total tests: {}", passed + failed);
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("Duration: {:?}", start.elapsed());

    if failed > 0 {
        std::process::exit(1);
    }
}

fn run_task_decode_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;
    let mut runner = TestRunner::default();

    for i in 0..iterations {
        let input = any::<TaskAccountInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate TaskAccountInput")
            .current();

        match decode_task_account(Pubkey::default(), &input.to_bytes()) {
            Ok(record) => {
                let result = check_task_decode(&input, &record);
                if result.is_valid() {
                    passed += 1;
                } else {
                    println!("  [FAIL] Iteration {}: {:?}", i, result);
                    failed += 1;
                }
            }
            Err(err) => {
                println!("  [FAIL] Iteration {}: well-formed account rejected: {}", i, err);
                failed += 1;
            }
        }
    }

    println!("  task_decode: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn run_truncation_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;
    let mut runner = TestRunner::default();

    for i in 0..iterations {
        let (input, cut) = (any::<TaskAccountInput>(), any::<prop::sample::Index>())
            .new_tree(&mut runner)
            .expect("Failed to generate truncation input")
            .current();

        let bytes = input.to_bytes();
        let len = cut.index(bytes.len());
        if decode_task_account(Pubkey::default(), &bytes[..len]).is_err() {
            passed += 1;
        } else {
            println!("  [FAIL] Iteration {}: {}-byte prefix of {} decoded", i, len, bytes.len());
            failed += 1;
        }
    }

    println!("  truncation: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn run_create_task_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;
    let mut runner = TestRunner::default();

    for i in 0..iterations {
        let input = any::<CreateTaskFormInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate CreateTaskFormInput")
            .current();

        let form = CreateTaskForm {
            title: input.title.clone(),
            description: input.description.clone(),
            reward: input.reward.to_string(),
            deadline: String::new(),
            skills: input.skills.join(","),
            min_reputation: input.min_reputation.to_string(),
        };

        let result = form
            .validate()
            .map_err(|err| err.to_string())
            .and_then(|args| {
                encode_create_task(&args)
                    .map(|data| check_create_task_payload(&args, &data))
                    .map_err(|err| err.to_string())
            });
        match result {
            Ok(check) if check.is_valid() => passed += 1,
            other => {
                println!("  [FAIL] Iteration {}: {:?}\nInput: {:?}", i, other, input);
                failed += 1;
            }
        }
    }

    println!("  create_task: {} passed, {} failed", passed, failed);
    (passed, failed)
}
