//! Program-derived addresses used by the dashboard.

use anchor_lang::prelude::Pubkey;

use crate::config::seeds;

/// Registration account of `wallet` in the agent registry.
pub fn agent_address(wallet: &Pubkey, registry: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::AGENT, wallet.as_ref()], registry)
}

/// The single knowledge vault of `vault_program`.
pub fn vault_address(vault_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::VAULT], vault_program)
}

/// Lesson number `sequence` in `vault`.
pub fn lesson_address(vault: &Pubkey, sequence: u64, vault_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::LESSON, vault.as_ref(), &sequence.to_le_bytes()],
        vault_program,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::config::{AGENT_REGISTRY_PROGRAM_ID, KNOWLEDGE_VAULT_PROGRAM_ID};

    fn program(id: &str) -> Pubkey {
        Pubkey::from_str(id).expect("program id must parse")
    }

    #[test]
    fn derivation_is_deterministic() {
        let registry = program(AGENT_REGISTRY_PROGRAM_ID);
        let wallet = Pubkey::new_unique();
        assert_eq!(agent_address(&wallet, &registry), agent_address(&wallet, &registry));
    }

    #[test]
    fn vault_address_matches_seed_layout() {
        let vault_program = program(KNOWLEDGE_VAULT_PROGRAM_ID);
        let (vault, bump) = vault_address(&vault_program);
        let recreated = Pubkey::create_program_address(&[b"vault", &[bump]], &vault_program)
            .expect("bump must recreate the address");
        assert_eq!(vault, recreated);
    }

    #[test]
    fn agent_address_matches_seed_layout() {
        let registry = program(AGENT_REGISTRY_PROGRAM_ID);
        let wallet = Pubkey::new_unique();
        let (address, bump) = agent_address(&wallet, &registry);
        let recreated =
            Pubkey::create_program_address(&[b"agent", wallet.as_ref(), &[bump]], &registry)
                .expect("bump must recreate the address");
        assert_eq!(address, recreated);
    }

    #[test]
    fn lesson_sequence_is_little_endian_seed() {
        let vault_program = program(KNOWLEDGE_VAULT_PROGRAM_ID);
        let (vault, _) = vault_address(&vault_program);
        let (lesson, bump) = lesson_address(&vault, 3, &vault_program);
        let recreated = Pubkey::create_program_address(
            &[b"lesson", vault.as_ref(), &[3, 0, 0, 0, 0, 0, 0, 0], &[bump]],
            &vault_program,
        )
        .expect("bump must recreate the address");
        assert_eq!(lesson, recreated);
        assert_ne!(lesson, lesson_address(&vault, 4, &vault_program).0);
    }
}
