//! Instruction payloads and account lists for the marketplace and vault
//! programs.
//!
//! Payloads are the 8-byte discriminator followed by the arguments in
//! declaration order, Borsh-encoded.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::system_program;
use opclw_codec::{ByteWriter, CodecError};
use serde::{Deserialize, Serialize};

use crate::config::{discriminators, MAX_MIN_REPUTATION};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskArgs {
    pub title: String,
    pub description: String,
    /// Smallest units.
    pub reward: u64,
    /// Unix seconds, 0 = no deadline.
    pub deadline: i64,
    pub skills: Vec<String>,
    pub min_reputation: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishLessonArgs {
    pub sequence: u64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl PublishLessonArgs {
    pub fn at_sequence(self, sequence: u64) -> Self {
        Self { sequence, ..self }
    }

    /// Tags as stored on chain: one comma-joined string.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

pub fn encode_create_task(args: &CreateTaskArgs) -> Result<Vec<u8>, CodecError> {
    let mut writer = ByteWriter::new();
    writer.put_bytes(&discriminators::CREATE_TASK);
    writer.put_string(&args.title)?;
    writer.put_string(&args.description)?;
    writer.put_u64(args.reward);
    writer.put_i64(args.deadline);
    writer.put_string_vec(&args.skills)?;
    writer.put_u8(u64::from(args.min_reputation.min(MAX_MIN_REPUTATION)));
    Ok(writer.into_bytes())
}

pub fn encode_accept_task() -> Vec<u8> {
    discriminators::ACCEPT_TASK.to_vec()
}

pub fn encode_complete_task() -> Vec<u8> {
    discriminators::COMPLETE_TASK.to_vec()
}

pub fn encode_publish_lesson(args: &PublishLessonArgs) -> Result<Vec<u8>, CodecError> {
    let mut writer = ByteWriter::new();
    writer.put_bytes(&discriminators::PUBLISH_LESSON);
    writer.put_u64(args.sequence);
    writer.put_string(&args.title)?;
    writer.put_string(&args.summary)?;
    writer.put_string(&args.content)?;
    writer.put_string(&args.joined_tags())?;
    Ok(writer.into_bytes())
}

/// `task` is a fresh keypair that must co-sign the transaction.
pub fn create_task_instruction(
    program_id: Pubkey,
    task: Pubkey,
    creator: Pubkey,
    args: &CreateTaskArgs,
) -> Result<Instruction, CodecError> {
    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(task, true),
            AccountMeta::new(creator, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: encode_create_task(args)?,
    })
}

pub fn accept_task_instruction(
    program_id: Pubkey,
    task: Pubkey,
    agent: Pubkey,
    wallet: Pubkey,
) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(task, false),
            AccountMeta::new_readonly(agent, false),
            AccountMeta::new_readonly(wallet, true),
        ],
        data: encode_accept_task(),
    }
}

pub fn complete_task_instruction(program_id: Pubkey, task: Pubkey, wallet: Pubkey) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(task, false),
            AccountMeta::new_readonly(wallet, true),
        ],
        data: encode_complete_task(),
    }
}

pub fn publish_lesson_instruction(
    program_id: Pubkey,
    vault: Pubkey,
    lesson: Pubkey,
    author: Pubkey,
    args: &PublishLessonArgs,
) -> Result<Instruction, CodecError> {
    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(vault, false),
            AccountMeta::new(author, true),
            AccountMeta::new(lesson, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: encode_publish_lesson(args)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opclw_codec::ByteReader;

    fn audit_args() -> CreateTaskArgs {
        CreateTaskArgs {
            title: "Audit contract".into(),
            description: "Check for reentrancy".into(),
            reward: 5_000_000_000,
            deadline: 0,
            skills: vec!["security".into()],
            min_reputation: 50,
        }
    }

    #[test]
    fn create_task_payload_layout() {
        let payload = encode_create_task(&audit_args()).expect("must encode");
        let mut reader = ByteReader::new(&payload);

        assert_eq!(reader.read_bytes(8).expect("disc"), &discriminators::CREATE_TASK);
        assert_eq!(reader.read_string().expect("title"), "Audit contract");
        assert_eq!(reader.read_string().expect("description"), "Check for reentrancy");
        assert_eq!(reader.read_u64().expect("reward"), 5_000_000_000);
        assert_eq!(reader.read_i64().expect("deadline"), 0);
        assert_eq!(reader.read_string_vec().expect("skills"), vec!["security"]);
        assert_eq!(reader.read_u8().expect("min rep"), 50);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn create_task_payload_matches_borsh_struct() {
        use borsh::BorshSerialize;

        #[derive(BorshSerialize)]
        struct CreateTask {
            title: String,
            description: String,
            reward: u64,
            deadline: i64,
            skills: Vec<String>,
            min_reputation: u8,
        }

        let args = audit_args();
        let mut expected = discriminators::CREATE_TASK.to_vec();
        expected.extend(
            CreateTask {
                title: args.title.clone(),
                description: args.description.clone(),
                reward: args.reward,
                deadline: args.deadline,
                skills: args.skills.clone(),
                min_reputation: args.min_reputation,
            }
            .try_to_vec()
            .expect("borsh must serialize"),
        );
        assert_eq!(encode_create_task(&args).expect("must encode"), expected);
    }

    #[test]
    fn reputation_above_limit_is_clamped() {
        let args = CreateTaskArgs {
            min_reputation: 250,
            ..audit_args()
        };
        let payload = encode_create_task(&args).expect("must encode");
        assert_eq!(payload.last(), Some(&100));
    }

    #[test]
    fn empty_strings_encode() {
        let payload = encode_create_task(&CreateTaskArgs::default()).expect("must encode");
        // disc + title + description + reward + deadline + skills + rep
        assert_eq!(payload.len(), 8 + 4 + 4 + 8 + 8 + 4 + 1);
    }

    #[test]
    fn accept_and_complete_are_discriminator_only() {
        assert_eq!(encode_accept_task(), vec![222, 196, 79, 165, 120, 30, 38, 120]);
        assert_eq!(encode_complete_task(), vec![109, 167, 192, 41, 129, 108, 220, 196]);
    }

    #[test]
    fn publish_lesson_payload_layout() {
        let args = PublishLessonArgs {
            sequence: 42,
            title: "Borrowck".into(),
            summary: "Short".into(),
            content: "Long".into(),
            tags: vec!["ai".into(), "ml".into()],
        };
        let payload = encode_publish_lesson(&args).expect("must encode");
        let mut reader = ByteReader::new(&payload);

        assert_eq!(reader.read_bytes(8).expect("disc"), &discriminators::PUBLISH_LESSON);
        assert_eq!(reader.read_u64().expect("sequence"), 42);
        assert_eq!(reader.read_string().expect("title"), "Borrowck");
        assert_eq!(reader.read_string().expect("summary"), "Short");
        assert_eq!(reader.read_string().expect("content"), "Long");
        assert_eq!(reader.read_string().expect("tags"), "ai,ml");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn create_task_accounts_in_program_order() {
        let program = Pubkey::new_unique();
        let task = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let ix = create_task_instruction(program, task, creator, &audit_args()).expect("must build");

        assert_eq!(ix.program_id, program);
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new(task, true),
                AccountMeta::new(creator, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ]
        );
    }

    #[test]
    fn accept_task_marks_only_the_task_writable() {
        let (task, agent, wallet) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let ix = accept_task_instruction(Pubkey::new_unique(), task, agent, wallet);

        let flags: Vec<(bool, bool)> = ix
            .accounts
            .iter()
            .map(|meta| (meta.is_signer, meta.is_writable))
            .collect();
        assert_eq!(flags, vec![(false, true), (false, false), (true, false)]);
        assert_eq!(ix.accounts[1].pubkey, agent);
    }

    #[test]
    fn complete_task_has_two_accounts() {
        let (task, wallet) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = complete_task_instruction(Pubkey::new_unique(), task, wallet);
        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[1].is_signer);
        assert_eq!(ix.data, discriminators::COMPLETE_TASK.to_vec());
    }

    #[test]
    fn publish_lesson_accounts_in_program_order() {
        let (vault, lesson, author) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let ix = publish_lesson_instruction(
            Pubkey::new_unique(),
            vault,
            lesson,
            author,
            &PublishLessonArgs::default(),
        )
        .expect("must build");

        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new(vault, false),
                AccountMeta::new(author, true),
                AccountMeta::new(lesson, false),
                AccountMeta::new_readonly(system_program::ID, false),
            ]
        );
    }
}
