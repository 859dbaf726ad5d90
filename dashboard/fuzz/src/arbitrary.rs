//! Arbitrary input generators for fuzz testing
//!
//! Generates task account contents, raw byte buffers and form input.

use opclw_codec::ByteWriter;
use opclw_dashboard::accounts::FIELD_PRESENT;
use proptest::prelude::*;

/// Arbitrary 32-byte public key
pub fn arb_key() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strings including multi-byte UTF-8 and the empty string
pub fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-zA-Z0-9 ]{1,40}",
        "\\PC{0,24}",
    ]
}

/// Reward amounts with edge cases
pub fn arb_reward_amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        1_000u64..1_000_000_000u64,
        1_000_000_000u64..u64::MAX / 2,
    ]
}

/// Status bytes, mostly in range but including out-of-range values
pub fn arb_status_byte() -> impl Strategy<Value = u8> {
    prop_oneof![
        3 => 0u8..=3u8,
        1 => 4u8..=255u8,
    ]
}

/// Presence flags: absent, present, and junk values that count as absent
pub fn arb_flag() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0u8), Just(FIELD_PRESENT), 2u8..=255u8]
}

pub fn arb_timestamp() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(0i64),
        Just(i64::MIN),
        Just(i64::MAX),
        1_600_000_000i64..2_000_000_000i64,
    ]
}

/// Unstructured account data
pub fn arb_account_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Fields of one encoded task account
#[derive(Debug, Clone)]
pub struct TaskAccountInput {
    pub discriminator: [u8; 8],
    pub creator: [u8; 32],
    pub title: String,
    pub description: String,
    pub reward: u64,
    pub deadline: i64,
    pub skills: Vec<String>,
    pub min_reputation: u8,
    pub status: u8,
    pub assigned_flag: u8,
    pub assigned_agent: [u8; 32],
    pub created_at: i64,
    pub completed_flag: u8,
    pub completed_at: i64,
}

impl TaskAccountInput {
    /// Serializes in account layout order. The agent and completion time
    /// are written only when their flag equals `FIELD_PRESENT`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.put_bytes(&self.discriminator);
        writer.put_key(&self.creator);
        writer
            .put_string(&self.title)
            .expect("generated title fits a u32 prefix");
        writer
            .put_string(&self.description)
            .expect("generated description fits a u32 prefix");
        writer.put_u64(self.reward);
        writer.put_i64(self.deadline);
        writer
            .put_string_vec(&self.skills)
            .expect("generated skills fit a u32 prefix");
        writer.put_u8(u64::from(self.min_reputation));
        writer.put_u8(u64::from(self.status));
        writer.put_u8(u64::from(self.assigned_flag));
        if self.assigned_flag == FIELD_PRESENT {
            writer.put_key(&self.assigned_agent);
        }
        writer.put_i64(self.created_at);
        writer.put_u8(u64::from(self.completed_flag));
        if self.completed_flag == FIELD_PRESENT {
            writer.put_i64(self.completed_at);
        }
        writer.into_bytes()
    }
}

impl Arbitrary for TaskAccountInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            (
                prop::array::uniform8(any::<u8>()),
                arb_key(),
                arb_text(),
                arb_text(),
                arb_reward_amount(),
                arb_timestamp(),
                prop::collection::vec(arb_text(), 0..5),
            ),
            (
                any::<u8>(),
                arb_status_byte(),
                arb_flag(),
                arb_key(),
                arb_timestamp(),
                arb_flag(),
                arb_timestamp(),
            ),
        )
            .prop_map(
                |(
                    (discriminator, creator, title, description, reward, deadline, skills),
                    (
                        min_reputation,
                        status,
                        assigned_flag,
                        assigned_agent,
                        created_at,
                        completed_flag,
                        completed_at,
                    ),
                )| TaskAccountInput {
                    discriminator,
                    creator,
                    title,
                    description,
                    reward,
                    deadline,
                    skills,
                    min_reputation,
                    status,
                    assigned_flag,
                    assigned_agent,
                    created_at,
                    completed_flag,
                    completed_at,
                },
            )
            .boxed()
    }
}

/// Create-task form input as a user might type it
#[derive(Debug, Clone)]
pub struct CreateTaskFormInput {
    pub title: String,
    pub description: String,
    pub reward: f64,
    pub skills: Vec<String>,
    pub min_reputation: f64,
}

impl Arbitrary for CreateTaskFormInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            "[a-zA-Z][a-zA-Z0-9 ]{0,40}",
            "[a-zA-Z][a-zA-Z0-9 ]{0,80}",
            prop_oneof![Just(0.0f64), 0.0f64..1_000_000.0f64],
            prop::collection::vec("[a-z]{1,12}", 0..5),
            prop_oneof![Just(-5.0f64), Just(250.0f64), 0.0f64..=100.0f64],
        )
            .prop_map(
                |(title, description, reward, skills, min_reputation)| CreateTaskFormInput {
                    title,
                    description,
                    reward,
                    skills,
                    min_reputation,
                },
            )
            .boxed()
    }
}
