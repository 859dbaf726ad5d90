//! Raw form input to validated instruction arguments.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::accounts::parse_tags;
use crate::config::{MAX_MIN_REPUTATION, TOKEN_DECIMALS_SCALE};
use crate::error::ValidationError;
use crate::instructions::{CreateTaskArgs, PublishLessonArgs};

const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Create-task form fields as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTaskForm {
    pub title: String,
    pub description: String,
    pub reward: String,
    pub deadline: String,
    pub skills: String,
    pub min_reputation: String,
}

impl CreateTaskForm {
    pub fn validate(&self) -> Result<CreateTaskArgs, ValidationError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;

        let reward = match self.reward.trim() {
            "" => 0,
            raw => {
                let amount: f64 = raw
                    .parse()
                    .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;
                to_smallest_units(amount)?
            }
        };

        Ok(CreateTaskArgs {
            title,
            description,
            reward,
            deadline: parse_deadline(&self.deadline)?,
            skills: split_list(&self.skills),
            min_reputation: parse_min_reputation(&self.min_reputation)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishLessonForm {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: String,
}

impl PublishLessonForm {
    /// The sequence is left at 0; the session assigns it from the vault
    /// counter read just before submission.
    pub fn validate(&self) -> Result<PublishLessonArgs, ValidationError> {
        Ok(PublishLessonArgs {
            sequence: 0,
            title: required("title", &self.title)?,
            summary: self.summary.trim().to_string(),
            content: required("content", &self.content)?,
            tags: split_list(&self.tags),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub display_name: String,
    pub bio: String,
    pub contact: String,
    pub timezone: String,
}

/// Profile fields with blanks removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub contact: Option<String>,
    pub timezone: Option<String>,
}

impl ProfileForm {
    pub fn normalize(&self) -> ProfileFields {
        ProfileFields {
            display_name: non_blank(&self.display_name),
            bio: non_blank(&self.bio),
            contact: non_blank(&self.contact),
            timezone: non_blank(&self.timezone),
        }
    }
}

/// `round(amount × 10^9)`, half away from zero.
pub fn to_smallest_units(amount: f64) -> Result<u64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NonFiniteAmount);
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount);
    }
    let scaled = (amount * TOKEN_DECIMALS_SCALE as f64).round();
    // 2^64 is the first f64 that no longer fits
    if scaled >= 18_446_744_073_709_551_616.0 {
        return Err(ValidationError::AmountOverflow);
    }
    Ok(scaled as u64)
}

pub fn to_ui_amount(units: u64) -> f64 {
    units as f64 / TOKEN_DECIMALS_SCALE as f64
}

/// Empty input means no deadline (0). Naive datetimes are read as UTC.
pub fn parse_deadline(raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }

    let seconds = if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        parsed.timestamp()
    } else if let Some(parsed) = LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        parsed.and_utc().timestamp()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp())
            .ok_or_else(|| ValidationError::InvalidDeadline(raw.to_string()))?
    } else {
        return Err(ValidationError::InvalidDeadline(raw.to_string()));
    };

    if seconds < 0 {
        return Err(ValidationError::NegativeDeadline);
    }
    Ok(seconds)
}

/// Empty means 0; numbers are clamped to 0..=100 with the fraction dropped.
pub fn parse_min_reputation(raw: &str) -> Result<u8, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidReputation(raw.to_string()))?;
    if value.is_nan() {
        return Err(ValidationError::InvalidReputation(raw.to_string()));
    }
    Ok(value.clamp(0.0, f64::from(MAX_MIN_REPUTATION)).trunc() as u8)
}

/// Comma-separated input to trimmed, non-empty entries in order.
pub fn split_list(raw: &str) -> Vec<String> {
    parse_tags(raw)
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit_form() -> CreateTaskForm {
        CreateTaskForm {
            title: "  Audit contract ".into(),
            description: "Check for reentrancy".into(),
            reward: "5".into(),
            deadline: String::new(),
            skills: "security".into(),
            min_reputation: "50".into(),
        }
    }

    #[test]
    fn reward_scaling_is_exact_for_decimal_input() {
        assert_eq!(to_smallest_units(12.5).expect("must scale"), 12_500_000_000);
        assert_eq!(to_ui_amount(12_500_000_000), 12.5);
        assert_eq!(to_smallest_units(0.000000001).expect("must scale"), 1);
        assert_eq!(to_smallest_units(0.1).expect("must scale"), 100_000_000);
        assert_eq!(to_smallest_units(0.0).expect("must scale"), 0);
    }

    #[test]
    fn sub_unit_amounts_round_to_nearest() {
        assert_eq!(to_smallest_units(0.0000000016).expect("must scale"), 2);
        assert_eq!(to_smallest_units(0.0000000014).expect("must scale"), 1);
        assert_eq!(to_smallest_units(0.0000000001).expect("must scale"), 0);
    }

    #[test]
    fn bad_rewards_are_rejected() {
        assert_eq!(to_smallest_units(-1.0), Err(ValidationError::NegativeAmount));
        assert_eq!(to_smallest_units(f64::NAN), Err(ValidationError::NonFiniteAmount));
        assert_eq!(to_smallest_units(f64::INFINITY), Err(ValidationError::NonFiniteAmount));
        assert_eq!(to_smallest_units(1e12), Err(ValidationError::AmountOverflow));
        assert!(to_smallest_units(1e10).is_ok());

        let form = CreateTaskForm {
            reward: "five".into(),
            ..audit_form()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::InvalidAmount("five".into()))
        );
    }

    #[test]
    fn valid_form_produces_args() {
        let args = audit_form().validate().expect("form must validate");
        assert_eq!(args.title, "Audit contract");
        assert_eq!(args.description, "Check for reentrancy");
        assert_eq!(args.reward, 5_000_000_000);
        assert_eq!(args.deadline, 0);
        assert_eq!(args.skills, vec!["security"]);
        assert_eq!(args.min_reputation, 50);
    }

    #[test]
    fn blank_title_blocks_submission() {
        let form = CreateTaskForm {
            title: "   ".into(),
            ..audit_form()
        };
        assert_eq!(form.validate(), Err(ValidationError::EmptyField("title")));

        let form = CreateTaskForm {
            description: String::new(),
            ..audit_form()
        };
        assert_eq!(form.validate(), Err(ValidationError::EmptyField("description")));
    }

    #[test]
    fn deadline_formats() {
        assert_eq!(parse_deadline("").expect("empty"), 0);
        assert_eq!(parse_deadline("2023-11-14T22:13:20Z").expect("rfc3339"), 1_700_000_000);
        assert_eq!(
            parse_deadline("2023-11-15T00:13:20+02:00").expect("offset"),
            1_700_000_000
        );
        assert_eq!(parse_deadline("2023-11-14T22:13").expect("local"), 1_699_999_980);
        assert_eq!(parse_deadline("2023-11-14T22:13:20").expect("local secs"), 1_700_000_000);
        assert_eq!(parse_deadline("1970-01-02").expect("date"), 86_400);
        assert_eq!(
            parse_deadline("next week"),
            Err(ValidationError::InvalidDeadline("next week".into()))
        );
        assert_eq!(
            parse_deadline("1969-12-31T00:00"),
            Err(ValidationError::NegativeDeadline)
        );
    }

    #[test]
    fn min_reputation_is_clamped_and_truncated() {
        assert_eq!(parse_min_reputation("").expect("empty"), 0);
        assert_eq!(parse_min_reputation("250").expect("high"), 100);
        assert_eq!(parse_min_reputation("-5").expect("low"), 0);
        assert_eq!(parse_min_reputation("42.9").expect("fraction"), 42);
        assert_eq!(
            parse_min_reputation("lots"),
            Err(ValidationError::InvalidReputation("lots".into()))
        );
    }

    #[test]
    fn lists_are_trimmed_and_compacted() {
        assert_eq!(split_list("ai, ml ,, tools"), vec!["ai", "ml", "tools"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn lesson_form_uses_supplied_sequence() {
        let form = PublishLessonForm {
            title: " Borrowck ".into(),
            summary: " Two-phase ".into(),
            content: "Body".into(),
            tags: "rust, ,compiler".into(),
        };
        let args = form.validate().expect("must validate").at_sequence(7);
        assert_eq!(args.sequence, 7);
        assert_eq!(args.title, "Borrowck");
        assert_eq!(args.summary, "Two-phase");
        assert_eq!(args.joined_tags(), "rust,compiler");

        let empty = PublishLessonForm::default();
        assert_eq!(empty.validate(), Err(ValidationError::EmptyField("title")));
    }

    #[test]
    fn profile_blanks_become_none() {
        let form = ProfileForm {
            display_name: " Ada ".into(),
            bio: "   ".into(),
            contact: String::new(),
            timezone: "UTC".into(),
        };
        assert_eq!(
            form.normalize(),
            ProfileFields {
                display_name: Some("Ada".into()),
                bio: None,
                contact: None,
                timezone: Some("UTC".into()),
            }
        );
    }

    #[test]
    fn form_deserializes_from_camel_case_json() {
        let form: CreateTaskForm = serde_json::from_str(
            r#"{"title":"T","description":"D","reward":"1.5","minReputation":"10"}"#,
        )
        .expect("must deserialize");
        let args = form.validate().expect("must validate");
        assert_eq!(args.reward, 1_500_000_000);
        assert_eq!(args.min_reputation, 10);
        assert!(args.skills.is_empty());
    }
}
