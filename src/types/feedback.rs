//! Assistant feedback records from the `v4-feedback` collection

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FeedbackType {
    #[serde(rename = "thumbsUp")]
    ThumbsUp,
    #[serde(rename = "thumbsDown")]
    ThumbsDown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialogTurn {
    #[serde(default)]
    pub text: String,
}

/// Stored shape of a feedback document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFields {
    #[serde(default)]
    pub dialog: Vec<DialogTurn>,
    pub feedback_type: FeedbackType,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub id: String,
    pub dialog: Vec<DialogTurn>,
    pub feedback_type: FeedbackType,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct FeedbackSummary {
    pub total: u64,
    pub thumbs_up: u64,
    pub thumbs_down: u64,
}

impl FeedbackSummary {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.feedback_type {
                FeedbackType::ThumbsUp => acc.thumbs_up += 1,
                FeedbackType::ThumbsDown => acc.thumbs_down += 1,
            }
            acc
        })
    }
}
