use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids::{TranscriptId, UserId};

/// Wall-clock time in epoch milliseconds, the unit the transcript table
/// stores and the remote expects in the `updated` column.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// One finalized caption fragment plus its sync metadata.
///
/// `text` is immutable after creation (captions have no edit path);
/// `updated` is refreshed on every store write, including the sync flip;
/// `synced` is only ever flipped to true by the reconciler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: TranscriptId,
    pub text: String,
    pub updated: i64,
    pub user_id: Option<UserId>,
    pub synced: bool,
}

impl Transcript {
    /// A fresh unsynced record for a finalized caption fragment.
    pub fn new(text: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            id: TranscriptId::new(),
            text: text.into(),
            updated: now_ms(),
            user_id,
            synced: false,
        }
    }

    /// Project to the transport row sent to the remote store.
    /// `fallback` fills in a missing owner; it never overwrites one.
    pub fn to_row(&self, fallback: Option<&UserId>) -> TranscriptRow {
        TranscriptRow {
            id: self.id.clone(),
            text: self.text.clone(),
            updated: self.updated,
            user_id: self.user_id.clone().or_else(|| fallback.cloned()),
        }
    }
}

/// Row shape accepted by the remote `transcripts` table upsert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub id: TranscriptId,
    pub text: String,
    pub updated: i64,
    pub user_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_unsynced() {
        let t = Transcript::new("hello world", None);
        assert!(!t.synced);
        assert!(t.user_id.is_none());
        assert!(t.updated > 0);
        assert!(t.id.as_str().starts_with("t_"));
    }

    #[test]
    fn new_record_keeps_owner() {
        let user = UserId::from_raw("u1");
        let t = Transcript::new("hello", Some(user.clone()));
        assert_eq!(t.user_id.as_ref(), Some(&user));
    }

    #[test]
    fn row_fallback_fills_missing_owner() {
        let t = Transcript::new("no owner", None);
        let fallback = UserId::from_raw("u2");
        let row = t.to_row(Some(&fallback));
        assert_eq!(row.user_id.as_ref(), Some(&fallback));
    }

    #[test]
    fn row_fallback_never_overwrites_owner() {
        let owner = UserId::from_raw("u1");
        let fallback = UserId::from_raw("u2");
        let t = Transcript::new("owned", Some(owner.clone()));
        let row = t.to_row(Some(&fallback));
        assert_eq!(row.user_id.as_ref(), Some(&owner));
    }

    #[test]
    fn row_without_fallback_stays_unowned() {
        let t = Transcript::new("no owner", None);
        let row = t.to_row(None);
        assert!(row.user_id.is_none());
    }

    #[test]
    fn row_json_field_names() {
        let row = TranscriptRow {
            id: TranscriptId::from_raw("t_1"),
            text: "hi".into(),
            updated: 1_700_000_000_000,
            user_id: Some(UserId::from_raw("u1")),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], "t_1");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["updated"], 1_700_000_000_000i64);
        assert_eq!(json["user_id"], "u1");
    }

    #[test]
    fn now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
