use std::sync::Arc;

use tokio::sync::watch;

use caption_core::captions::CaptionFragment;
use caption_core::record::Transcript;
use caption_store::error::StoreError;
use caption_store::transcripts::TranscriptRepo;

use crate::auth::AuthHandle;

/// The caption-finalization path.
///
/// Final fragments become new unsynced transcript records owned by
/// whoever is currently signed in (ownerless if nobody is). Interim
/// fragments only update the published display line and are never
/// persisted. Sync state has no bearing here: captioning continues
/// regardless of what the reconciler is doing.
pub struct CaptionIngest {
    repo: TranscriptRepo,
    auth: AuthHandle,
    interim_tx: Arc<watch::Sender<String>>,
}

impl CaptionIngest {
    pub fn new(repo: TranscriptRepo, auth: AuthHandle) -> Self {
        let (interim_tx, _) = watch::channel(String::new());
        Self {
            repo,
            auth,
            interim_tx: Arc::new(interim_tx),
        }
    }

    /// Accept one fragment from the speech engine. Returns the stored
    /// record for finals; None for interims and whitespace-only finals.
    pub fn accept(&self, fragment: &CaptionFragment) -> Result<Option<Transcript>, StoreError> {
        if !fragment.is_final {
            self.interim_tx.send_replace(fragment.text.clone());
            return Ok(None);
        }

        let text = fragment.text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        // A final supersedes whatever interim line was showing
        self.interim_tx.send_replace(String::new());

        let record = Transcript::new(text, self.auth.current());
        let saved = self.repo.save(&record)?;
        Ok(Some(saved))
    }

    /// The current interim (not-yet-final) caption line.
    pub fn interim(&self) -> watch::Receiver<String> {
        self.interim_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caption_core::ids::UserId;
    use caption_store::database::Database;

    fn setup() -> (CaptionIngest, TranscriptRepo, AuthHandle) {
        let db = Database::in_memory().unwrap();
        let auth = AuthHandle::new();
        let ingest = CaptionIngest::new(TranscriptRepo::new(db.clone()), auth.clone());
        (ingest, TranscriptRepo::new(db), auth)
    }

    #[test]
    fn final_fragment_becomes_unsynced_record() {
        let (ingest, repo, auth) = setup();
        auth.sign_in(UserId::from_raw("u1"));

        let saved = ingest
            .accept(&CaptionFragment::finalized("hello world"))
            .unwrap()
            .expect("final fragment should persist");

        assert_eq!(saved.text, "hello world");
        assert!(!saved.synced);
        assert_eq!(saved.user_id.as_ref().map(|u| u.as_str()), Some("u1"));
        assert_eq!(repo.unsynced().unwrap().len(), 1);
    }

    #[test]
    fn final_without_identity_is_ownerless() {
        let (ingest, _, _) = setup();
        let saved = ingest
            .accept(&CaptionFragment::finalized("anonymous"))
            .unwrap()
            .unwrap();
        assert!(saved.user_id.is_none());
    }

    #[test]
    fn interim_fragment_not_persisted() {
        let (ingest, repo, _) = setup();
        let result = ingest.accept(&CaptionFragment::interim("uh, so")).unwrap();
        assert!(result.is_none());
        assert!(repo.list().unwrap().is_empty());
        assert_eq!(*ingest.interim().borrow(), "uh, so");
    }

    #[test]
    fn final_clears_interim_line() {
        let (ingest, _, _) = setup();
        ingest.accept(&CaptionFragment::interim("hel")).unwrap();
        ingest.accept(&CaptionFragment::finalized("hello")).unwrap();
        assert_eq!(*ingest.interim().borrow(), "");
    }

    #[test]
    fn blank_final_dropped() {
        let (ingest, repo, _) = setup();
        let result = ingest.accept(&CaptionFragment::finalized("   ")).unwrap();
        assert!(result.is_none());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn final_text_is_trimmed() {
        let (ingest, _, _) = setup();
        let saved = ingest
            .accept(&CaptionFragment::finalized("  trailing space "))
            .unwrap()
            .unwrap();
        assert_eq!(saved.text, "trailing space");
    }
}
