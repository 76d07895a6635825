use serde::{Deserialize, Serialize};

/// One fragment emitted by the external speech-recognition engine.
///
/// Interim fragments are provisional display text and are never persisted;
/// a final fragment becomes a transcript record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionFragment {
    pub text: String,
    pub is_final: bool,
}

impl CaptionFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_finality() {
        assert!(!CaptionFragment::interim("uh").is_final);
        assert!(CaptionFragment::finalized("hello world.").is_final);
    }

    #[test]
    fn serde_roundtrip() {
        let frag = CaptionFragment::finalized("testing one two");
        let json = serde_json::to_string(&frag).unwrap();
        let parsed: CaptionFragment = serde_json::from_str(&json).unwrap();
        assert_eq!(frag, parsed);
    }
}
