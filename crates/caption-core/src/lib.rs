pub mod captions;
pub mod errors;
pub mod ids;
pub mod record;
pub mod remote;

pub use captions::CaptionFragment;
pub use errors::RemoteError;
pub use ids::{TranscriptId, UserId};
pub use record::{now_ms, Transcript, TranscriptRow};
pub use remote::RemoteStore;
