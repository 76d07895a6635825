pub mod database;
pub mod error;
pub mod meta;
pub mod row_helpers;
pub mod schema;
pub mod transcripts;

pub use database::Database;
pub use error::StoreError;
pub use meta::MetaRepo;
pub use transcripts::{StoreCounts, TranscriptRepo};
