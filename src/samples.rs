//! Sample records and the store that threads them through a run.

pub mod loader;
pub mod record;
pub mod store;

pub use record::Mate;
pub use record::RecordUpdate;
pub use record::SampleRecord;
pub use record::StageKind;
pub use store::SampleStore;
pub use store::Unit;
