pub mod assistant;
pub mod cancel;
pub mod cleanup;

pub use assistant::{Assistant, AssistantStats, Reply, ReplySource};
pub use cancel::CancelToken;
pub use cleanup::{CleanupReport, CleanupScheduler, CleanupTiming, RetentionPurge};
