//! Persistence, the analysis pipeline, session scheduling and report delivery.

pub mod notifier;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod usage;

pub use notifier::{parse_recipient, Notifier, SmtpNotifier};
pub use pipeline::AnalysisPipeline;
pub use scheduler::SessionScheduler;
pub use store::Store;
pub use usage::StoreUsageLog;
