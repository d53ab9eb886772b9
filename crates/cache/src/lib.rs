//! In-process caches in front of the slow paths.
//!
//! - [`CallCache`] memoizes shop API reads by [`CallSignature`] for a
//!   bounded expiry window.  Expiry is checked lazily on read; there is no
//!   eviction thread.
//! - [`QuickAnswers`] short-circuits the agent for greetings and other
//!   canonical questions, with a runtime cache of previously resolved
//!   answers.

pub mod call_cache;
pub mod canned;
pub mod quick_answer;
pub mod signature;

pub use call_cache::{CacheEntry, CallCache};
pub use quick_answer::{is_general_question, normalize, AnswerSource, QuickAnswer, QuickAnswers};
pub use signature::CallSignature;
