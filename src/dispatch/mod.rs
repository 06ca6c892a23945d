//! Dispatch: turns detected mentions into persona replies.

pub mod fallback;
pub mod router;
pub mod traits;

pub use fallback::fallback_response;
pub use router::MentionRouter;
pub use traits::{
    DispatchContext, DispatchFailure, DispatchObserver, DispatchOutcome, DispatchRequest,
    ProducerError, ResponseProducer, ResponseSource,
};
