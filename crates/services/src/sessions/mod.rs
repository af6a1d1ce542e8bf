mod countdown;
mod persist;
mod workflow;

// Public API of the session subsystem.
pub use countdown::{Countdown, CountdownEnd, CountdownHandle, IntervalTicker, Ticker};
pub use exam_core::session::{ExamSession, SessionConfig, SessionError, TickOutcome};
pub use persist::{PersistHandle, PersistStatus};
pub use workflow::{ExamSessionService, SubmitOutcome, TickReport};
