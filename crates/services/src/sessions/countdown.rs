use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use exam_core::session::{ExamSession, TickOutcome};

use super::persist::PersistHandle;
use super::workflow::ExamSessionService;

/// Source of countdown ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick; `false` means no more ticks will come.
    async fn tick(&mut self) -> bool;
}

/// One tick per second of wall time, first tick one second after creation.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    #[must_use]
    pub fn every(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    #[must_use]
    pub fn every_second() -> Self {
        Self::every(Duration::from_secs(1))
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Why a countdown stopped.
#[derive(Debug, Clone)]
pub enum CountdownEnd {
    /// The limit ran out and the session was submitted.
    Expired(PersistHandle),
    /// Already submitted, or no time limit.
    Stopped,
    TickerClosed,
    Cancelled,
}

/// Background countdown over a shared session.
pub struct Countdown;

impl Countdown {
    /// Spawn the countdown task. Dropping the handle stops it.
    #[must_use]
    pub fn spawn<T>(
        service: ExamSessionService,
        session: Arc<Mutex<ExamSession>>,
        mut ticker: T,
    ) -> CountdownHandle
    where
        T: Ticker + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                if !ticker.tick().await {
                    return CountdownEnd::TickerClosed;
                }
                let report = service.tick(&mut *session.lock().await);
                match report.outcome {
                    TickOutcome::Running { .. } => {}
                    TickOutcome::Expired => {
                        return match report.persistence {
                            Some(handle) => CountdownEnd::Expired(handle),
                            None => CountdownEnd::Stopped,
                        };
                    }
                    TickOutcome::Untimed | TickOutcome::Finished => return CountdownEnd::Stopped,
                }
            }
        });
        CountdownHandle { task: Some(task) }
    }
}

/// Owner of a running countdown; aborts the task on drop.
#[derive(Debug)]
pub struct CountdownHandle {
    task: Option<JoinHandle<CountdownEnd>>,
}

impl CountdownHandle {
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the countdown to stop.
    pub async fn join(mut self) -> CountdownEnd {
        let Some(task) = self.task.take() else {
            return CountdownEnd::Cancelled;
        };
        task.await.unwrap_or(CountdownEnd::Cancelled)
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
