use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

pub const BULK_REFRESH_MS: u64 = 300_000;
pub const UNASSIGNED_CAROUSEL_MS: u64 = 5_000;
pub const PAGE_ROTATION_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    BulkRefresh,
    UnassignedCarousel,
    PageRotation,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::BulkRefresh => "bulk_refresh",
            TimerKind::UnassignedCarousel => "unassigned_carousel",
            TimerKind::PageRotation => "page_rotation",
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(match self {
            TimerKind::BulkRefresh => BULK_REFRESH_MS,
            TimerKind::UnassignedCarousel => UNASSIGNED_CAROUSEL_MS,
            TimerKind::PageRotation => PAGE_ROTATION_MS,
        })
    }

    fn fires_immediately(&self) -> bool {
        matches!(self, TimerKind::BulkRefresh)
    }
}

/// Data the timer set depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleShape {
    pub unassigned_len: usize,
    /// Bumped every time the unassigned sequence is replaced.
    pub unassigned_revision: u64,
    pub candidate_count: usize,
    pub total_pages: usize,
}

/// Timers that should be armed, each with the identity it was armed for. A
/// changed identity means the timer is torn down and rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePlan {
    timers: Vec<(TimerKind, u64)>,
}

impl SchedulePlan {
    pub fn for_shape(shape: &ScheduleShape) -> Self {
        let mut timers = vec![(TimerKind::BulkRefresh, 0)];
        if shape.unassigned_len > 0 {
            timers.push((TimerKind::UnassignedCarousel, shape.unassigned_revision));
        }
        if shape.total_pages > 1 {
            timers.push((TimerKind::PageRotation, shape.candidate_count as u64));
        }
        Self { timers }
    }

    pub fn contains(&self, kind: TimerKind) -> bool {
        self.identity(kind).is_some()
    }

    pub fn identity(&self, kind: TimerKind) -> Option<u64> {
        self.timers
            .iter()
            .find(|(armed, _)| *armed == kind)
            .map(|(_, identity)| *identity)
    }
}

struct ArmedTimer {
    identity: u64,
    handle: JoinHandle<()>,
}

/// Owns the periodic timers. Each armed timer is a task sending its kind on
/// the tick channel; tasks are aborted on re-arm, on disarm and on drop.
pub struct Scheduler {
    tx: mpsc::Sender<TimerKind>,
    armed: HashMap<TimerKind, ArmedTimer>,
}

impl Scheduler {
    pub fn new(tx: mpsc::Sender<TimerKind>) -> Self {
        Self {
            tx,
            armed: HashMap::new(),
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    pub fn reconcile(&mut self, plan: &SchedulePlan) {
        let stale: Vec<TimerKind> = self
            .armed
            .iter()
            .filter(|(kind, timer)| plan.identity(**kind) != Some(timer.identity))
            .map(|(kind, _)| *kind)
            .collect();
        for kind in stale {
            self.disarm(kind);
        }

        for (kind, identity) in &plan.timers {
            if !self.armed.contains_key(kind) {
                self.arm(*kind, *identity);
            }
        }
    }

    fn arm(&mut self, kind: TimerKind, identity: u64) {
        debug!(timer = kind.as_str(), identity, "arming timer");
        let tx = self.tx.clone();
        let period = kind.period();
        let start = if kind.fires_immediately() {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(kind).await.is_err() {
                    break;
                }
            }
        });
        self.armed.insert(kind, ArmedTimer { identity, handle });
    }

    fn disarm(&mut self, kind: TimerKind) {
        if let Some(timer) = self.armed.remove(&kind) {
            debug!(timer = kind.as_str(), "disarming timer");
            timer.handle.abort();
        }
    }

    pub fn shutdown(&mut self) {
        for (_, timer) in self.armed.drain() {
            timer.handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
