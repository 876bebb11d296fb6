use gloo_timers::callback::Interval;

/// Source of repeating callbacks. Dropping the returned handle cancels it.
pub trait Scheduler {
    type Handle;

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Self::Handle;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    type Handle = Interval;

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Interval {
        Interval::new(period_ms, tick)
    }
}

/// A single repeating timer owned by one widget.
///
/// At most one handle is alive at a time: restarting drops the previous
/// handle before the next one is scheduled.
pub struct AutoplayTimer<S: Scheduler> {
    scheduler: S,
    period_ms: u32,
    handle: Option<S::Handle>,
}

impl<S: Scheduler> AutoplayTimer<S> {
    pub fn new(scheduler: S, period_ms: u32) -> Self {
        Self {
            scheduler,
            period_ms,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn restart(&mut self, tick: Box<dyn FnMut()>) {
        self.stop();
        self.handle = Some(self.scheduler.every(self.period_ms, tick));
    }

    pub fn stop(&mut self) {
        self.handle.take();
    }
}
