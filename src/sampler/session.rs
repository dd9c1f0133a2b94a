//! Sampler lifecycle: `idle -> running -> stopped`.
//!
//! A [`Sampler`] binds to one target stack, schedules a capture task on the
//! shared [`SamplingPool`], and on [`Sampler::stop`] takes the task state back
//! as an immutable [`Recording`]. A stopped sampler is terminal; create a new
//! one per profiling session.

use super::pool::{Periodic, SamplingPool, TaskHandle};
use super::stack::{Sample, StackSource, ThreadStack};
use crate::tree::{build_call_tree, CallTree};
use crate::utils::config::DEFAULT_SAMPLING_PERIOD;
use crate::utils::error::SamplerError;
use log::{debug, info, trace, warn};
use std::time::{Duration, Instant};

/// Periodic capture of one target stack
struct CaptureTask {
    source: Box<dyn StackSource>,
    started: Instant,
    last_capture: Instant,
    samples: Vec<Sample>,
    failed_ticks: u64,
}

impl Periodic for CaptureTask {
    fn tick(&mut self) {
        let now = Instant::now();
        match self.source.capture() {
            // Idle target: no sample, and the clock stays where it was.
            Ok(frames) if frames.is_empty() => {
                trace!("Empty stack on {}, tick skipped", self.source.name());
            }
            Ok(frames) => {
                let duration = now.saturating_duration_since(self.last_capture);
                let offset = now.saturating_duration_since(self.started);
                self.samples.push(Sample::new(frames, duration, offset));
                self.last_capture = now;
            }
            Err(e) => {
                self.failed_ticks += 1;
                warn!("Stack capture on {} failed: {}", self.source.name(), e);
            }
        }
    }
}

enum State {
    Idle(Box<dyn StackSource>),
    Running {
        handle: TaskHandle<CaptureTask>,
        started: Instant,
        target: String,
    },
    Stopped,
}

/// Sampling profiler bound to a single thread
pub struct Sampler {
    period: Duration,
    pool: &'static SamplingPool,
    state: State,
}

impl Sampler {
    /// Sampler for the calling thread
    ///
    /// # Errors
    /// * `SamplerError::InvalidPeriod` - period is zero
    pub fn new(period: Duration) -> Result<Self, SamplerError> {
        Self::with_source(period, ThreadStack::current())
    }

    /// Sampler reading an arbitrary stack source
    pub fn with_source(
        period: Duration,
        source: impl StackSource + 'static,
    ) -> Result<Self, SamplerError> {
        if period.is_zero() {
            return Err(SamplerError::InvalidPeriod(period));
        }
        Ok(Self {
            period,
            pool: SamplingPool::global(),
            state: State::Idle(Box::new(source)),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Begin periodic sampling
    ///
    /// # Errors
    /// * `SamplerError::AlreadyStarted` - sampler is running
    /// * `SamplerError::AlreadyStopped` - sampler was used before
    pub fn start(&mut self) -> Result<(), SamplerError> {
        let source = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Idle(source) => source,
            running @ State::Running { .. } => {
                self.state = running;
                return Err(SamplerError::AlreadyStarted);
            }
            State::Stopped => return Err(SamplerError::AlreadyStopped),
        };

        let target = source.name();
        let started = Instant::now();
        let task = CaptureTask {
            source,
            started,
            last_capture: started,
            samples: Vec::new(),
            failed_ticks: 0,
        };

        let handle = self.pool.schedule(task, self.period)?;
        info!("Sampling {} every {:?}", target, self.period);

        self.state = State::Running {
            handle,
            started,
            target,
        };
        Ok(())
    }

    /// Stop sampling and return everything captured so far
    ///
    /// # Errors
    /// * `SamplerError::NotStarted` - `start` was never called
    /// * `SamplerError::AlreadyStopped` - called twice
    pub fn stop(&mut self) -> Result<Recording, SamplerError> {
        let (handle, started, target) = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running {
                handle,
                started,
                target,
            } => (handle, started, target),
            idle @ State::Idle(_) => {
                self.state = idle;
                return Err(SamplerError::NotStarted);
            }
            State::Stopped => return Err(SamplerError::AlreadyStopped),
        };

        let (samples, failed_ticks) = match handle.cancel() {
            Some(task) => (task.samples, task.failed_ticks),
            None => (Vec::new(), 0),
        };
        // Measured after cancel so no sample can be stamped past it.
        let last_offset = samples.last().map_or(Duration::ZERO, Sample::offset);
        let elapsed = started.elapsed().max(last_offset);

        debug!(
            "Stopped sampling {}: {} samples, {} failed ticks in {:?}",
            target,
            samples.len(),
            failed_ticks,
            elapsed
        );

        Ok(Recording {
            samples,
            elapsed,
            period: self.period,
            target: Some(target),
            failed_ticks,
        })
    }
}

/// Immutable result of one profiling session
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    samples: Vec<Sample>,
    elapsed: Duration,
    period: Duration,
    target: Option<String>,
    failed_ticks: u64,
}

impl Recording {
    /// Assemble a recording from stored samples
    pub fn new(samples: Vec<Sample>, elapsed: Duration, period: Duration) -> Self {
        Self {
            samples,
            elapsed,
            period,
            target: None,
            failed_ticks: 0,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_failed_ticks(mut self, failed_ticks: u64) -> Self {
        self.failed_ticks = failed_ticks;
        self
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Wall-clock time from `start()` to `stop()`
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Name of the sampled thread
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn failed_ticks(&self) -> u64 {
        self.failed_ticks
    }

    /// Sum of sample durations; never exceeds [`Recording::elapsed`]
    pub fn sampled_time(&self) -> Duration {
        self.samples.iter().map(Sample::duration).sum()
    }

    pub fn call_tree(&self) -> CallTree {
        build_call_tree(&self.samples, self.elapsed)
    }
}

/// Run `f` on the calling thread under a fresh sampler
///
/// The sampler is released on every exit path: a panic in `f` unwinds through
/// the sampler's drop, which cancels its task, and then continues unchanged.
///
/// # Example
/// ```ignore
/// let (answer, recording) = stackprobe::profile(Duration::from_millis(5), || {
///     let _frame = stackprobe::frame!("app.Main.compute");
///     compute()
/// })?;
/// ```
pub fn profile<R>(
    period: Duration,
    f: impl FnOnce() -> R,
) -> Result<(R, Recording), SamplerError> {
    let mut sampler = Sampler::new(period)?;
    sampler.start()?;
    let result = f();
    let recording = sampler.stop()?;
    Ok((result, recording))
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            period: DEFAULT_SAMPLING_PERIOD,
            pool: SamplingPool::global(),
            state: State::Idle(Box::new(ThreadStack::current())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::stack::Frame;
    use crate::utils::error::CaptureError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Replays a fixed list of stacks, then reports an empty stack
    struct Scripted {
        stacks: Vec<Vec<&'static str>>,
        next: Arc<AtomicUsize>,
    }

    impl StackSource for Scripted {
        fn capture(&self) -> Result<Vec<Frame>, CaptureError> {
            let index = self.next.fetch_add(1, Ordering::SeqCst);
            match self.stacks.get(index) {
                Some(stack) if stack == &["<fail>"] => {
                    Err(CaptureError::Failed("scripted failure".to_string()))
                }
                Some(stack) => Ok(stack.iter().map(|s| Frame::new(*s)).collect()),
                None => Ok(Vec::new()),
            }
        }

        fn name(&self) -> String {
            "scripted".to_string()
        }
    }

    fn wait_for(counter: &AtomicUsize, at_least: usize) {
        for _ in 0..500 {
            if counter.load(Ordering::SeqCst) >= at_least {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_stop_before_start_is_error() {
        let mut sampler = Sampler::new(Duration::from_millis(5)).unwrap();
        assert_eq!(sampler.stop().unwrap_err(), SamplerError::NotStarted);
        // still usable afterwards
        sampler.start().unwrap();
        assert!(sampler.stop().is_ok());
    }

    #[test]
    fn test_double_start_and_restart_are_errors() {
        let mut sampler = Sampler::new(Duration::from_millis(5)).unwrap();
        sampler.start().unwrap();
        assert_eq!(sampler.start().unwrap_err(), SamplerError::AlreadyStarted);
        assert!(sampler.is_running());
        sampler.stop().unwrap();
        assert_eq!(sampler.start().unwrap_err(), SamplerError::AlreadyStopped);
        assert_eq!(sampler.stop().unwrap_err(), SamplerError::AlreadyStopped);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            Sampler::new(Duration::ZERO),
            Err(SamplerError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_failed_and_empty_ticks_are_skipped() {
        let next = Arc::new(AtomicUsize::new(0));
        let source = Scripted {
            stacks: vec![
                vec!["pkg.A", "pkg.Main"],
                vec!["<fail>"],
                vec![],
                vec!["pkg.B", "pkg.Main"],
            ],
            next: Arc::clone(&next),
        };

        let mut sampler = Sampler::with_source(Duration::from_millis(2), source).unwrap();
        sampler.start().unwrap();
        wait_for(&next, 6);
        let recording = sampler.stop().unwrap();

        assert_eq!(recording.samples().len(), 2);
        assert_eq!(recording.failed_ticks(), 1);
        assert_eq!(recording.samples()[1].frames()[0].symbol(), "pkg.B");
        // the skipped ticks are absorbed by the next successful sample
        assert!(recording.samples()[1].duration() >= Duration::from_millis(4));
    }

    #[test]
    fn test_sampled_time_bounded_by_elapsed() {
        let next = Arc::new(AtomicUsize::new(0));
        let source = Scripted {
            stacks: vec![vec!["pkg.Main"]; 5],
            next: Arc::clone(&next),
        };
        let mut sampler = Sampler::with_source(Duration::from_millis(2), source).unwrap();
        sampler.start().unwrap();
        wait_for(&next, 8);
        let recording = sampler.stop().unwrap();

        let last_offset = recording.samples().last().map(Sample::offset).unwrap();
        assert_eq!(recording.sampled_time(), last_offset);
        assert!(recording.sampled_time() <= recording.elapsed());
    }

    #[test]
    fn test_elapsed_covers_every_sample_offset() {
        for _ in 0..20 {
            let next = Arc::new(AtomicUsize::new(0));
            let source = Scripted {
                stacks: vec![vec!["pkg.Main"]; 1000],
                next: Arc::clone(&next),
            };
            let mut sampler = Sampler::with_source(Duration::from_millis(1), source).unwrap();
            sampler.start().unwrap();
            wait_for(&next, 3);
            let recording = sampler.stop().unwrap();

            for sample in recording.samples() {
                assert!(sample.offset() <= recording.elapsed());
            }
            assert!(recording.sampled_time() <= recording.elapsed());
        }
    }

    #[test]
    fn test_profile_returns_result_and_recording() {
        let (value, recording) = profile(Duration::from_millis(5), || {
            let _main = crate::sampler::enter("pkg.Main");
            thread::sleep(Duration::from_millis(30));
            42
        })
        .unwrap();

        assert_eq!(value, 42);
        assert!(!recording.samples().is_empty());
        assert!(recording
            .samples()
            .iter()
            .all(|s| s.frames().last().map(Frame::symbol) == Some("pkg.Main")));
    }

    #[test]
    fn test_panic_in_profiled_code_propagates() {
        let result = std::panic::catch_unwind(|| {
            profile::<()>(Duration::from_millis(5), || panic!("profiled code failed"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_dropping_running_sampler_cancels_task() {
        let next = Arc::new(AtomicUsize::new(0));
        let source = Scripted {
            stacks: Vec::new(),
            next: Arc::clone(&next),
        };
        let mut sampler = Sampler::with_source(Duration::from_millis(2), source).unwrap();
        sampler.start().unwrap();
        wait_for(&next, 1);
        drop(sampler);

        thread::sleep(Duration::from_millis(10));
        let after_drop = next.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(next.load(Ordering::SeqCst), after_drop);
    }
}
