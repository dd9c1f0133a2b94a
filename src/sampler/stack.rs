//! Frames, samples and per-thread shadow stacks.
//!
//! Code under profile marks its call-sites with [`enter`] or the
//! [`frame!`](crate::frame) macro. Each call pushes a [`Frame`] on the calling
//! thread's [`ThreadStack`] and returns a [`FrameGuard`] that pops it again on
//! every exit path, unwinding included. The sampler reads these stacks from
//! its background worker through the [`StackSource`] trait.

use crate::utils::error::CaptureError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

/// One call-site identity
///
/// Equality and hashing use the symbol name only. File and line are kept for
/// navigation, so snapshots taken at different lines of the same function
/// still merge into one node.
#[derive(Clone, Serialize, Deserialize)]
pub struct Frame {
    symbol: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<Cow<'static, str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

impl Frame {
    pub fn new(symbol: impl Into<Cow<'static, str>>) -> Self {
        Self {
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Fully-qualified name, e.g. `pkg.db.Query.run`
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Last two dot segments of the symbol, e.g. `Query.run`
    pub fn short_name(&self) -> &str {
        let symbol = self.symbol();
        match symbol.rmatch_indices('.').nth(1) {
            Some((idx, _)) => &symbol[idx + 1..],
            None => symbol,
        }
    }

    /// Symbol plus source position, e.g. `pkg.db.Query.run(src/db.rs:42)`
    pub fn location(&self) -> String {
        match (self.file(), self.line) {
            (Some(file), Some(line)) => format!("{}({}:{})", self.symbol, file, line),
            (Some(file), None) => format!("{}({})", self.symbol, file),
            _ => self.symbol.to_string(),
        }
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Frame {}

impl Hash for Frame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.location())
    }
}

/// One stack snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    frames: Vec<Frame>,
    duration: Duration,
    offset: Duration,
}

impl Sample {
    /// Create a sample from innermost-first frames
    ///
    /// `duration` is the time since the previous sample (or since sampling
    /// started); `offset` is the time since sampling started.
    pub fn new(frames: Vec<Frame>, duration: Duration, offset: Duration) -> Self {
        Self {
            frames,
            duration,
            offset,
        }
    }

    /// Frames, innermost call first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Empty samples carry no call path and are discarded
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Something the sampler can snapshot periodically
pub trait StackSource: Send {
    /// Current call stack, innermost call first
    ///
    /// An empty stack means the target is idle or finished; it is not an error.
    fn capture(&self) -> Result<Vec<Frame>, CaptureError>;

    /// Human-readable name of the target, used in logs and recordings
    fn name(&self) -> String;
}

/// Entered frames, outermost first, each tagged with the id of its guard
#[derive(Default)]
struct Frames {
    entries: Vec<(u64, Frame)>,
    next_id: u64,
}

struct StackInner {
    thread: ThreadId,
    name: Option<String>,
    frames: Mutex<Frames>,
}

/// Shadow call stack of one thread
///
/// Cloning yields another handle to the same stack, which is how a sampler
/// running on a pool thread observes the profiled thread.
#[derive(Clone)]
pub struct ThreadStack {
    inner: Arc<StackInner>,
}

thread_local! {
    static CURRENT: ThreadStack = ThreadStack::for_current_thread();
}

impl ThreadStack {
    /// Handle to the calling thread's stack
    pub fn current() -> Self {
        CURRENT.with(ThreadStack::clone)
    }

    fn for_current_thread() -> Self {
        let current = thread::current();
        Self {
            inner: Arc::new(StackInner {
                thread: current.id(),
                name: current.name().map(str::to_string),
                frames: Mutex::new(Frames::default()),
            }),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.inner.thread
    }

    /// Number of frames currently entered
    pub fn depth(&self) -> usize {
        self.lock().entries.len()
    }

    fn push(&self, frame: Frame) -> u64 {
        let mut frames = self.lock();
        let id = frames.next_id;
        frames.next_id += 1;
        frames.entries.push((id, frame));
        id
    }

    /// Remove the frame entered under `id`, wherever it sits
    fn remove(&self, id: u64) {
        let mut frames = self.lock();
        match frames.entries.iter().rposition(|(entry, _)| *entry == id) {
            Some(index) if index + 1 == frames.entries.len() => {
                frames.entries.pop();
            }
            Some(index) => {
                let (_, frame) = frames.entries.remove(index);
                warn!(
                    "Frame {} left out of order with {} frame(s) still above it",
                    frame.symbol(),
                    frames.entries.len() - index
                );
            }
            None => {}
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Frames> {
        self.inner
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StackSource for ThreadStack {
    fn capture(&self) -> Result<Vec<Frame>, CaptureError> {
        let frames = self.lock();
        Ok(frames
            .entries
            .iter()
            .rev()
            .map(|(_, frame)| frame.clone())
            .collect())
    }

    fn name(&self) -> String {
        match &self.inner.name {
            Some(name) => name.clone(),
            None => format!("{:?}", self.inner.thread),
        }
    }
}

impl fmt::Debug for ThreadStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadStack")
            .field("thread", &self.inner.thread)
            .field("depth", &self.depth())
            .finish()
    }
}

/// Removes its frame from the owning thread's stack when dropped
///
/// Guards dropped out of order remove their own frame, not the top one.
/// Not `Send`: a frame must be left on the thread that entered it.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    stack: ThreadStack,
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.stack.remove(self.id);
    }
}

/// Enter a frame on the calling thread's stack
pub fn enter(symbol: impl Into<Cow<'static, str>>) -> FrameGuard {
    push_frame(Frame::new(symbol))
}

/// Enter a frame with a source position; used by [`frame!`](crate::frame)
pub fn enter_at(symbol: impl Into<Cow<'static, str>>, file: &'static str, line: u32) -> FrameGuard {
    push_frame(Frame::new(symbol).with_location(file, line))
}

fn push_frame(frame: Frame) -> FrameGuard {
    let stack = ThreadStack::current();
    let id = stack.push(frame);
    FrameGuard {
        stack,
        id,
        _not_send: PhantomData,
    }
}

/// Mark the enclosing scope as a frame named `$symbol`
///
/// ```ignore
/// fn query() {
///     let _frame = stackprobe::frame!("app.db.Query.run");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! frame {
    ($symbol:expr) => {
        $crate::sampler::enter_at($symbol, file!(), line!())
    };
}
