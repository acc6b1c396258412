//! Recording mocks shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use dpi::PhysicalSize;
use surface_render_thread::{
    BackendError, GraphicsBackend, LoggingConfig, RenderCallback, SurfaceConfig, SwapResult,
    init_logging,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(200);

pub fn init() {
    init_logging(LoggingConfig {
        is_test: true,
        ..LoggingConfig::default()
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Exit,
    Pause,
    Resume,
    SurfaceCreated,
    SurfaceChanged(u32, u32),
    Draw,
    Callable(u32),
    Note(String),
}

type DrawHook = Box<dyn FnMut() + Send>;

pub struct MockCallback {
    tx: Sender<Event>,
    draw_hook: Option<DrawHook>,
    frame_delay: Duration,
}

impl MockCallback {
    pub fn new() -> (Self, Receiver<Event>) {
        let (tx, rx) = unbounded();
        (
            Self {
                tx,
                draw_hook: None,
                frame_delay: Duration::from_millis(1),
            },
            rx,
        )
    }

    pub fn with_draw_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.draw_hook = Some(Box::new(hook));
        self
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl RenderCallback for MockCallback {
    fn on_start(&mut self) {
        self.send(Event::Start);
    }

    fn on_exit(&mut self) {
        self.send(Event::Exit);
    }

    fn on_pause(&mut self) {
        self.send(Event::Pause);
    }

    fn on_resume(&mut self) {
        self.send(Event::Resume);
    }

    fn on_surface_created(&mut self, _config: &SurfaceConfig) {
        self.send(Event::SurfaceCreated);
    }

    fn on_surface_changed(&mut self, size: PhysicalSize<u32>) {
        self.send(Event::SurfaceChanged(size.width, size.height));
    }

    fn on_draw_frame(&mut self) -> bool {
        self.send(Event::Draw);
        if let Some(hook) = self.draw_hook.as_mut() {
            hook();
        }
        thread::sleep(self.frame_delay);
        true
    }
}

/// Live-context bookkeeping shared by every backend of one test.
#[derive(Debug, Default)]
pub struct ContextLedger {
    live: AtomicUsize,
    max_live: AtomicUsize,
}

impl ContextLedger {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    fn created(&self) {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
    }

    fn destroyed(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct BackendStats {
    pub contexts_created: AtomicU32,
    pub contexts_destroyed: AtomicU32,
    pub surfaces_created: AtomicU32,
    pub surfaces_destroyed: AtomicU32,
    pub terminations: AtomicU32,
    pub swaps: AtomicU32,
    pub fail_context: AtomicBool,
    swap_script: Mutex<VecDeque<SwapResult>>,
}

impl BackendStats {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    pub fn script_swaps(&self, results: impl IntoIterator<Item = SwapResult>) {
        self.swap_script.lock().unwrap().extend(results);
    }
}

pub struct MockBackend {
    pub stats: Arc<BackendStats>,
    ledger: Arc<ContextLedger>,
    has_context: bool,
}

impl MockBackend {
    pub fn new(ledger: Arc<ContextLedger>) -> (Self, Arc<BackendStats>) {
        let stats = Arc::new(BackendStats::default());
        (
            Self {
                stats: stats.clone(),
                ledger,
                has_context: false,
            },
            stats,
        )
    }
}

impl GraphicsBackend for MockBackend {
    fn create_context(&mut self) -> Result<(), BackendError> {
        if self.stats.fail_context.load(Ordering::SeqCst) {
            return Err(BackendError::ContextCreation("no config matched".into()));
        }
        assert!(!self.has_context, "context created twice");
        self.has_context = true;
        self.ledger.created();
        self.stats.contexts_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy_context(&mut self) {
        assert!(self.has_context, "destroying a missing context");
        self.has_context = false;
        self.ledger.destroyed();
        self.stats.contexts_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn create_surface(&mut self) -> bool {
        assert!(self.has_context, "surface created without a context");
        self.stats.surfaces_created.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn destroy_surface(&mut self) {
        self.stats.surfaces_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn swap_buffers(&mut self) -> SwapResult {
        self.stats.swaps.fetch_add(1, Ordering::SeqCst);
        self.stats
            .swap_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SwapResult::Success)
    }

    fn terminate(&mut self) {
        self.stats.terminations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Receives until `done` matches an event or the timeout expires; returns what was seen.
pub fn recv_until(rx: &Receiver<Event>, mut done: impl FnMut(&Event) -> bool) -> Vec<Event> {
    let deadline = Instant::now() + TIMEOUT;
    let mut seen = Vec::new();
    while let Ok(event) = rx.recv_deadline(deadline) {
        let stop = done(&event);
        seen.push(event);
        if stop {
            return seen;
        }
    }
    panic!("timed out waiting for event; saw {seen:?}");
}

pub fn count_draws(rx: &Receiver<Event>, n: usize) -> Vec<Event> {
    let mut draws = 0;
    recv_until(rx, |event| {
        if *event == Event::Draw {
            draws += 1;
        }
        draws >= n
    })
}

/// Everything received within `window`.
pub fn drain_for(rx: &Receiver<Event>, window: Duration) -> Vec<Event> {
    let deadline = Instant::now() + window;
    let mut seen = Vec::new();
    while let Ok(event) = rx.recv_deadline(deadline) {
        seen.push(event);
    }
    seen
}

pub fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(2));
    }
}
