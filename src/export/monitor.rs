//! Export progress monitor
//!
//! Owns the lifecycle of one export session: streams toolchain output
//! into the session log, pauses on questions for the user, and resolves
//! to success or failure. The monitor itself lives on the UI-owning
//! context; workers talk to it through a [`MonitorHandle`] and the
//! display event channel, never by mutating shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use super::events::DisplayEvent;
use super::state::ExportState;
use super::stream::OutputStream;

/// Bytes read from the toolchain per poll iteration
const READ_CHUNK: usize = 1024;

/// Default sleep between poll iterations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One-slot rendezvous between a blocked export worker and the user's
/// confirmation. A single prompt may be outstanding at a time, so a
/// flag and condvar are all this needs.
struct PromptGate {
    confirmed: Mutex<bool>,
    signal: Condvar,
}

struct Shared {
    stop: AtomicBool,
    prompt: PromptGate,
}

/// Worker-side handle to the monitor
///
/// Cheap to clone; safe to move into the poller thread and the export
/// driver. Everything it does is marshaled to the UI-owning context
/// through the display event channel.
pub struct MonitorHandle {
    shared: Arc<Shared>,
    events: Sender<DisplayEvent>,
}

impl Clone for MonitorHandle {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
        }
    }
}

impl MonitorHandle {
    /// Append a chunk of text to the session log. Empty chunks are dropped.
    pub fn post_log(&self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            let _ = self.events.send(DisplayEvent::Output(text));
        }
    }

    /// Ask the user a question and block this worker until it is confirmed.
    ///
    /// Only one prompt may be outstanding; the session stays in
    /// `WaitingForUserInput` until [`ExportMonitor::confirm_user_input`]
    /// runs on the UI-owning context. Never call this from that context -
    /// it would block the only thread able to unblock it.
    pub fn request_user_input(&self, message: impl Into<String>) {
        {
            let mut confirmed = self.shared.prompt.confirmed.lock().unwrap();
            *confirmed = false;
        }

        let _ = self
            .events
            .send(DisplayEvent::PromptRequested(message.into()));

        let mut confirmed = self.shared.prompt.confirmed.lock().unwrap();
        while !*confirmed {
            confirmed = self.shared.prompt.signal.wait(confirmed).unwrap();
        }
    }

    /// True once the monitor has asked the poller to stop
    pub fn should_stop(&self) -> bool {
        self.shared.stop.load(Ordering::Relaxed)
    }
}

/// Export session monitor, owned by the UI-owning context
///
/// Call [`pump_events`](Self::pump_events) (or the timeout variant) from
/// that context to fold worker messages into the log, state, and pending
/// prompt the presentation layer renders from.
pub struct ExportMonitor {
    state: ExportState,
    log: Vec<String>,
    pending_prompt: Option<String>,
    events: Receiver<DisplayEvent>,
    handle: MonitorHandle,
    poller: Option<JoinHandle<()>>,
    poll_interval: Duration,
}

impl ExportMonitor {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            prompt: PromptGate {
                confirmed: Mutex::new(false),
                signal: Condvar::new(),
            },
        });

        Self {
            state: ExportState::Idle,
            log: Vec::new(),
            pending_prompt: None,
            events: events_rx,
            handle: MonitorHandle {
                shared,
                events: events_tx,
            },
            poller: None,
            poll_interval,
        }
    }

    /// Handle for the export driver and other workers
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// The session log: ordered toolchain output chunks, cleared at
    /// session start and append-only until the next session
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The question the session is paused on, present exactly while the
    /// state is `WaitingForUserInput`
    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending_prompt.as_deref()
    }

    /// Start monitoring a toolchain's output stream.
    ///
    /// Clears the session log, transitions to `Busy`, and spawns the
    /// poller thread over `stream`.
    ///
    /// # Panics
    ///
    /// Panics if a session is still active. That means a caller lost
    /// track of its own session lifecycle, which must fail loudly.
    pub fn begin_monitoring(&mut self, stream: Box<dyn OutputStream>) {
        assert!(
            !self.state.is_active(),
            "begin_monitoring called while a session is active (state {:?})",
            self.state
        );

        // Stale events from the previous session must not leak into this one
        while self.events.try_recv().is_ok() {}

        self.log.clear();
        self.pending_prompt = None;
        self.state = ExportState::Busy;
        self.handle.shared.stop.store(false, Ordering::Relaxed);

        let handle = self.handle.clone();
        let poll_interval = self.poll_interval;
        self.poller = Some(
            std::thread::Builder::new()
                .name("export-poller".into())
                .spawn(move || poll_loop(stream, handle, poll_interval))
                .expect("failed to spawn export poller thread"),
        );
    }

    /// Signal the poller to stop and wait until it has exited.
    ///
    /// Idempotent. The poller observes the signal within one poll
    /// interval. Never call this from the poller thread itself.
    pub fn stop_monitoring(&mut self) {
        self.handle.shared.stop.store(true, Ordering::Relaxed);
        if let Some(poller) = self.poller.take() {
            let _ = poller.join();
        }
    }

    /// Confirm the pending prompt: clears it, returns the session to
    /// `Busy`, and unblocks the worker waiting in
    /// [`MonitorHandle::request_user_input`].
    ///
    /// # Panics
    ///
    /// Panics if no prompt is pending.
    pub fn confirm_user_input(&mut self) {
        assert_eq!(
            self.state,
            ExportState::WaitingForUserInput,
            "confirm_user_input called without a pending prompt"
        );

        self.pending_prompt = None;
        self.state = ExportState::Busy;

        let mut confirmed = self.handle.shared.prompt.confirmed.lock().unwrap();
        *confirmed = true;
        self.handle.shared.prompt.signal.notify_one();
    }

    /// Resolve the session. The export driver decides the outcome; the
    /// monitor never does, even when the toolchain dies mid-run.
    ///
    /// Stops the poller and drains its final output before recording the
    /// result.
    ///
    /// # Panics
    ///
    /// Panics unless the session is `Busy` - a prompt must be confirmed
    /// before the session can resolve.
    pub fn finish(&mut self, success: bool) {
        self.stop_monitoring();
        self.pump_events();

        assert_eq!(
            self.state,
            ExportState::Busy,
            "finish called outside a running session"
        );

        self.state = if success {
            ExportState::Success
        } else {
            ExportState::Failure
        };
        debug!(state = ?self.state, "export session resolved");
    }

    /// Return to `Idle` so a new session can begin.
    ///
    /// # Panics
    ///
    /// Panics unless the session has resolved to `Success` or `Failure`.
    pub fn reset(&mut self) {
        assert!(
            self.state.is_terminal(),
            "reset called in state {:?}",
            self.state
        );
        self.state = ExportState::Idle;
    }

    /// Drain all queued worker events into the model without blocking.
    /// Returns how many events were applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for one worker event, then drain the rest of
    /// the queue. Returns how many events were applied.
    pub fn pump_events_timeout(&mut self, timeout: Duration) -> usize {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                1 + self.pump_events()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn apply(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::Output(text) => self.log.push(text),
            DisplayEvent::PromptRequested(message) => {
                self.pending_prompt = Some(message);
                self.state = ExportState::WaitingForUserInput;
            }
        }
    }
}

impl Default for ExportMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExportMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

/// Poller body: read whatever the toolchain wrote, post it to the display
/// queue, sleep, repeat. Exits when told to stop or when the process goes
/// away - quietly in both cases; resolving the session is the driver's
/// call.
fn poll_loop(mut stream: Box<dyn OutputStream>, handle: MonitorHandle, poll_interval: Duration) {
    let mut buf = [0u8; READ_CHUNK];

    while !handle.should_stop() {
        match stream.read_available(&mut buf) {
            Ok(0) => {
                if !stream.is_alive() {
                    debug!("monitored process went away, poller exiting");
                    break;
                }
            }
            Ok(n) => handle.post_log(String::from_utf8_lossy(&buf[..n]).into_owned()),
            Err(err) => {
                warn!("failed to read toolchain output: {err}");
                return;
            }
        }

        std::thread::sleep(poll_interval);
    }

    // Drain what the process managed to write before the loop ended, so a
    // stop request right after its exit does not lose the tail of the log
    loop {
        match stream.read_available(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => handle.post_log(String::from_utf8_lossy(&buf[..n]).into_owned()),
        }
    }
}
