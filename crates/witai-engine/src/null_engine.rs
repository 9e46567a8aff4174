use crate::engine_trait::{Completion, InitStatus, WitEngine};
use std::ffi::CStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use witai_core::{EngineError, Outcome, QueryResult, Verbosity};

const DEFAULT_TRANSCRIPT: &str = "[null] voice query";

/// A completion waiting on its delivery thread; emptied on delivery or close.
type InFlight = Arc<Mutex<Option<Completion>>>;

/// Counters shared with whoever created the engine, so they stay readable
/// after the engine has been moved into a context.
#[derive(Debug, Default)]
pub struct NullEngineStats {
    queries: AtomicUsize,
    closes: AtomicUsize,
}

impl NullEngineStats {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

/// In-process engine that answers every query without audio or network.
///
/// Text queries echo the query text back as a single outcome with intent
/// `"null"`; voice queries answer with a fixed transcript. Behavior can be
/// tuned through the engine config table:
///
/// - `payload`: raw JSON returned for every query instead of the synthesized one
/// - `transcript`: text used for voice queries
/// - `init_errno`: error code reported from `initialize`
/// - `async_delay_ms`: delay before an asynchronous response is delivered
pub struct NullEngine {
    payload: Option<String>,
    transcript: String,
    init_errno: Option<i32>,
    async_delay: Duration,
    device: String,
    initialized: bool,
    closed: bool,
    recording: bool,
    in_flight: Vec<InFlight>,
    stats: Arc<NullEngineStats>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            payload: None,
            transcript: DEFAULT_TRANSCRIPT.to_string(),
            init_errno: None,
            async_delay: Duration::ZERO,
            device: String::new(),
            initialized: false,
            closed: false,
            recording: false,
            in_flight: Vec::new(),
            stats: Arc::new(NullEngineStats::default()),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_init_errno(mut self, code: i32) -> Self {
        self.init_errno = Some(code);
        self
    }

    pub fn with_async_delay(mut self, delay: Duration) -> Self {
        self.async_delay = delay;
        self
    }

    pub fn stats(&self) -> Arc<NullEngineStats> {
        Arc::clone(&self.stats)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn check_open(&self, op: &'static str) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::Rejected {
                op,
                reason: "engine is not initialized".to_string(),
            });
        }
        if self.closed {
            return Err(EngineError::Rejected {
                op,
                reason: "engine is closed".to_string(),
            });
        }
        Ok(())
    }

    fn respond(&self, text: &str) -> String {
        let count = self.stats.queries.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(payload) = &self.payload {
            return payload.clone();
        }

        let result = QueryResult {
            text: text.to_string(),
            msg_id: format!("null-{count}"),
            outcomes: vec![Outcome {
                text: text.to_string(),
                confidence: 1.0,
                intent: "null".to_string(),
            }],
        };
        tracing::trace!("NullEngine answering query #{count}");
        serde_json::to_string(&result).unwrap_or_default()
    }

    fn deliver(
        &mut self,
        op: &'static str,
        payload: String,
        done: Completion,
    ) -> Result<(), EngineError> {
        self.in_flight.retain(|slot| lock_in_flight(slot).is_some());
        let slot: InFlight = Arc::new(Mutex::new(Some(done)));
        let delivered = Arc::clone(&slot);

        let delay = self.async_delay;
        std::thread::Builder::new()
            .name("null-engine-response".to_string())
            .spawn(move || {
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                let done = lock_in_flight(&delivered).take();
                if let Some(done) = done {
                    done(payload);
                }
            })
            .map_err(|e| EngineError::Rejected {
                op,
                reason: e.to_string(),
            })?;

        self.in_flight.push(slot);
        Ok(())
    }

    /// Drops every completion whose response has not been delivered yet.
    fn discard_in_flight(&mut self) -> usize {
        self.in_flight
            .drain(..)
            .filter(|slot| lock_in_flight(slot).take().is_some())
            .count()
    }

    fn take_recording(&mut self, op: &'static str) -> Result<(), EngineError> {
        self.check_open(op)?;
        if !self.recording {
            return Err(EngineError::Rejected {
                op,
                reason: "no recording in progress".to_string(),
            });
        }
        self.recording = false;
        Ok(())
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WitEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    fn initialize(
        &mut self,
        device: &CStr,
        verbosity: Verbosity,
        config: &toml::Value,
    ) -> Result<InitStatus, EngineError> {
        if let Some(payload) = config.get("payload").and_then(|v| v.as_str()) {
            self.payload = Some(payload.to_string());
        }
        if let Some(transcript) = config.get("transcript").and_then(|v| v.as_str()) {
            self.transcript = transcript.to_string();
        }
        if let Some(code) = config.get("init_errno").and_then(|v| v.as_integer()) {
            self.init_errno = Some(code as i32);
        }
        if let Some(ms) = config.get("async_delay_ms").and_then(|v| v.as_integer()) {
            self.async_delay = Duration::from_millis(ms.max(0) as u64);
        }

        self.device = device.to_string_lossy().into_owned();
        self.initialized = true;
        self.closed = false;
        tracing::debug!(device = %self.device, %verbosity, "NullEngine initialized");

        Ok(InitStatus {
            errno: self.init_errno,
        })
    }

    fn text_query(&mut self, text: &CStr, _access_token: &CStr) -> Result<String, EngineError> {
        self.check_open("text_query")?;
        Ok(self.respond(&text.to_string_lossy()))
    }

    fn text_query_async(
        &mut self,
        text: &CStr,
        _access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError> {
        self.check_open("text_query_async")?;
        let payload = self.respond(&text.to_string_lossy());
        self.deliver("text_query_async", payload, done)
    }

    fn voice_query_auto(&mut self, _access_token: &CStr) -> Result<String, EngineError> {
        self.check_open("voice_query_auto")?;
        Ok(self.respond(&self.transcript))
    }

    fn voice_query_auto_async(
        &mut self,
        _access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError> {
        self.check_open("voice_query_auto_async")?;
        let payload = self.respond(&self.transcript);
        self.deliver("voice_query_auto_async", payload, done)
    }

    fn voice_query_start(&mut self, _access_token: &CStr) -> Result<(), EngineError> {
        self.check_open("voice_query_start")?;
        if self.recording {
            return Err(EngineError::Rejected {
                op: "voice_query_start",
                reason: "already recording".to_string(),
            });
        }
        self.recording = true;
        tracing::debug!(device = %self.device, "NullEngine recording started");
        Ok(())
    }

    fn voice_query_stop(&mut self) -> Result<String, EngineError> {
        self.take_recording("voice_query_stop")?;
        Ok(self.respond(&self.transcript))
    }

    fn voice_query_stop_async(&mut self, done: Completion) -> Result<(), EngineError> {
        self.take_recording("voice_query_stop_async")?;
        let payload = self.respond(&self.transcript);
        self.deliver("voice_query_stop_async", payload, done)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.stats.closes.fetch_add(1, Ordering::Relaxed);
        self.closed = true;
        self.recording = false;
        let discarded = self.discard_in_flight();
        if discarded > 0 {
            tracing::debug!(discarded, "NullEngine dropped undelivered responses");
        }
        Ok(())
    }
}

fn lock_in_flight(slot: &Mutex<Option<Completion>>) -> MutexGuard<'_, Option<Completion>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
