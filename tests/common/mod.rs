#![allow(dead_code)]

use casewhat::{Reference, ServiceError, WhereClause, WorkItemService};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ThreadId;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query { item_type: String, clause: String },
    Get(String),
    GetCollection(String),
    Update { reference: String, fields: Value },
}

/// In-memory work-item service that records every call it receives
#[derive(Default)]
pub struct RecordingService {
    pub query_results: HashMap<String, Vec<Value>>,
    pub items: HashMap<String, Value>,
    pub collections: HashMap<String, Vec<Value>>,
    pub failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, clause: &str, results: Value) -> Self {
        let results = results.as_array().cloned().unwrap_or_default();
        self.query_results.insert(clause.to_string(), results);
        self
    }

    pub fn with_item(mut self, reference: &str, fields: Value) -> Self {
        self.items.insert(reference.to_string(), fields);
        self
    }

    pub fn with_collection(mut self, reference: &str, members: Value) -> Self {
        let members = members.as_array().cloned().unwrap_or_default();
        self.collections.insert(reference.to_string(), members);
        self
    }

    /// Every call touching this reference fails
    pub fn failing(mut self, reference: &str) -> Self {
        self.failing.insert(reference.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { reference, fields } => Some((reference, fields)),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call) {
        self.calls.lock().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give any concurrently issued call a chance to overlap
        tokio::task::yield_now().await;
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check(&self, reference: &str) -> Result<(), ServiceError> {
        if self.failing.contains(reference) {
            Err(ServiceError::Http {
                status: 500,
                message: format!("{reference} is unavailable"),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl WorkItemService for RecordingService {
    async fn query(
        &self,
        item_type: &str,
        clause: &WhereClause,
        _fetch: &[&str],
    ) -> Result<Vec<Value>, ServiceError> {
        let clause = clause.to_string();
        self.enter(Call::Query {
            item_type: item_type.to_string(),
            clause: clause.clone(),
        })
        .await;
        let result = self
            .check(item_type)
            .map(|_| self.query_results.get(&clause).cloned().unwrap_or_default());
        self.leave();
        result
    }

    async fn get(&self, reference: &Reference, _fetch: &[&str]) -> Result<Map<String, Value>, ServiceError> {
        self.enter(Call::Get(reference.to_string())).await;
        let result = self.check(reference.as_str()).and_then(|_| {
            self.items
                .get(reference.as_str())
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| ServiceError::Rejected(vec!["Cannot find object to read".to_string()]))
        });
        self.leave();
        result
    }

    async fn get_collection(&self, reference: &Reference, _fetch: &[&str]) -> Result<Vec<Value>, ServiceError> {
        self.enter(Call::GetCollection(reference.to_string())).await;
        let result = self
            .check(reference.as_str())
            .map(|_| self.collections.get(reference.as_str()).cloned().unwrap_or_default());
        self.leave();
        result
    }

    async fn update(
        &self,
        reference: &Reference,
        fields: Map<String, Value>,
    ) -> Result<Map<String, Value>, ServiceError> {
        self.enter(Call::Update {
            reference: reference.to_string(),
            fields: Value::Object(fields.clone()),
        })
        .await;
        let result = self.check(reference.as_str()).map(|_| fields);
        self.leave();
        result
    }
}

/// Records every log line with the thread that emitted it. Each test runs on
/// its own thread under a current-thread runtime, so lines never leak between tests.
struct CapturingLogger {
    lines: Mutex<Vec<(ThreadId, log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.lines.lock().push((
            std::thread::current().id(),
            record.level(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: parking_lot::const_mutex(Vec::new()),
};

/// Install the capturing logger; safe to call from every test
pub fn capture_logs() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}

/// Error lines logged so far by the calling test
pub fn error_lines() -> Vec<String> {
    let current = std::thread::current().id();
    LOGGER
        .lines
        .lock()
        .iter()
        .filter(|(thread, level, _)| *thread == current && *level == log::Level::Error)
        .map(|(_, _, line)| line.clone())
        .collect()
}
