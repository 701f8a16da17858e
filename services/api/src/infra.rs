use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use subject_survey::survey::{AttemptId, AttemptRecord, AttemptStore, StoreError, SurveyVariant};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) advice: Arc<AdviceRotation>,
}

/// Attempt storage for the single-process deployment: one entry per
/// in-flight respondent session, nothing survives a restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAttemptStore {
    records: Arc<Mutex<HashMap<AttemptId, AttemptRecord>>>,
}

impl AttemptStore for InMemoryAttemptStore {
    fn insert(&self, record: AttemptRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("attempt mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn update(&self, record: AttemptRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("attempt mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(&self, id: &AttemptId) -> Result<Option<AttemptRecord>, StoreError> {
        let guard = self.records.lock().expect("attempt mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &AttemptId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("attempt mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

/// Rotating banner copy for the survey front end. Decorative only; the
/// engine never sees these strings.
#[derive(Default)]
pub(crate) struct AdviceRotation {
    cursor: AtomicUsize,
}

const ADVICE: [&str; 6] = [
    "Answer with your first instinct; there are no wrong answers.",
    "This survey measures interest, not ability.",
    "Results are a starting point for course planning, not a verdict.",
    "Take a short break between sections if you lose focus.",
    "Re-take the survey after a semester and compare the rankings.",
    "Talk the results over with a counselor before choosing electives.",
];

impl AdviceRotation {
    pub(crate) fn next(&self) -> &'static str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        ADVICE[index % ADVICE.len()]
    }
}

pub(crate) fn parse_variant(raw: &str) -> Result<SurveyVariant, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lite" => Ok(SurveyVariant::Lite),
        "full" | "default" => Ok(SurveyVariant::Full),
        other => Err(format!(
            "unknown survey variant '{other}' (expected lite or full)"
        )),
    }
}
