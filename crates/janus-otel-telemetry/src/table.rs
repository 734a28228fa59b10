//! Session-keyed registry of open spans.
//!
//! A session's span is started on the first event that mentions the
//! session and ended on its terminal event. Sessions that never send one
//! keep their span open until [`SpanTable::drain`].
//!
//! The map is sharded ([`DashMap`]), so threads working on different
//! sessions rarely contend. A guard returned by [`SpanTable::acquire`] holds
//! its shard locked: drop it before calling anything else on the table.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use tracing::debug;

use crate::sink::{SessionSpan, SpanKey, TelemetrySink};

/// Open spans keyed by full-width `session_id`.
pub struct SpanTable<K: TelemetrySink> {
    sink: Arc<K>,
    spans: DashMap<u64, K::Span>,
}

impl<K: TelemetrySink> SpanTable<K> {
    /// An empty table that starts spans on `sink`.
    pub fn new(sink: Arc<K>) -> Self {
        Self {
            sink,
            spans: DashMap::new(),
        }
    }

    /// The open span for `session_id`, starting one if there is none.
    pub fn acquire(&self, session_id: u64) -> RefMut<'_, u64, K::Span> {
        self.spans.entry(session_id).or_insert_with(|| {
            let span = self.sink.start_span(session_id);
            debug!(session_id, span = %span.id(), "session span opened");
            span
        })
    }

    /// End and remove the span for `session_id`.
    ///
    /// Returns `false` when there was no open span, which is not an error.
    pub fn release(&self, session_id: u64) -> bool {
        let Some((_, mut span)) = self.spans.remove(&session_id) else {
            return false;
        };
        span.end();
        debug!(session_id, span = %span.id(), "session span released");
        true
    }

    /// Take the span for `session_id` out of the table, run `last` on it, then
    /// end it.
    ///
    /// Removal happens under the shard lock, so a span opened by a later event
    /// for the same session is never the one ended here. A session with no
    /// open span gets a fresh one that is closed straight away.
    pub fn close_with(&self, session_id: u64, last: impl FnOnce(&mut K::Span)) {
        let mut span = match self.spans.entry(session_id) {
            Entry::Occupied(entry) => entry.remove(),
            Entry::Vacant(_) => {
                let span = self.sink.start_span(session_id);
                debug!(session_id, span = %span.id(), "session span opened");
                span
            }
        };
        last(&mut span);
        span.end();
        debug!(session_id, span = %span.id(), "session span released");
    }

    /// End and remove every open span. Returns how many were ended.
    pub fn drain(&self) -> usize {
        let sessions: Vec<u64> = self.spans.iter().map(|entry| *entry.key()).collect();
        sessions.into_iter().filter(|id| self.release(*id)).count()
    }

    /// Key of the open span for `session_id`, if any.
    pub fn span_key(&self, session_id: u64) -> Option<SpanKey> {
        self.spans.get(&session_id).map(|span| span.id())
    }

    /// Whether `session_id` has an open span.
    pub fn contains(&self, session_id: u64) -> bool {
        self.spans.contains_key(&session_id)
    }

    /// Number of open spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no span is open.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
