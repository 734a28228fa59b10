//! Gateway event envelopes.
//!
//! The gateway hands every event over as an untyped JSON object:
//!
//! ```text
//! {
//!   "emitter": "<source subsystem>",
//!   "type": <category bit>,
//!   "subtype": <category-specific discriminator>,
//!   "timestamp": <monotonic producer time>,
//!   "session_id": <session key>,
//!   "handle_id": <handle key, optional>,
//!   "event": { <payload, shape depends on type> }
//! }
//! ```
//!
//! [`decode`] turns that into an [`EventRecord`] without a schema. Missing
//! fields keep their zero/empty default and unknown keys are dropped, so the
//! envelope can grow without breaking the bridge.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::attributes::FlatAttributeSet;
use crate::json::encode_ascii_compact;

/// `event.name` of the session event that ends a session's span.
pub const SESSION_DESTROYED: &str = "destroyed";

/// Event categories emitted by the gateway.
///
/// Each category is a single bit of the envelope's `type` field. Values
/// outside this set are valid and are carried through as raw numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum EventType {
    /// Session created/destroyed.
    Session = 1 << 0,
    /// Handle attached/detached.
    Handle = 1 << 1,
    /// Custom events pushed through the admin API.
    External = 1 << 2,
    /// Offer/answer exchange.
    Jsep = 1 << 3,
    /// `PeerConnection`, ICE and DTLS state changes.
    WebRtc = 1 << 4,
    /// Media flow and RTP statistics.
    Media = 1 << 5,
    /// Plugin-originated events.
    Plugin = 1 << 6,
    /// Transport-originated events.
    Transport = 1 << 7,
    /// Gateway core events (startup, shutdown).
    Core = 1 << 8,
}

impl EventType {
    /// Every known category, in bit order.
    pub const ALL: [Self; 9] = [
        Self::Session,
        Self::Handle,
        Self::External,
        Self::Jsep,
        Self::WebRtc,
        Self::Media,
        Self::Plugin,
        Self::Transport,
        Self::Core,
    ];

    /// The category's bit in the envelope's `type` field.
    #[must_use]
    pub const fn mask(self) -> u64 {
        self as u64
    }

    /// Look up the category whose bit equals `mask` exactly.
    #[must_use]
    pub fn from_mask(mask: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.mask() == mask)
    }

    /// Lowercase category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Handle => "handle",
            Self::External => "external",
            Self::Jsep => "jsep",
            Self::WebRtc => "webrtc",
            Self::Media => "media",
            Self::Plugin => "plugin",
            Self::Transport => "transport",
            Self::Core => "core",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded form of one gateway event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// Source subsystem name.
    pub emitter: String,
    /// Category bitmask (`type` on the wire).
    #[serde(rename = "type")]
    pub event_type: u64,
    /// Category-specific discriminator.
    pub subtype: u64,
    /// Producer-side monotonic time, unit defined by the producer.
    pub timestamp: u64,
    /// Session key. `0` usually means the envelope had none.
    pub session_id: u64,
    /// Handle key within the session.
    pub handle_id: u64,
    /// The nested payload as compact, ASCII-escaped JSON.
    pub event: String,
}

impl EventRecord {
    /// The known category of this event, if its `type` is one.
    #[must_use]
    pub fn category(&self) -> Option<EventType> {
        EventType::from_mask(self.event_type)
    }

    /// Whether this event's `type` is exactly `kind`.
    #[must_use]
    pub fn is(&self, kind: EventType) -> bool {
        self.event_type == kind.mask()
    }

    /// The seven envelope fields as telemetry attributes.
    #[must_use]
    pub fn base_attributes(&self) -> FlatAttributeSet {
        let mut attrs = FlatAttributeSet::new();
        let _ = attrs.insert("emitter", self.emitter.as_str());
        let _ = attrs.insert("type", self.event_type);
        let _ = attrs.insert("subtype", self.subtype);
        let _ = attrs.insert("timestamp", self.timestamp);
        let _ = attrs.insert("session_id", self.session_id);
        let _ = attrs.insert("handle_id", self.handle_id);
        let _ = attrs.insert("event", self.event.as_str());
        attrs
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emitter={} type={} subtype={} timestamp={} session_id={} handle_id={} event={}",
            self.emitter,
            self.event_type,
            self.subtype,
            self.timestamp,
            self.session_id,
            self.handle_id,
            self.event
        )
    }
}

/// Decode a raw envelope into an [`EventRecord`].
///
/// Absent or non-object input yields the all-default record. Numeric fields
/// that are not integers coerce to `0`; a non-string `emitter` becomes empty.
pub fn decode(envelope: Option<&Value>) -> EventRecord {
    let mut record = EventRecord::default();
    let Some(Value::Object(fields)) = envelope else {
        return record;
    };

    for (key, value) in fields {
        match key.as_str() {
            "emitter" => value.as_str().unwrap_or_default().clone_into(&mut record.emitter),
            "type" => record.event_type = coerce_u64(value),
            "subtype" => record.subtype = coerce_u64(value),
            "timestamp" => record.timestamp = coerce_u64(value),
            "session_id" => record.session_id = coerce_u64(value),
            "handle_id" => record.handle_id = coerce_u64(value),
            "event" => record.event = encode_ascii_compact(value),
            _ => {}
        }
    }

    record
}

/// The nested `event` payload of an envelope.
pub fn payload(envelope: Option<&Value>) -> Option<&Value> {
    envelope?.get("event")
}

/// The `event.name` string of an envelope, if present.
pub fn event_name(envelope: Option<&Value>) -> Option<&str> {
    payload(envelope)?.get("name")?.as_str()
}

/// Integer coercion used for envelope and payload numbers.
///
/// Negative integers are reinterpreted as two's complement; anything that is
/// not an integer is `0`.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn coerce_u64(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_i64().map(|n| n as u64))
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttrValue;
    use serde_json::json;

    // ── decode ──────────────────────────────────────────────────────

    #[test]
    fn absent_input_yields_default() {
        assert_eq!(decode(None), EventRecord::default());
    }

    #[test]
    fn non_object_input_yields_default() {
        assert_eq!(decode(Some(&json!([1, 2, 3]))), EventRecord::default());
        assert_eq!(decode(Some(&json!("session"))), EventRecord::default());
        assert_eq!(decode(Some(&Value::Null)), EventRecord::default());
    }

    #[test]
    fn decodes_full_envelope() {
        let envelope = json!({
            "emitter": "MyJanusInstance",
            "type": 1,
            "subtype": 2,
            "timestamp": 3_869_216_386_u64,
            "session_id": 42,
            "handle_id": 7,
            "event": {"name": "created", "transport": {"transport": "janus.transport.http"}}
        });
        let record = decode(Some(&envelope));

        assert_eq!(record.emitter, "MyJanusInstance");
        assert_eq!(record.event_type, 1);
        assert_eq!(record.subtype, 2);
        assert_eq!(record.timestamp, 3_869_216_386);
        assert_eq!(record.session_id, 42);
        assert_eq!(record.handle_id, 7);
        let payload: Value = serde_json::from_str(&record.event).unwrap();
        assert_eq!(payload, envelope["event"]);
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let record = decode(Some(&json!({"type": 32})));
        assert_eq!(record.event_type, 32);
        assert_eq!(record.session_id, 0);
        assert!(record.emitter.is_empty());
        assert!(record.event.is_empty());
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let with_extra = json!({"type": 2, "session_id": 9, "opaque_id": "abc", "future": {"x": 1}});
        let without = json!({"type": 2, "session_id": 9});
        assert_eq!(decode(Some(&with_extra)), decode(Some(&without)));
    }

    #[test]
    fn non_integer_numbers_coerce_to_zero() {
        let record = decode(Some(&json!({
            "type": "session",
            "subtype": 1.5,
            "timestamp": true,
            "session_id": null,
            "handle_id": {"id": 3}
        })));
        assert_eq!(record.event_type, 0);
        assert_eq!(record.subtype, 0);
        assert_eq!(record.timestamp, 0);
        assert_eq!(record.session_id, 0);
        assert_eq!(record.handle_id, 0);
    }

    #[test]
    fn negative_integers_wrap() {
        let record = decode(Some(&json!({"session_id": -1})));
        assert_eq!(record.session_id, u64::MAX);
    }

    #[test]
    fn non_string_emitter_is_empty() {
        let record = decode(Some(&json!({"emitter": 12})));
        assert!(record.emitter.is_empty());
    }

    #[test]
    fn scalar_event_is_kept_as_json_text() {
        let record = decode(Some(&json!({"event": "hangup"})));
        assert_eq!(record.event, r#""hangup""#);
    }

    // ── helpers ─────────────────────────────────────────────────────

    #[test]
    fn event_name_reads_nested_name() {
        let envelope = json!({"type": 1, "event": {"name": "destroyed"}});
        assert_eq!(event_name(Some(&envelope)), Some(SESSION_DESTROYED));
        assert_eq!(event_name(Some(&json!({"event": {"name": 5}}))), None);
        assert_eq!(event_name(Some(&json!({"type": 1}))), None);
        assert_eq!(event_name(None), None);
    }

    #[test]
    fn category_maps_known_bits() {
        for kind in EventType::ALL {
            let record = EventRecord {
                event_type: kind.mask(),
                ..Default::default()
            };
            assert_eq!(record.category(), Some(kind));
            assert!(record.is(kind));
        }
    }

    #[test]
    fn category_passes_unknown_bits_through() {
        let record = decode(Some(&json!({"type": 512})));
        assert_eq!(record.category(), None);
        assert_eq!(record.event_type, 512);

        let combined = decode(Some(&json!({"type": 33})));
        assert_eq!(combined.category(), None);
        assert!(!combined.is(EventType::Session));
    }

    #[test]
    fn category_masks_are_single_bits() {
        for (bit, kind) in EventType::ALL.iter().enumerate() {
            assert_eq!(kind.mask(), 1 << bit);
        }
        assert_eq!(EventType::WebRtc.to_string(), "webrtc");
    }

    #[test]
    fn base_attributes_carry_all_envelope_fields() {
        let record = decode(Some(&json!({
            "emitter": "gw", "type": 16, "subtype": 5, "timestamp": 10,
            "session_id": 1, "handle_id": 2, "event": {"dtls": "connected"}
        })));
        let attrs = record.base_attributes();

        assert_eq!(attrs.len(), 7);
        assert_eq!(attrs.get("emitter"), Some(&AttrValue::from("gw")));
        assert_eq!(attrs.get("type"), Some(&AttrValue::UInt(16)));
        assert_eq!(attrs.get("handle_id"), Some(&AttrValue::UInt(2)));
        assert_eq!(
            attrs.get("event"),
            Some(&AttrValue::from(r#"{"dtls":"connected"}"#))
        );
    }

    #[test]
    fn display_lists_every_field() {
        let record = decode(Some(&json!({"emitter": "gw", "session_id": 3})));
        let text = record.to_string();
        assert!(text.contains("emitter=gw"));
        assert!(text.contains("session_id=3"));
        assert!(text.contains("handle_id=0"));
    }

    // ── properties ──────────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::from),
                any::<u64>().prop_map(Value::from),
                (-4000i32..4000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
                ".{0,12}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z_-]{1,8}", inner, 0..6)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        fn arb_key() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("emitter".to_owned()),
                Just("type".to_owned()),
                Just("subtype".to_owned()),
                Just("timestamp".to_owned()),
                Just("session_id".to_owned()),
                Just("handle_id".to_owned()),
                Just("event".to_owned()),
                "[a-z_]{1,10}",
            ]
        }

        proptest! {
            #[test]
            fn decode_is_total(
                fields in prop::collection::btree_map(arb_key(), arb_json(), 0..10)
            ) {
                let envelope = Value::Object(fields.clone().into_iter().collect());
                let record = decode(Some(&envelope));
                if let Some(payload) = fields.get("event") {
                    let back: Value = serde_json::from_str(&record.event).unwrap();
                    prop_assert_eq!(&back, payload);
                    prop_assert!(record.event.is_ascii());
                } else {
                    prop_assert!(record.event.is_empty());
                }
            }

            #[test]
            fn decode_of_any_value_never_panics(value in arb_json()) {
                let _ = decode(Some(&value));
            }
        }
    }
}
