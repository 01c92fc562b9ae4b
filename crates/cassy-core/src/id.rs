//! Time-ordered row ids.

use crate::value::Value;

/// Generate a fresh time-ordered unique id (UUID v7).
///
/// The leading bits are a millisecond timestamp, so ids sort roughly by
/// creation time.
pub fn generate_id() -> Value {
    Value::Uuid(uuid::Uuid::now_v7().into_bytes())
}
