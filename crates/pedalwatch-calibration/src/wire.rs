//! Serde helpers shared by every type that ends up in a telemetry frame.
//!
//! Dashboard consumers key off integer flags, so booleans go out as `0`/`1`.

use serde::Serializer;

/// Serialize a `bool` as the integer `0` or `1`.
pub fn flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}
