use chrono::{DateTime, Utc};

/// A fact recorded on one aggregate's stream.
///
/// Stock movements and sales orders each have their own event enum; the
/// store keeps every stream homogeneous by `STREAM`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Aggregate type of the stream these events belong to.
    const STREAM: &'static str;

    /// Stable name of this variant (e.g. "inventory.stock.decremented").
    fn event_type(&self) -> &'static str;

    /// Payload schema version, bumped when a variant's fields change.
    fn version(&self) -> u32;

    /// Business time of the fact, not the time it was appended.
    fn occurred_at(&self) -> DateTime<Utc>;
}
