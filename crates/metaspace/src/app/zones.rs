use engine::Vec2;

use super::map::{InteractiveZone, ZoneKind, ZoneTarget};

/// One zone the local player currently stands in. Emitted every tick while
/// inside; consumers that want edge semantics dedup on zone id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ZoneEvent {
    pub(crate) zone_id: String,
    pub(crate) kind: ZoneKind,
    pub(crate) target: Option<ZoneTarget>,
}

pub(crate) fn evaluate(position: Vec2, zones: &[InteractiveZone]) -> Vec<ZoneEvent> {
    zones
        .iter()
        .filter(|zone| zone.bounds.contains(position))
        .map(|zone| ZoneEvent {
            zone_id: zone.id.clone(),
            kind: zone.kind,
            target: zone.target.clone(),
        })
        .collect()
}
