use crate::vehicle::Vehicle;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

/// Records the state of a vehicle at the end of a tick.
#[allow(unused)]
pub fn debug_vehicle(vehicle: &Vehicle) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        let pos = vehicle.position();
        frame.borrow_mut().push(json!({
            "type": "vehicle",
            "node": vehicle.node(),
            "segment": vehicle.segment().map(|s| [s.from, s.to]),
            "pos": [pos.x, pos.y],
            "vel": vehicle.vel(),
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
