//! Flutter-facing bindings over `plantlight_core`.

pub mod api;
