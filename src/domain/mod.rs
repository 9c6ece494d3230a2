//! Domain model: aggregates persisted by the repositories and the value
//! objects that guard their inputs.

pub mod aggregates;
pub mod value_objects;
