// Domain layer: attribute schemas, diagnostics and the resource ports.

pub mod model;
pub mod ports;
pub mod schema;
