// Domain layer: data model and ports. No engine logic here.

pub mod model;
pub mod ports;
