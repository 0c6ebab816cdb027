// Domain layer: rounding rule, table model and ports. No I/O beyond the storage port.

pub mod model;
pub mod ports;
pub mod rounding;
pub mod table;
