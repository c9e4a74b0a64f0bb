// Domain layer: core models and ports. Nothing here touches the filesystem.

pub mod model;
pub mod ports;
