// Pure usage-resolution logic. Nothing in here touches the filesystem.

pub mod capability;
pub mod embedding;
pub mod model_file;
pub mod origin;
pub mod report;
pub mod schema;
pub mod workflow;
