// Filesystem-backed collaborators for the usage audit.

pub mod concurrency;
pub mod fs_scan;
pub mod object_info;
