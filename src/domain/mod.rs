// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing requests,
// tasks, data and results. No burn types in here, no file I/O.

// Errors reported by every other layer
pub mod error;

// `{kind, args}` descriptors and the request payload around them
pub mod descriptor;

// Binary / multi-class / sequence task tag
pub mod task;

// Labelled feature rows
pub mod table;

// Metrics records returned to the caller
pub mod report;

// Data source abstractions
pub mod traits;
