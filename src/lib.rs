//! Workspace root package; exists only to host workspace-level dev-dependencies (git hooks).
