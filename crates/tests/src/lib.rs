//! HTTP-level integration tests for the relief desk service live in `tests/`.
