//! Test suites for the service lifecycle and its process supervision.

pub(crate) mod support;
