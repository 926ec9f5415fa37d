//! Bus integration tests.

mod support;
mod handlers;
mod send;
mod convention;
