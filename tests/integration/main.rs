//! Integration tests for the booking engine over the in-memory backend.

mod helpers;

mod capacity_test;
mod concurrency_test;
mod dispute_test;
mod lifecycle_test;
mod payment_test;
mod race_test;
mod statistics_test;
