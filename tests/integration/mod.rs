// Integration test module organization

pub mod common;

mod bean_ref_test;
mod concurrency_test;
mod contact_points_test;
mod failure_test;
