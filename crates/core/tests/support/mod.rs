//! Shared test helpers for `ticketdesk-core` integration tests.
//!
//! These helpers provide reusable fixtures and lightweight mocks so that
//! sync tests can focus on behaviour instead of boilerplate.
#![allow(dead_code)]

pub mod calendar;
pub mod customers;
