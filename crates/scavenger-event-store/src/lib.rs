//! Scavenger Event Store — persistence for progress event streams.
//!
//! `PgEventRepository` backs production deployments; `InMemoryEventRepository`
//! serves development servers and tests. Both enforce the same optimistic
//! concurrency contract.

pub mod memory_event_repository;
pub mod pg_event_repository;
