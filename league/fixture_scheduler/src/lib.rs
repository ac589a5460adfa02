//! Double round-robin fixture scheduling for league divisions.
//!
//! [`pairing`] builds the home/away pairings, [`slot_assigner`] places them on
//! a calendar under rest and per-day limits, and [`fixture_service`] replaces a
//! division's scheduled matches with the result through a [`repository`].

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod fixture_service;
pub mod pairing;
pub mod postgres;
pub mod repository;
pub mod slot_assigner;
pub mod teams;
pub mod types;
pub mod utils;
pub mod web;

pub use error::{FixtureError, RepositoryError, SchedulerError};
pub use fixture_service::FixtureService;
