//! Integration tests for the flow splitter

mod cli_contracts;
mod support;
mod sync_round_trip;
