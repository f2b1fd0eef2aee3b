#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the NYPD arrests API server.
//!
//! Configuration comes from the environment: `NYPD_ARRESTS_CSV`,
//! `NYPD_ARRESTS_SAMPLE`, `BIND_ADDR`, `PORT` and `RUST_LOG`.

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    nypd_arrests_server::run_server().await?;

    Ok(())
}
