//! Backend test support utilities
//!
//! This crate provides utilities specifically for backend testing: unified
//! logging initialization and assertions for the problem+json error contract.

pub mod logging;
pub mod problem_details;

// Initialize logging once for any test binary that links this crate.
#[ctor::ctor]
fn auto_init_logging() {
    logging::init();
}
