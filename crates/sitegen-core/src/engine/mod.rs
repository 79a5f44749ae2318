//! # Engine Module
//!
//! Turns a slab and an [`config::AdsorbateConfig`] into a realized configuration.
//!
//! ## Architecture
//!
//! - **Layer Classification** ([`layers`]) - groups atoms of one species into z-layers
//!   and freezes the bottom of a slab
//! - **Site Resolution** ([`site`]) - single, averaged or explicit in-plane anchors
//! - **Placement** ([`placement`]) - vacancy removal, orientation and insertion on a
//!   private copy of the slab
//! - **Configuration** ([`config`]) - per-configuration and batch settings with builders
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - the not-found taxonomy with full selection context
//!
//! Every operation here is synchronous and works on owned or borrowed data only,
//! so independent configurations can be built on separate threads.

pub mod config;
pub mod error;
pub mod layers;
pub mod placement;
pub mod progress;
pub mod site;
