#![cfg_attr(not(test), no_std)]
//! Boot-time memory-system transitions shared by every ARM variant.
//!
//! [`cache`] walks the cache hierarchy by set/way and [`mmu`] flips the
//! translation and cache enables of a system control register. Both talk to
//! the hardware only through the [`cache::CacheHierarchy`] and
//! [`mmu::ControlRegister`] traits, so the per-architecture crates supply the
//! instructions and this crate supplies the algorithm.

pub mod cache;
mod error;
pub mod mmu;
pub mod translation;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::CacheHierarchy;
pub use cache::MaintenanceOperation;
pub use cache::SetWayOp;
pub use error::TranslationConfigErr;
pub use mmu::ControlRegister;
pub use mmu::SCTLR;
pub use translation::Cacheability;
pub use translation::Shareability;
