//! Host and object identity.
//!
//! Backups need to recognise "the same file" across runs without keying off a
//! path string alone (the same path on two machines is two different files).
//! This crate derives:
//!
//! - a [`HostId`] from observable host attributes (hardware address and
//!   hostname, via an injectable [`HostProbe`]), and
//! - a [`Poid`] (Permanent Object ID) binding a host ID to an absolute path.
//!
//! The host ID is never cached here. Callers that need POIDs to stay stable
//! across hardware changes should persist the host ID and feed it back in
//! with [`HostId::new`].

pub mod error;
mod host;
mod poid;

pub use crate::host::{HardwareAddress, HostId, HostProbe, SystemProbe};
pub use crate::poid::{Poid, absolute_path};
