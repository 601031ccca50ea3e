//! Measurement planning for an electrical impedance tomography tank rig.
//!
//! A test object is positioned inside a cylindrical tank by a gantry. This
//! crate computes where the object may be placed ([`hitbox`]), lays out the
//! measurement points ([`coordinates`]), drives the gantry through them
//! ([`gantry`]), and maps positions into voxel grids for labelling training
//! data ([`scaling`], [`voxel`], [`dataset`]).

pub mod config;
pub mod coordinates;
pub mod dataset;
pub mod error;
pub mod gantry;
pub mod geom;
pub mod hitbox;
pub mod output;
pub mod plan;
pub mod scaling;
pub mod settings;
pub mod voxel;
