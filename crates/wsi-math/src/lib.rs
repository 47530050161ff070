//! # wsi-math
//!
//! Small linear-algebra toolkit for the whole-slide imaging render core.
//!
//! Everything here operates on 3-component color triples: RGB transmittance
//! values, optical-density vectors, and stain characterization vectors. The
//! two types are deliberately minimal:
//!
//! - [`Vec3`] — an RGB or optical-density triple with the handful of
//!   operations the stain algebra needs (dot, cross, normalize, clamping).
//! - [`Mat3`] — a row-major 3x3 matrix with cofactor/adjugate inversion and
//!   an explicit singularity guard, used for stain unmixing and ICC matrix
//!   transforms.
//!
//! # Convention
//!
//! Matrices use **column vectors**: `m * v` multiplies rows of `m` against
//! `v`. Stain bases are assembled row-per-stain and transposed where a
//! column basis is needed; see `wsi-stain` for that layering.

mod mat3;
mod vec3;

pub use mat3::Mat3;
pub use vec3::Vec3;
