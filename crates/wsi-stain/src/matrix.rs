//! Stain matrix construction, validation, and inversion.
//!
//! A [`StainMatrix`] packages everything the per-pixel math needs: the stain
//! basis (one row per stain vector), the remix matrix (stains as columns,
//! maps concentrations back to optical density), and the unmix matrix (its
//! inverse, maps optical density to concentrations).
//!
//! Residual synthesis: when the catalog residual is the zero vector, the
//! effective residual is `normalize(stain1 x stain2)`, sign-flipped so the
//! component sum is non-negative, with remaining negative numerical noise
//! clamped to zero. Parallel stain vectors fall back to
//! [`FALLBACK_RESIDUAL`] instead of producing NaN.
//!
//! Degeneracy: a basis whose determinant magnitude falls below the
//! singularity guard gets the identity substituted for both matrices and the
//! `degraded` flag set, so rendering continues with a diagnostic rather than
//! dividing by zero.

use std::collections::HashMap;

use tracing::warn;
use wsi_core::StainKind;
use wsi_math::{Mat3, Vec3};

use crate::catalog::{self, StainDefinition};

/// Cross products shorter than this mean the stain vectors are parallel.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Residual used when the stain pair is degenerate: the unit gray axis.
pub const FALLBACK_RESIDUAL: Vec3 = Vec3::new(0.577_350_3, 0.577_350_3, 0.577_350_3);

/// Derived stain transform matrices for one protocol.
#[derive(Debug, Clone, Copy)]
pub struct StainMatrix {
    /// Stain basis: rows are stain1, stain2, effective residual.
    pub basis: Mat3,
    /// Concentrations to optical density (stains as columns).
    pub remix: Mat3,
    /// Optical density to concentrations.
    pub unmix: Mat3,
    /// Effective residual vector actually in use.
    pub residual: Vec3,
    /// True when the basis was singular and identity was substituted.
    pub degraded: bool,
}

impl StainMatrix {
    /// Builds the stain matrices for a catalog entry.
    ///
    /// Never fails: degenerate input degrades to the identity transform
    /// with the `degraded` flag set.
    pub fn build(def: &StainDefinition) -> Self {
        let stain1 = def.stain1.normalize();
        let stain2 = def.stain2.normalize();
        let residual = effective_residual(def, stain1, stain2);

        let basis = Mat3::from_row_vecs(stain1, stain2, residual);
        let remix = basis.transpose();

        match remix.inverse() {
            Some(unmix) => Self { basis, remix, unmix, residual, degraded: false },
            None => {
                warn!(
                    stain = def.kind.name(),
                    det = remix.determinant(),
                    "singular stain basis, substituting identity"
                );
                Self {
                    basis: Mat3::IDENTITY,
                    remix: Mat3::IDENTITY,
                    unmix: Mat3::IDENTITY,
                    residual,
                    degraded: true,
                }
            }
        }
    }

    /// First stain vector.
    #[inline]
    pub fn stain1(&self) -> Vec3 {
        self.basis.row(0)
    }

    /// Second stain vector.
    #[inline]
    pub fn stain2(&self) -> Vec3 {
        self.basis.row(1)
    }
}

/// Resolves the effective residual for a normalized stain pair.
fn effective_residual(def: &StainDefinition, stain1: Vec3, stain2: Vec3) -> Vec3 {
    if def.residual != Vec3::ZERO {
        return def.residual.normalize();
    }

    let cross = stain1.cross(stain2);
    if cross.length() < PARALLEL_EPSILON {
        warn!(stain = def.kind.name(), "parallel stain vectors, using fallback residual");
        return FALLBACK_RESIDUAL;
    }

    // Orient toward positive absorbance, then clamp off negative noise.
    let oriented = if cross.component_sum() < 0.0 { -cross } else { cross };
    let clamped = oriented.max(0.0);
    if clamped.length() < PARALLEL_EPSILON {
        return FALLBACK_RESIDUAL;
    }
    clamped.normalize()
}

/// Per-protocol cache of built stain matrices.
///
/// Building involves a normalization, a cross product, and an inversion, so
/// the result is derived once per protocol and reused across frames.
#[derive(Debug, Default)]
pub struct StainMatrixCache {
    entries: HashMap<StainKind, StainMatrix>,
}

impl StainMatrixCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the matrix for a protocol, building it on first use.
    pub fn get(&mut self, kind: StainKind) -> &StainMatrix {
        self.entries
            .entry(kind)
            .or_insert_with(|| StainMatrix::build(catalog::definition(kind)))
    }
}
