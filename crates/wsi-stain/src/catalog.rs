//! Static stain characterization catalog.
//!
//! Stain vectors are normalized optical-density triples from the
//! Ruifrok–Johnston characterization. Catalog residuals are stored as the
//! zero vector: the matrix builder synthesizes the effective residual from
//! the cross product of the two configured stains, uniformly for every
//! protocol.

use wsi_core::StainKind;
use wsi_math::Vec3;

/// Characterization of one stain protocol.
#[derive(Debug, Clone, Copy)]
pub struct StainDefinition {
    /// Protocol this entry describes.
    pub kind: StainKind,
    /// First stain vector (hematoxylin), optical-density space.
    pub stain1: Vec3,
    /// Second stain vector (eosin or DAB), optical-density space.
    pub stain2: Vec3,
    /// Configured residual. Zero means "synthesize from the stain pair".
    pub residual: Vec3,
    /// Display labels for the two stain channels.
    pub labels: [&'static str; 2],
}

/// Hematoxylin and eosin.
pub const HE: StainDefinition = StainDefinition {
    kind: StainKind::He,
    stain1: Vec3::new(0.6443, 0.7167, 0.2668),
    stain2: Vec3::new(0.0928, 0.9541, 0.2831),
    residual: Vec3::ZERO,
    labels: ["Hematoxylin", "Eosin"],
};

/// Hematoxylin and diaminobenzidine.
pub const HDAB: StainDefinition = StainDefinition {
    kind: StainKind::HDab,
    stain1: Vec3::new(0.6500, 0.7040, 0.2860),
    stain2: Vec3::new(0.2690, 0.5684, 0.7780),
    residual: Vec3::ZERO,
    labels: ["Hematoxylin", "DAB"],
};

/// Looks up the catalog entry for a protocol.
pub fn definition(kind: StainKind) -> &'static StainDefinition {
    match kind {
        StainKind::He => &HE,
        StainKind::HDab => &HDAB,
    }
}
