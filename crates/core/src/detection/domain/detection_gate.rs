use thiserror::Error;

use crate::shared::region::Region;

/// Why a photo was refused by the gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    #[error("No se encontró ninguna cara en la imagen")]
    NoFace,
    #[error("Se encontraron {0} caras; la foto debe contener una sola cara")]
    MultipleFaces(usize),
}

/// What to do when a still contains more than one face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiFacePolicy {
    /// Accept the photo; the backend decides which face it compares.
    #[default]
    Allow,
    Reject,
}

/// Pass/fail check run on detections before a photo is accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetectionGate {
    policy: MultiFacePolicy,
}

impl DetectionGate {
    pub fn new(policy: MultiFacePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MultiFacePolicy {
        self.policy
    }

    /// Returns the number of faces on success.
    pub fn check(&self, regions: &[Region]) -> Result<usize, GateRejection> {
        match (regions.len(), self.policy) {
            (0, _) => Err(GateRejection::NoFace),
            (1, _) => Ok(1),
            (n, MultiFacePolicy::Reject) => Err(GateRejection::MultipleFaces(n)),
            (n, MultiFacePolicy::Allow) => {
                log::warn!("Photo contains {n} faces; accepting it as-is");
                Ok(n)
            }
        }
    }
}
