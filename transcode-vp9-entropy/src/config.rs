//! Coefficient coding configuration.
//!
//! Every field changes the bitstream, so encoder and decoder must be built
//! with the same configuration; see [`CoefCodingConfig::check_compatible`].

use crate::error::{CoefError, Result};
use crate::ENTROPY_NODES;

/// Out-of-band coefficient coding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefCodingConfig {
    /// Derive the constrained tree nodes from the pivot node.
    pub compact_model: bool,
    /// Explicitly coded nodes when the compact model is on (2 or 3).
    pub unconstrained_nodes: usize,
    /// Merge branch counts into the probabilities after each frame.
    pub backward_adaptation: bool,
}

impl Default for CoefCodingConfig {
    fn default() -> Self {
        Self {
            compact_model: true,
            unconstrained_nodes: 3,
            backward_adaptation: true,
        }
    }
}

impl CoefCodingConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the compact model.
    pub fn with_compact_model(mut self, enabled: bool) -> Self {
        self.compact_model = enabled;
        self
    }

    /// Set the number of unconstrained nodes (2 or 3).
    pub fn with_unconstrained_nodes(mut self, nodes: usize) -> Self {
        self.unconstrained_nodes = nodes;
        self
    }

    /// Enable or disable backward adaptation.
    pub fn with_backward_adaptation(mut self, enabled: bool) -> Self {
        self.backward_adaptation = enabled;
        self
    }

    /// Nodes carried by forward updates and backward adaptation.
    pub fn coded_nodes(&self) -> usize {
        if self.compact_model {
            self.unconstrained_nodes
        } else {
            ENTROPY_NODES
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.unconstrained_nodes) {
            return Err(CoefError::InvalidConfig(format!(
                "unconstrained nodes must be 2 or 3, got {}",
                self.unconstrained_nodes
            )));
        }
        Ok(())
    }

    /// Check that a peer was configured identically.
    pub fn check_compatible(&self, other: &CoefCodingConfig) -> Result<()> {
        if self.compact_model != other.compact_model {
            return Err(CoefError::ConfigMismatch(format!(
                "compact model {} vs {}",
                self.compact_model, other.compact_model
            )));
        }
        if self.compact_model && self.unconstrained_nodes != other.unconstrained_nodes {
            return Err(CoefError::ConfigMismatch(format!(
                "unconstrained nodes {} vs {}",
                self.unconstrained_nodes, other.unconstrained_nodes
            )));
        }
        if self.backward_adaptation != other.backward_adaptation {
            return Err(CoefError::ConfigMismatch(format!(
                "backward adaptation {} vs {}",
                self.backward_adaptation, other.backward_adaptation
            )));
        }
        Ok(())
    }
}
