//! Merkle tree over the authorized signer list.
//!
//! Leaves are `keccak256(address)` in list order and inner nodes are
//! `keccak256(left || right)` without sorting the pair. A trailing node with no
//! sibling is promoted to the next layer unchanged, so leaves of an unbalanced
//! tree can have proofs shorter than the tree height.

use alloy::primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Side on which a sibling sits relative to the running hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub hash: B256,
    pub position: SiblingPosition,
}

/// Ordered sibling hashes from leaf to root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf: B256,
    pub nodes: Vec<ProofNode>,
}

impl InclusionProof {
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn compute_root(&self) -> B256 {
        self.nodes.iter().fold(self.leaf, |acc, node| match node.position {
            SiblingPosition::Left => hash_pair(node.hash, acc),
            SiblingPosition::Right => hash_pair(acc, node.hash),
        })
    }

    pub fn verify(&self, root: B256) -> bool {
        self.compute_root() == root
    }

    /// Sibling hashes padded with zero entries to exactly `max_depth` slots.
    pub fn padded_siblings(&self, max_depth: usize) -> Result<Vec<B256>> {
        if self.depth() > max_depth {
            return Err(PipelineError::MalformedInput(format!(
                "merkle proof depth {} exceeds maximum {}",
                self.depth(),
                max_depth
            )));
        }
        let mut siblings: Vec<B256> = self.nodes.iter().map(|node| node.hash).collect();
        siblings.resize(max_depth, B256::ZERO);
        Ok(siblings)
    }
}

/// What later stages get to know about the issuer's allow-list membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerMembership {
    pub root: B256,
    pub leaf_index: usize,
    /// True proof length; padded entries beyond it must be ignored by the verifier.
    pub depth: usize,
    /// Always exactly the configured maximum depth long.
    pub siblings: Vec<B256>,
}

#[must_use]
pub fn leaf_hash(address: &Address) -> B256 {
    keccak256(address.as_slice())
}

#[must_use]
pub fn hash_pair(left: B256, right: B256) -> B256 {
    keccak256([left.as_slice(), right.as_slice()].concat())
}

#[derive(Debug, Clone)]
pub struct SignerMerkleTree {
    signers: Vec<Address>,
    layers: Vec<Vec<B256>>,
}

impl SignerMerkleTree {
    pub fn new(signers: &[Address]) -> Result<Self> {
        if signers.is_empty() {
            return Err(PipelineError::MalformedInput(
                "authorized signer list is empty".into(),
            ));
        }

        let mut layers = vec![signers.iter().map(leaf_hash).collect::<Vec<_>>()];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| match (pair[0], pair.get(1)) {
                    (left, Some(right)) => hash_pair(left, *right),
                    (single, None) => single,
                })
                .collect();
            layers.push(next);
        }

        Ok(Self {
            signers: signers.to_vec(),
            layers,
        })
    }

    pub fn root(&self) -> B256 {
        // layers always holds at least the leaf layer, and the last layer has one node
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Number of hashing layers above the leaves.
    pub fn height(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Index of `address` in the signer list. Addresses compare by value, so the
    /// hex casing they were configured with does not matter.
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.signers.iter().position(|signer| signer == address)
    }

    pub fn proof(&self, leaf_index: usize) -> Option<InclusionProof> {
        let leaf = *self.layers.first()?.get(leaf_index)?;
        let mut index = leaf_index;
        let mut nodes = Vec::with_capacity(self.height());

        for layer in &self.layers[..self.layers.len() - 1] {
            let is_right = index % 2 == 1;
            let pair_index = if is_right { index - 1 } else { index + 1 };
            if let Some(hash) = layer.get(pair_index) {
                nodes.push(ProofNode {
                    hash: *hash,
                    position: if is_right {
                        SiblingPosition::Left
                    } else {
                        SiblingPosition::Right
                    },
                });
            }
            index /= 2;
        }

        Some(InclusionProof {
            leaf_index,
            leaf,
            nodes,
        })
    }

    /// Proves that `address` is an authorized signer, padding the proof to `max_depth`.
    pub fn prove_membership(&self, address: &Address, max_depth: usize) -> Result<SignerMembership> {
        let leaf_index = self
            .position(address)
            .ok_or(PipelineError::SignerNotAuthorized(*address))?;
        let proof = self
            .proof(leaf_index)
            .ok_or(PipelineError::SignerNotAuthorized(*address))?;

        Ok(SignerMembership {
            root: self.root(),
            leaf_index,
            depth: proof.depth(),
            siblings: proof.padded_siblings(max_depth)?,
        })
    }
}
