//! Dense <-> reduced node indexing.
//!
//! The engine stores gridded values only for active cells, in its own
//! "reduced" order. Users address cells by their dense, row-major position
//! in the model grid. This map translates between the two in O(1).

use mf_core::{MfError, MfResult};

/// Bidirectional mapping between dense user nodes and reduced engine nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMap {
    /// Dense index -> reduced index; `None` for inactive cells.
    dense_to_reduced: Vec<Option<usize>>,

    /// Reduced index -> dense index.
    reduced_to_dense: Vec<usize>,
}

impl NodeMap {
    /// Map for a grid with no inactive cells.
    pub fn identity(size: usize) -> Self {
        Self {
            dense_to_reduced: (0..size).map(Some).collect(),
            reduced_to_dense: (0..size).collect(),
        }
    }

    /// Build from a reduced -> dense table (0-based).
    pub fn from_reduced_to_dense(reduced_to_dense: Vec<usize>, dense_size: usize) -> MfResult<Self> {
        let mut dense_to_reduced = vec![None; dense_size];
        for (reduced, &dense) in reduced_to_dense.iter().enumerate() {
            let slot = dense_to_reduced
                .get_mut(dense)
                .ok_or(MfError::IndexOutOfRange {
                    what: "dense node in node map",
                    index: dense,
                    len: dense_size,
                })?;
            if slot.is_some() {
                return Err(MfError::InvalidArg {
                    what: format!("dense node {dense} is mapped twice"),
                });
            }
            *slot = Some(reduced);
        }
        Ok(Self {
            dense_to_reduced,
            reduced_to_dense,
        })
    }

    /// Build from the engine's `NODEUSER` and optional `NODEREDUCED` arrays.
    ///
    /// Both hold node numbers offset by `base`. A `NODEREDUCED` entry below
    /// the base marks an inactive cell; when present it must agree with
    /// `NODEUSER`.
    pub fn from_engine(
        nodeuser: &[i32],
        nodereduced: Option<&[i32]>,
        base: i32,
        dense_size: usize,
    ) -> MfResult<Self> {
        let reduced_to_dense = nodeuser
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                usize::try_from(n - base).map_err(|_| MfError::IndexOutOfRange {
                    what: "NODEUSER entry",
                    index: i,
                    len: nodeuser.len(),
                })
            })
            .collect::<MfResult<Vec<_>>>()?;
        let map = Self::from_reduced_to_dense(reduced_to_dense, dense_size)?;

        if let Some(nodereduced) = nodereduced {
            if nodereduced.len() != dense_size {
                return Err(MfError::ShapeMismatch {
                    what: "NODEREDUCED".to_string(),
                    expected: vec![dense_size],
                    actual: vec![nodereduced.len()],
                });
            }
            for (dense, &raw) in nodereduced.iter().enumerate() {
                let reduced = usize::try_from(raw - base).ok();
                if reduced != map.dense_to_reduced[dense] {
                    return Err(MfError::InvalidArg {
                        what: format!(
                            "NODEREDUCED disagrees with NODEUSER at dense node {dense}"
                        ),
                    });
                }
            }
        }
        Ok(map)
    }

    /// Dense node for a reduced node.
    pub fn to_dense(&self, reduced: usize) -> MfResult<usize> {
        self.reduced_to_dense
            .get(reduced)
            .copied()
            .ok_or(MfError::IndexOutOfRange {
                what: "reduced node",
                index: reduced,
                len: self.reduced_to_dense.len(),
            })
    }

    /// Reduced node for a dense node. Inactive cells are out of range.
    pub fn to_reduced(&self, dense: usize) -> MfResult<usize> {
        self.dense_to_reduced
            .get(dense)
            .and_then(|&opt| opt)
            .ok_or(MfError::IndexOutOfRange {
                what: "active dense node",
                index: dense,
                len: self.dense_to_reduced.len(),
            })
    }

    pub fn is_active(&self, dense: usize) -> bool {
        matches!(self.dense_to_reduced.get(dense), Some(Some(_)))
    }

    /// Number of active (reduced) nodes.
    pub fn active_count(&self) -> usize {
        self.reduced_to_dense.len()
    }

    pub fn dense_size(&self) -> usize {
        self.dense_to_reduced.len()
    }

    pub fn is_identity(&self) -> bool {
        self.active_count() == self.dense_size()
            && self.reduced_to_dense.iter().enumerate().all(|(i, &d)| i == d)
    }

    /// Dense position of every reduced node, in reduced order.
    pub fn reduced_to_dense(&self) -> &[usize] {
        &self.reduced_to_dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips() {
        let map = NodeMap::identity(4);
        assert!(map.is_identity());
        assert_eq!(map.to_dense(3).unwrap(), 3);
        assert_eq!(map.to_reduced(2).unwrap(), 2);
        assert!(map.to_dense(4).is_err());
    }

    #[test]
    fn engine_arrays_with_inactive_cells() {
        // dense cells 1 and 3 inactive, 1-based engine numbering
        let nodeuser = [1, 3, 5];
        let nodereduced = [1, 0, 2, 0, 3];
        let map = NodeMap::from_engine(&nodeuser, Some(&nodereduced), 1, 5).unwrap();

        assert_eq!(map.active_count(), 3);
        assert_eq!(map.dense_size(), 5);
        assert!(!map.is_identity());
        assert_eq!(map.to_dense(1).unwrap(), 2);
        assert_eq!(map.to_reduced(4).unwrap(), 2);
        assert!(!map.is_active(3));
        assert!(matches!(
            map.to_reduced(3),
            Err(MfError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn inconsistent_engine_arrays_are_rejected() {
        let nodeuser = [1, 2];
        let nodereduced = [2, 1, 0];
        assert!(NodeMap::from_engine(&nodeuser, Some(&nodereduced), 1, 3).is_err());
        assert!(NodeMap::from_engine(&[1, 7], None, 1, 3).is_err());
        assert!(NodeMap::from_engine(&[0], None, 1, 3).is_err());
    }

    #[test]
    fn duplicate_dense_targets_are_rejected() {
        assert!(NodeMap::from_reduced_to_dense(vec![0, 0], 2).is_err());
    }
}
