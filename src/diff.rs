//! Snapshot diffing: minimal update operations between two media lists
//!
//! Live streams hand consumers whole immutable snapshots; a list view
//! that wants minimal updates instead of full invalidation diffs the old
//! snapshot against the new one here. The diff is keyed by record id with
//! a longest-common-subsequence core, so reorders come out as
//! remove+insert pairs and in-place metadata changes come out as updates.

use crate::record::MediaRecord;
use serde::{Deserialize, Serialize};

/// One minimal list update operation
///
/// Applying every `Remove` to the old list (indices refer to the old
/// list, emitted in descending order so they stay valid), then every
/// `Insert` (indices refer to the new list, ascending), reproduces the
/// new list. `Update` marks a retained id whose record content changed;
/// its index refers to the new list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "op")]
pub enum ListOp {
    Remove { index: usize, id: i64 },
    Insert { index: usize, id: i64 },
    Update { index: usize, id: i64 },
}

/// Diff two snapshots keyed by record id
pub fn diff(old: &[MediaRecord], new: &[MediaRecord]) -> Vec<ListOp> {
    // LCS table over ids
    let n = old.len();
    let m = new.len();
    let mut table = vec![0usize; (n + 1) * (m + 1)];
    let at = |i: usize, j: usize| i * (m + 1) + j;

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[at(i, j)] = if old[i].id == new[j].id {
                table[at(i + 1, j + 1)] + 1
            } else {
                table[at(i + 1, j)].max(table[at(i, j + 1)])
            };
        }
    }

    // Walk the table to classify each position
    let mut removes = Vec::new();
    let mut inserts = Vec::new();
    let mut updates = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if old[i].id == new[j].id {
            if old[i] != new[j] {
                updates.push(ListOp::Update {
                    index: j,
                    id: new[j].id,
                });
            }
            i += 1;
            j += 1;
        } else if table[at(i + 1, j)] >= table[at(i, j + 1)] {
            removes.push(ListOp::Remove {
                index: i,
                id: old[i].id,
            });
            i += 1;
        } else {
            inserts.push(ListOp::Insert {
                index: j,
                id: new[j].id,
            });
            j += 1;
        }
    }
    while i < n {
        removes.push(ListOp::Remove {
            index: i,
            id: old[i].id,
        });
        i += 1;
    }
    while j < m {
        inserts.push(ListOp::Insert {
            index: j,
            id: new[j].id,
        });
        j += 1;
    }

    removes.reverse();
    let mut ops = removes;
    ops.extend(inserts);
    ops.extend(updates);
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MediaKind, MediaRecord};

    fn record(id: i64) -> MediaRecord {
        MediaRecord {
            id,
            bucket_id: 1,
            display_name: format!("f{id}"),
            folder_name: None,
            favorite: false,
            trashed: false,
            kind: MediaKind::Image,
            mime: "image/jpeg".to_string(),
            added_ms: id * 1000,
            modified_ms: id * 1000,
            width: 10,
            height: 10,
            orientation: 0,
            latitude: None,
            longitude: None,
        }
    }

    fn list(ids: &[i64]) -> Vec<MediaRecord> {
        ids.iter().copied().map(record).collect()
    }

    /// Reference interpreter for the op contract
    fn apply(old: &[MediaRecord], ops: &[ListOp]) -> Vec<i64> {
        let mut ids: Vec<i64> = old.iter().map(|r| r.id).collect();
        for op in ops {
            match op {
                ListOp::Remove { index, .. } => {
                    ids.remove(*index);
                }
                ListOp::Insert { index, id } => ids.insert(*index, *id),
                ListOp::Update { index, id } => assert_eq!(ids[*index], *id),
            }
        }
        ids
    }

    fn check(old_ids: &[i64], new_ids: &[i64]) -> Vec<ListOp> {
        let old = list(old_ids);
        let new = list(new_ids);
        let ops = diff(&old, &new);
        assert_eq!(apply(&old, &ops), new_ids.to_vec());
        ops
    }

    #[test]
    fn test_identical_lists_need_no_ops() {
        assert!(check(&[1, 2, 3], &[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_pure_insert() {
        let ops = check(&[1, 3], &[1, 2, 3]);
        assert_eq!(ops, vec![ListOp::Insert { index: 1, id: 2 }]);
    }

    #[test]
    fn test_pure_remove() {
        let ops = check(&[1, 2, 3], &[1, 3]);
        assert_eq!(ops, vec![ListOp::Remove { index: 1, id: 2 }]);
    }

    #[test]
    fn test_new_item_arrives_at_front() {
        // The common gallery case: a fresh capture lands at the top of a
        // date-descending list.
        let ops = check(&[5, 4, 3], &[6, 5, 4, 3]);
        assert_eq!(ops, vec![ListOp::Insert { index: 0, id: 6 }]);
    }

    #[test]
    fn test_empty_transitions() {
        assert_eq!(check(&[], &[1, 2]).len(), 2);
        assert_eq!(check(&[1, 2], &[]).len(), 2);
        assert!(check(&[], &[]).is_empty());
    }

    #[test]
    fn test_content_change_is_update() {
        let old = list(&[1, 2]);
        let mut new = list(&[1, 2]);
        new[1].favorite = true;
        let ops = diff(&old, &new);
        assert_eq!(ops, vec![ListOp::Update { index: 1, id: 2 }]);
    }

    #[test]
    fn test_mixed_change_applies_cleanly() {
        check(&[9, 7, 5, 3, 1], &[10, 9, 5, 4, 1]);
    }
}
