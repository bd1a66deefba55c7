//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Project ordering service and re-sequencing rules."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Planning rules for the `orden` sequence.
//!
//! Every function here is pure: it inspects a snapshot of the collection and
//! returns the position changes to write. Records without an `orden` sort as
//! [`MISSING_ORDEN`] and are never shifted by reorder or compaction.

use std::cmp::Ordering;

use catalogo_store::ProjectRecord;
use serde::Deserialize;

/// Sort key used for records that lack an `orden` value.
pub const MISSING_ORDEN: i64 = 9999;

/// A single position change produced by a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdenShift {
    pub id: String,
    pub from: Option<i64>,
    pub to: i64,
}

impl OrdenShift {
    fn of(record: &ProjectRecord, to: i64) -> Self {
        Self {
            id: record.id.clone(),
            from: record.orden,
            to,
        }
    }
}

/// Direction of a swap with the adjacent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum Direction {
    /// Towards the start of the list (-1).
    Up,
    /// Towards the end of the list (+1).
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            other => Err(format!("direction must be -1 or 1, got {other}")),
        }
    }
}

pub fn sort_key(record: &ProjectRecord) -> i64 {
    record.orden.unwrap_or(MISSING_ORDEN)
}

fn compare(a: &ProjectRecord, b: &ProjectRecord) -> Ordering {
    sort_key(a)
        .cmp(&sort_key(b))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort ascending by `orden`; ties fall back to the identifier.
pub fn sort_projects(records: &mut [ProjectRecord]) {
    records.sort_by(compare);
}

/// Shifts required to move `moved_id` from `old` to `new`.
///
/// Moving up shifts every other record in `[new, old)` down by one; moving
/// down shifts every other record in `(old, new]` up by one. The moved record
/// itself is not part of the result.
pub fn plan_reorder(
    records: &[ProjectRecord],
    moved_id: &str,
    old: i64,
    new: i64,
) -> Vec<OrdenShift> {
    records
        .iter()
        .filter(|record| record.id != moved_id)
        .filter_map(|record| {
            let orden = record.orden?;
            match new.cmp(&old) {
                Ordering::Less if orden >= new && orden < old => {
                    Some(OrdenShift::of(record, orden + 1))
                }
                Ordering::Greater if orden > old && orden <= new => {
                    Some(OrdenShift::of(record, orden - 1))
                }
                _ => None,
            }
        })
        .collect()
}

/// Shifts that close the gap left by deleting `deleted_id` at `deleted`.
pub fn plan_compaction(
    records: &[ProjectRecord],
    deleted_id: &str,
    deleted: i64,
) -> Vec<OrdenShift> {
    records
        .iter()
        .filter(|record| record.id != deleted_id)
        .filter_map(|record| {
            let orden = record.orden?;
            (orden > deleted).then(|| OrdenShift::of(record, orden - 1))
        })
        .collect()
}

/// Exchange positions of `sorted[index]` and its neighbour in `direction`.
///
/// `sorted` must already be ordered by [`sort_projects`]. Returns `None` when
/// the neighbour would fall outside the list. A record lacking `orden` counts
/// as sitting at its 1-based place in the list, raised above the position of
/// the record before it.
pub fn plan_swap(
    sorted: &[ProjectRecord],
    index: usize,
    direction: Direction,
) -> Option<[OrdenShift; 2]> {
    let neighbour = index.checked_add_signed(direction.offset())?;
    let current = sorted.get(index)?;
    let adjacent = sorted.get(neighbour)?;
    let positions = list_positions(&sorted[..=index.max(neighbour)]);
    Some([
        OrdenShift::of(current, positions[neighbour]),
        OrdenShift::of(adjacent, positions[index]),
    ])
}

/// Position of every record in `sorted`: its `orden` when set, otherwise its
/// 1-based place in the list, raised above the previous record's position.
fn list_positions(sorted: &[ProjectRecord]) -> Vec<i64> {
    let mut previous = 0;
    sorted
        .iter()
        .zip(1i64..)
        .map(|(record, place)| {
            let position = record.orden.unwrap_or(place.max(previous + 1));
            previous = position;
            position
        })
        .collect()
}

/// Rewrite positions to `1..=n` following the order of `sorted`.
///
/// Records already holding their target value are skipped.
pub fn plan_resequence(sorted: &[ProjectRecord]) -> Vec<OrdenShift> {
    sorted
        .iter()
        .zip(1i64..)
        .filter(|(record, target)| record.orden != Some(*target))
        .map(|(record, target)| OrdenShift::of(record, target))
        .collect()
}
