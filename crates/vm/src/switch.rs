//! Switch dispatch.
//!
//! Linear tables are scanned in order. Binary tables are sorted once at
//! link time and searched with the same three-way comparison; an
//! incomparable probe (NaN) or a type mismatch ends the search at the
//! default target instead of guessing a direction. Before sorting, entries
//! shadowed by an equal earlier key are dropped, so both strategies pick
//! the first matching case.

use brisk_common::{SwitchTable, Value};
use std::cmp::Ordering;

fn key<'a>(constants: &'a [Value], index: u16) -> Option<&'a Value> {
    constants.get(index as usize)
}

/// Order used to sort binary tables. Unordered pairs count as equal.
fn sort_order(a: &Value, b: &Value) -> Ordering {
    a.weak_compare(b).ok().flatten().unwrap_or(Ordering::Equal)
}

/// Sort `table` by the values its keys resolve to, keeping `targets`
/// parallel.
pub(crate) fn sort_table(table: &mut SwitchTable, constants: &[Value]) {
    let len = table.keys.len().min(table.targets.len());
    if table.keys[..len]
        .iter()
        .any(|&k| key(constants, k).is_none())
    {
        return;
    }
    drop_shadowed(table, len, constants);
    quicksort(&mut table.keys, &mut table.targets, constants);
}

/// Keep only the first of each run of equal keys, in table order.
fn drop_shadowed(table: &mut SwitchTable, len: usize, constants: &[Value]) {
    let value = |k: u16| &constants[k as usize];
    let mut kept = 0;
    for i in 0..len {
        let candidate = value(table.keys[i]);
        let shadowed = table.keys[..kept]
            .iter()
            .any(|&k| matches(value(k), candidate));
        if !shadowed {
            table.keys[kept] = table.keys[i];
            table.targets[kept] = table.targets[i];
            kept += 1;
        }
    }
    table.keys.truncate(kept);
    table.targets.truncate(kept);
}

fn quicksort(keys: &mut [u16], targets: &mut [u32], constants: &[Value]) {
    if keys.len() < 2 {
        return;
    }
    let split = partition(keys, targets, constants);
    let (low_keys, high_keys) = keys.split_at_mut(split + 1);
    let (low_targets, high_targets) = targets.split_at_mut(split + 1);
    quicksort(low_keys, low_targets, constants);
    quicksort(high_keys, high_targets, constants);
}

/// Hoare partition around the middle element. Returns `j` such that
/// `keys[..=j]` are not greater than the pivot and `keys[j + 1..]` are not
/// less; `j < keys.len() - 1`.
fn partition(keys: &mut [u16], targets: &mut [u32], constants: &[Value]) -> usize {
    let value = |k: u16| &constants[k as usize];
    let pivot = value(keys[(keys.len() - 1) / 2]).clone();
    let mut i = 0;
    let mut j = keys.len() - 1;
    loop {
        while sort_order(value(keys[i]), &pivot) == Ordering::Less {
            i += 1;
        }
        while sort_order(value(keys[j]), &pivot) == Ordering::Greater {
            j -= 1;
        }
        if i >= j {
            return j;
        }
        keys.swap(i, j);
        targets.swap(i, j);
        i += 1;
        j -= 1;
    }
}

fn matches(candidate: &Value, selector: &Value) -> bool {
    candidate.weak_compare(selector) == Ok(Some(Ordering::Equal))
}

/// First key equal to the selector wins.
pub(crate) fn linear_target(table: &SwitchTable, constants: &[Value], selector: &Value) -> u32 {
    if !selector.is_scalar() {
        return table.default;
    }
    table
        .keys
        .iter()
        .zip(&table.targets)
        .find(|(k, _)| key(constants, **k).is_some_and(|c| matches(c, selector)))
        .map(|(_, &target)| target)
        .unwrap_or(table.default)
}

/// Binary search over a table sorted by [`sort_table`].
pub(crate) fn binary_target(table: &SwitchTable, constants: &[Value], selector: &Value) -> u32 {
    if !selector.is_scalar() {
        return table.default;
    }
    let mut lo = 0;
    let mut hi = table.keys.len().min(table.targets.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let Some(candidate) = key(constants, table.keys[mid]) else {
            return table.default;
        };
        match candidate.weak_compare(selector) {
            Ok(Some(Ordering::Less)) => lo = mid + 1,
            Ok(Some(Ordering::Greater)) => hi = mid,
            Ok(Some(Ordering::Equal)) => return table.targets[mid],
            Ok(None) | Err(_) => return table.default,
        }
    }
    table.default
}
