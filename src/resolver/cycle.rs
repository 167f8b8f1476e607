//! Cycle reporting for the active resolution path.

use crate::scenario::Signature;

/// Build the cycle closed by re-entering `reentered` from `path`.
///
/// `path` is the chain of signatures currently being resolved, outermost
/// first; anything above `reentered` is not part of the cycle and is dropped.
/// The ring is then read starting at its smallest signature and closed by
/// repeating that signature, so the same cycle is reported identically
/// whichever of its scenarios the suite reached first.
pub(super) fn close_cycle(path: &[Signature], reentered: &Signature) -> Vec<Signature> {
    let start = path.iter().position(|sig| sig == reentered).unwrap_or(0);
    let ring = path.get(start..).unwrap_or_default();
    let lead = ring
        .iter()
        .enumerate()
        .min_by_key(|(_, sig)| *sig)
        .map_or(0, |(idx, _)| idx);
    ring.iter()
        .cycle()
        .skip(lead)
        .take(ring.len())
        .chain(ring.get(lead))
        .cloned()
        .collect()
}
