use std::iter::FusedIterator;

use tracing::trace;

use super::{IndexNode, Links, OptIndex};
use crate::util::panic::pedantic_assert;

/// The ends of a doubly linked chain threaded through a node array. An empty chain has both ends
/// null, a non-empty one has neither.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexChain {
    pub first: OptIndex,
    pub last: OptIndex,
}

impl IndexChain {
    /// A chain with no nodes.
    pub const EMPTY: IndexChain = IndexChain {
        first: OptIndex::NULL,
        last: OptIndex::NULL,
    };

    pub const fn new() -> IndexChain {
        IndexChain::EMPTY
    }

    /// Creates a chain holding only the node at `index`. The node itself must be isolated.
    pub const fn single(index: usize) -> IndexChain {
        let index = OptIndex::new(index);
        IndexChain {
            first: index,
            last: index,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.first.is_null()
    }

    /// Returns an iterator over the indices of this chain, from first to last.
    pub fn iter<'a, N: IndexNode>(&self, arr: &'a [N]) -> ChainIter<'a, N> {
        ChainIter {
            arr,
            next: self.first,
        }
    }

    /// Counts the nodes in this chain by walking it.
    pub fn count<N: IndexNode>(&self, arr: &[N]) -> usize {
        self.iter(arr).count()
    }
}

/// An iterator over the indices in an [`IndexChain`], following `next` links.
pub struct ChainIter<'a, N> {
    arr: &'a [N],
    next: OptIndex,
}

impl<N: IndexNode> Iterator for ChainIter<'_, N> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next.get()?;
        self.next = self.arr[index].links().next;
        Some(index)
    }
}

impl<N: IndexNode> FusedIterator for ChainIter<'_, N> {}

fn links<N: IndexNode>(arr: &[N], index: usize) -> &Links {
    arr[index].links()
}

fn links_mut<N: IndexNode>(arr: &mut [N], index: usize) -> &mut Links {
    arr[index].links_mut()
}

/// Returns true if `before` and `after` are directly linked to each other, treating a null end as
/// matching anything.
fn are_adjacent<N: IndexNode>(arr: &[N], before: OptIndex, after: OptIndex) -> bool {
    before.get().is_none_or(|b| links(arr, b).next == after)
        && after.get().is_none_or(|a| links(arr, a).prev == before)
}

/// Links the run `first..=last` between `before` and `after`, which must currently be adjacent (or
/// null). The run's outer links are overwritten, inner links are left untouched.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. In debug builds, also panics if `before` and
/// `after` aren't adjacent.
#[track_caller]
pub fn link_chain<N: IndexNode>(
    arr: &mut [N],
    before: OptIndex,
    first: usize,
    last: usize,
    after: OptIndex,
) {
    debug_assert!(
        are_adjacent(arr, before, after),
        "Linking between nodes which aren't adjacent!"
    );

    if let Some(before) = before.get() {
        links_mut(arr, before).next = OptIndex::new(first);
    }
    links_mut(arr, first).prev = before;
    links_mut(arr, last).next = after;
    if let Some(after) = after.get() {
        links_mut(arr, after).prev = OptIndex::new(last);
    }
}

/// Unlinks the run `first..=last` from between `before` and `after`, leaving those two adjacent
/// and the run isolated at both ends.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. In debug builds, also panics if the run isn't
/// linked between `before` and `after`.
#[track_caller]
pub fn unlink_chain<N: IndexNode>(
    arr: &mut [N],
    before: OptIndex,
    first: usize,
    last: usize,
    after: OptIndex,
) {
    debug_assert!(
        are_adjacent(arr, before, OptIndex::new(first))
            && are_adjacent(arr, OptIndex::new(last), after),
        "Unlinking a run which isn't linked between the provided nodes!"
    );

    if let Some(before) = before.get() {
        links_mut(arr, before).next = after;
    }
    if let Some(after) = after.get() {
        links_mut(arr, after).prev = before;
    }
    links_mut(arr, first).prev = OptIndex::NULL;
    links_mut(arr, last).next = OptIndex::NULL;
}

/// Inserts the isolated `node` into `chain` directly after `insert_after`, or at the front if
/// `insert_after` is null. The chain's ends are updated as required.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. With the `pedantic` feature, also panics if
/// `node` isn't isolated or `chain` isn't connected.
#[track_caller]
pub fn insert_node<N: IndexNode>(
    chain: &mut IndexChain,
    arr: &mut [N],
    insert_after: OptIndex,
    node: usize,
) {
    pedantic_assert!(is_isolated(arr, node), "Inserting a node which is still linked!");
    insert_chain(chain, arr, insert_after, IndexChain::single(node));
}

/// Extracts `node` from `chain`, where `extract_after` is the node currently before it (or null if
/// it is first). The node is left isolated.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. In debug builds, also panics if `extract_after`
/// isn't the node's predecessor.
#[track_caller]
pub fn extract_node<N: IndexNode>(
    chain: &mut IndexChain,
    arr: &mut [N],
    extract_after: OptIndex,
    node: usize,
) {
    debug_assert_eq!(
        links(arr, node).prev,
        extract_after,
        "Extracting a node which doesn't follow the provided one!"
    );
    extract_chain(chain, arr, node, node);
}

/// Extracts `node` from `chain`, reading its predecessor from its own links.
#[track_caller]
pub fn remove_node<N: IndexNode>(chain: &mut IndexChain, arr: &mut [N], node: usize) {
    extract_chain(chain, arr, node, node);
}

/// Inserts every node of `other` into `chain` directly after `insert_after`, or at the front if
/// `insert_after` is null. Nodes in `other` keep their relative order. Inserting an empty chain
/// does nothing.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. With the `pedantic` feature, also panics if
/// either chain isn't connected before linking, or `chain` isn't connected afterwards.
#[track_caller]
pub fn insert_chain<N: IndexNode>(
    chain: &mut IndexChain,
    arr: &mut [N],
    insert_after: OptIndex,
    other: IndexChain,
) {
    let (Some(first), Some(last)) = (other.first.get(), other.last.get()) else {
        return;
    };
    pedantic_assert!(is_connected(arr, *chain), "Inserting into a broken chain!");
    pedantic_assert!(is_connected(arr, other), "Inserting a broken chain!");

    let after = match insert_after.get() {
        Some(index) => links(arr, index).next,
        None => chain.first,
    };
    trace!(first, last, ?insert_after, "linking run into chain");
    link_chain(arr, insert_after, first, last, after);

    if insert_after.is_null() {
        chain.first = other.first;
    }
    if after.is_null() {
        chain.last = other.last;
    }
    pedantic_assert!(is_connected(arr, *chain), "Inserting left the chain broken!");
}

/// Extracts the run `first..=last` from `chain`, returning it as a chain of its own.
///
/// # Panics
/// Panics if any index is out of bounds for `arr`. In debug builds, also panics if the run's outer
/// links are inconsistent. With the `pedantic` feature, also panics if `chain` or the extracted run
/// isn't connected.
#[track_caller]
pub fn extract_chain<N: IndexNode>(
    chain: &mut IndexChain,
    arr: &mut [N],
    first: usize,
    last: usize,
) -> IndexChain {
    pedantic_assert!(is_connected(arr, *chain), "Extracting from a broken chain!");

    let before = links(arr, first).prev;
    let after = links(arr, last).next;
    trace!(first, last, "unlinking run from chain");
    unlink_chain(arr, before, first, last, after);

    if before.is_null() {
        chain.first = after;
    }
    if after.is_null() {
        chain.last = before;
    }

    let extracted = IndexChain {
        first: OptIndex::new(first),
        last: OptIndex::new(last),
    };
    pedantic_assert!(is_connected(arr, *chain), "Extracting left the chain broken!");
    pedantic_assert!(is_connected(arr, extracted), "Extracted a broken run!");
    extracted
}

/// Returns true if the node at `index` has no neighbours.
pub fn is_isolated<N: IndexNode>(arr: &[N], index: usize) -> bool {
    links(arr, index).is_isolated()
}

/// Walks `chain` and checks that every link agrees with its neighbour, that the walk ends at
/// `chain.last` and that no more than `arr.len()` nodes are visited.
pub fn is_connected<N: IndexNode>(arr: &[N], chain: IndexChain) -> bool {
    let Some(first) = chain.first.get() else {
        return chain.last.is_null();
    };
    if first >= arr.len() || links(arr, first).prev.is_some() {
        return false;
    }

    let mut current = first;
    for _ in 0..arr.len() {
        let next = links(arr, current).next;
        match next.get() {
            None => return chain.last == OptIndex::new(current),
            Some(next) if next >= arr.len() => return false,
            Some(next) => {
                if links(arr, next).prev != OptIndex::new(current) {
                    return false;
                }
                current = next;
            },
        }
    }
    false
}
