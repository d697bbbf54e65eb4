#![cfg(test)]

use proptest::prelude::*;

use super::*;
use crate::util::panic::assert_panics;

#[derive(Debug)]
struct Node {
    value: char,
    links: Links,
}

impl IndexNode for Node {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

fn nodes(values: &str) -> Vec<Node> {
    values
        .chars()
        .map(|value| Node {
            value,
            links: Links::ISOLATED,
        })
        .collect()
}

fn collect(chain: &IndexChain, arr: &[Node]) -> String {
    chain.iter(arr).map(|i| arr[i].value).collect()
}

fn chain_of(arr: &mut [Node], order: &[usize]) -> IndexChain {
    let mut chain = IndexChain::new();
    let mut last = OptIndex::NULL;
    for &index in order {
        insert_node(&mut chain, arr, last, index);
        last = OptIndex::new(index);
    }
    chain
}

#[test]
fn test_opt_index() {
    assert!(OptIndex::NULL.is_null());
    assert_eq!(OptIndex::default(), OptIndex::NULL);
    assert_eq!(OptIndex::new(7).get(), Some(7));
    assert_eq!(OptIndex::from(None).get(), None);
    assert_eq!(OptIndex::from(Some(3)), OptIndex::new(3));
    assert_eq!(OptIndex::NULL.to_raw(), NULL_INDEX);
    assert_eq!(format!("{:?}", OptIndex::new(2)), "OptIndex(2)");
    assert_eq!(format!("{:?}", OptIndex::NULL), "OptIndex(NULL)");

    assert_panics!({ OptIndex::new(NULL_INDEX as usize) });
}

#[test]
fn test_insert_front_back_middle() {
    let mut arr = nodes("abcd");
    let mut chain = IndexChain::new();
    assert!(is_connected(&arr, chain));

    insert_node(&mut chain, &mut arr, OptIndex::NULL, 1);
    assert_eq!(chain, IndexChain::single(1), "The first node should be both ends.");

    insert_node(&mut chain, &mut arr, OptIndex::NULL, 0);
    insert_node(&mut chain, &mut arr, OptIndex::new(1), 3);
    insert_node(&mut chain, &mut arr, OptIndex::new(1), 2);

    assert_eq!(collect(&chain, &arr), "abcd");
    assert_eq!(chain.first, OptIndex::new(0));
    assert_eq!(chain.last, OptIndex::new(3));
    assert_eq!(chain.count(&arr), 4);
    assert!(is_connected(&arr, chain));
}

#[test]
fn test_extract_isolates() {
    let mut arr = nodes("abcde");
    let mut chain = chain_of(&mut arr, &[0, 1, 2, 3, 4]);

    extract_node(&mut chain, &mut arr, OptIndex::new(1), 2);
    assert!(is_isolated(&arr, 2), "An extracted node should have no links.");
    assert_eq!(collect(&chain, &arr), "abde");

    extract_node(&mut chain, &mut arr, OptIndex::NULL, 0);
    assert_eq!(chain.first, OptIndex::new(1));
    remove_node(&mut chain, &mut arr, 4);
    assert_eq!(chain.last, OptIndex::new(3));
    assert_eq!(collect(&chain, &arr), "bd");

    remove_node(&mut chain, &mut arr, 1);
    remove_node(&mut chain, &mut arr, 3);
    assert!(chain.is_empty());
    assert_eq!(chain, IndexChain::EMPTY);
    assert!(arr.iter().all(|node| node.links.is_isolated()));
}

#[test]
#[cfg(debug_assertions)]
fn test_extract_wrong_predecessor() {
    let mut arr = nodes("abc");
    let mut chain = chain_of(&mut arr, &[0, 1, 2]);

    assert_panics!({ extract_node(&mut chain, &mut arr, OptIndex::new(0), 2) });
}

#[test]
fn test_extract_then_insert_chain() {
    let mut arr = nodes("abcdef");
    let mut chain = chain_of(&mut arr, &[0, 1, 2, 3, 4, 5]);

    let run = extract_chain(&mut chain, &mut arr, 1, 3);
    assert_eq!(collect(&chain, &arr), "aef");
    assert_eq!(collect(&run, &arr), "bcd", "An extracted run should keep its inner links.");
    assert!(is_connected(&arr, run));

    insert_chain(&mut chain, &mut arr, OptIndex::new(5), run);
    assert_eq!(collect(&chain, &arr), "aefbcd");
    assert_eq!(chain.last, OptIndex::new(3));

    let run = extract_chain(&mut chain, &mut arr, 0, 5);
    assert_eq!(collect(&run, &arr), "aef");
    insert_chain(&mut chain, &mut arr, OptIndex::NULL, run);
    assert_eq!(collect(&chain, &arr), "aefbcd");

    insert_chain(&mut chain, &mut arr, OptIndex::new(0), IndexChain::EMPTY);
    assert_eq!(collect(&chain, &arr), "aefbcd", "Inserting an empty chain should do nothing.");
}

#[test]
fn test_link_unlink_inverse() {
    let mut arr = nodes("abcde");
    let chain = chain_of(&mut arr, &[0, 4]);
    let run = chain_of(&mut arr, &[1, 2, 3]);
    assert_eq!(collect(&run, &arr), "bcd");

    link_chain(&mut arr, OptIndex::new(0), 1, 3, OptIndex::new(4));
    assert_eq!(collect(&chain, &arr), "abcde");

    unlink_chain(&mut arr, OptIndex::new(0), 1, 3, OptIndex::new(4));
    assert_eq!(collect(&chain, &arr), "ae");
    assert!(arr[1].links.prev.is_null());
    assert!(arr[3].links.next.is_null());
    assert_eq!(collect(&run, &arr), "bcd");
    assert!(is_connected(&arr, chain));
}

#[test]
#[cfg(debug_assertions)]
fn test_link_non_adjacent() {
    let mut arr = nodes("abcd");
    let _chain = chain_of(&mut arr, &[0, 1, 2]);

    assert_panics!({ link_chain(&mut arr, OptIndex::new(0), 3, 3, OptIndex::new(2)) });
}

#[test]
fn test_is_connected_detects_breaks() {
    let mut arr = nodes("abc");
    let chain = chain_of(&mut arr, &[0, 1, 2]);
    assert!(is_connected(&arr, chain));

    arr[1].links.prev = OptIndex::new(2);
    assert!(!is_connected(&arr, chain), "A mismatched back link should be detected.");

    arr[1].links.prev = OptIndex::new(0);
    arr[2].links.next = OptIndex::new(0);
    assert!(!is_connected(&arr, chain), "A cycle should be detected.");

    arr[2].links.next = OptIndex::NULL;
    let wrong_end = IndexChain {
        first: OptIndex::new(0),
        last: OptIndex::new(1),
    };
    assert!(!is_connected(&arr, wrong_end));
}

#[test]
#[cfg(feature = "pedantic")]
fn test_pedantic_insert_linked_node() {
    let mut arr = nodes("abc");
    let mut chain = chain_of(&mut arr, &[0, 1, 2]);

    assert_panics!({ insert_node(&mut chain, &mut arr, OptIndex::new(1), 0) });
}

#[test]
#[cfg(feature = "pedantic")]
fn test_pedantic_broken_chains() {
    let mut arr = nodes("abcde");
    let mut chain = chain_of(&mut arr, &[0, 1, 2]);

    let broken_run = IndexChain {
        first: OptIndex::new(3),
        last: OptIndex::new(4),
    };
    assert_panics!(
        { insert_chain(&mut chain, &mut arr, OptIndex::new(2), broken_run) },
        "Inserting a run whose ends aren't linked should panic."
    );

    arr[1].links.prev = OptIndex::new(2);
    assert_panics!(
        { insert_node(&mut chain, &mut arr, OptIndex::new(2), 3) },
        "Inserting into a broken chain should panic."
    );
    assert_panics!(
        { extract_chain(&mut chain, &mut arr, 2, 2) },
        "Extracting from a broken chain should panic."
    );
}

proptest! {
    #[test]
    fn operations_match_model(
        ops in proptest::collection::vec((any::<bool>(), any::<usize>()), 0..200),
    ) {
        const NODES: usize = 16;
        let mut arr = vec![Links::ISOLATED; NODES];
        let mut chain = IndexChain::new();
        let mut model: Vec<usize> = Vec::new();

        for (insert, seed) in ops {
            let free: Vec<usize> = (0..NODES).filter(|i| !model.contains(i)).collect();
            if (insert && !free.is_empty()) || model.is_empty() {
                let node = free[seed % free.len()];
                let position = seed % (model.len() + 1);
                let insert_after = match position {
                    0 => OptIndex::NULL,
                    p => OptIndex::new(model[p - 1]),
                };
                insert_node(&mut chain, &mut arr, insert_after, node);
                model.insert(position, node);
            } else {
                let position = seed % model.len();
                let node = model.remove(position);
                let prev = arr[node].prev;
                extract_node(&mut chain, &mut arr, prev, node);
                prop_assert!(is_isolated(&arr, node));
            }

            prop_assert!(is_connected(&arr, chain));
            prop_assert_eq!(chain.iter(&arr).collect::<Vec<_>>(), model.clone());
        }
    }
}
