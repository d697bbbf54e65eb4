#![cfg(test)]

use std::mem::MaybeUninit;

use proptest::prelude::*;

use super::*;
use crate::alloc::{Allocator, Arena};
use crate::util::alloc::{CountedDrop, TrackingAllocator, ZeroSizedType};
use crate::util::panic::assert_panics;

fn blocks_of<T: Clone, A: Allocator>(list: &BlockList<T, A>) -> Vec<Vec<T>> {
    list.blocks().map(<[T]>::to_vec).collect()
}

#[test]
fn test_push_then_pop_front() {
    let mut list = BlockList::new();
    list.push_back([1, 2, 3]);
    list.push_back([4, 5]);
    assert_eq!(list.block_len(), 2);
    assert_eq!(list.len(), 5);

    let popped = list.pop_front(1);
    assert_eq!(blocks_of(&popped), [vec![1, 2, 3]], "The first block should be popped whole.");
    assert_eq!(popped.len(), 3);
    assert_eq!(list.block_len(), 1);
    assert_eq!(list.len(), 2);
    assert_eq!(blocks_of(&list), [vec![4, 5]]);
    assert!(list.verify() && popped.verify());
}

#[test]
fn test_push_front_order() {
    let mut list = BlockList::new();
    list.push_front_slice(&['c']);
    list.push_front(['a', 'b']);
    list.push_back_slice(&['d', 'e']);

    assert_eq!(blocks_of(&list), [vec!['a', 'b'], vec!['c'], vec!['d', 'e']]);
    assert!(list.iter().copied().eq("abcde".chars()));
    assert!(list.iter().rev().copied().eq("edcba".chars()));
    assert_eq!(list.front(), Some(&'a'));
    assert_eq!(list.back(), Some(&'e'));
    assert!(list.verify());
}

#[test]
fn test_empty_push_allocates_nothing() {
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::<u8, _>::new_in(&alloc);

    list.push_back([]);
    list.push_front_slice(&[]);
    assert!(list.is_empty());
    assert_eq!(list.block_len(), 0);
    assert_eq!(alloc.allocations(), 0, "Pushing nothing shouldn't allocate a block.");
}

#[test]
fn test_pop_clamps() {
    let mut list = BlockList::new();
    for i in 0..3 {
        list.push_back([i; 2]);
    }

    let none = list.pop_back(0);
    assert!(none.is_empty());
    assert_eq!(list.block_len(), 3);

    let popped = list.pop_back(10);
    assert_eq!(popped.block_len(), 3, "Popping more blocks than exist should take them all.");
    assert_eq!(blocks_of(&popped), [vec![0, 0], vec![1, 1], vec![2, 2]]);
    assert!(list.is_empty());
    assert!(list.first.is_none() && list.last.is_none());
    assert!(list.pop_front(1).is_empty());
}

#[test]
fn test_pop_block() {
    let mut list = BlockList::new();
    for block in ["ab", "cd", "ef", "gh"] {
        list.push_back(block.chars().collect::<Vec<_>>());
    }

    let middle = list.pop_block_at(1).unwrap();
    assert_eq!(blocks_of(&middle), [vec!['c', 'd']]);
    assert_eq!(list.block_len(), 3);
    assert_eq!(list.len(), 6, "Popping a middle block should update the item count.");
    assert!(list.verify() && middle.verify());

    let last = list.handle_at(2).unwrap();
    assert!(list.contains_block(last));
    // SAFETY: The handle was just taken from this list.
    let popped = unsafe { list.pop_block(last) };
    assert_eq!(blocks_of(&popped), [vec!['g', 'h']]);
    assert!(!list.contains_block(last));

    let first = list.handle_at(0).unwrap();
    // SAFETY: The handle was just taken from this list.
    let popped = unsafe { list.pop_block(first) };
    assert_eq!(blocks_of(&popped), [vec!['a', 'b']]);
    assert_eq!(blocks_of(&list), [vec!['e', 'f']]);
    assert!(list.verify());

    assert!(list.pop_block_at(1).is_none());
}

#[test]
fn test_item_at() {
    let mut list = BlockList::new();
    list.push_back([0, 1, 2]);
    list.push_back([3]);
    list.push_back([4, 5, 6, 7]);
    list.push_back([8, 9]);

    for i in 0..10 {
        assert_eq!(list.item_at(i), Some(&i), "Item {i} should be found from either end.");
    }
    assert_eq!(list.item_at(10), None);

    *list.item_at_mut(5).unwrap() = 50;
    *list.item_at_mut(1).unwrap() = 10;
    assert_eq!(blocks_of(&list)[2], [4, 50, 6, 7]);
    assert_eq!(blocks_of(&list)[0], [0, 10, 2]);
}

#[test]
fn test_block_at() {
    let mut list = BlockList::new();
    list.push_back([1]);
    list.push_back([2, 2]);
    list.push_back([3, 3, 3]);

    assert_eq!(list.block_at(0), Some(&[1][..]));
    assert_eq!(list.block_at(2), Some(&[3, 3, 3][..]));
    assert_eq!(list.block_at(3), None);
    assert_eq!(list.block_at_back(0), Some(&[3, 3, 3][..]));
    assert_eq!(list.block_at_back(2), Some(&[1][..]));
    assert_eq!(list.block_at_back(3), None);

    list.block_at_mut(1).unwrap().fill(7);
    assert_eq!(list.block_at(1), Some(&[7, 7][..]));
}

#[test]
fn test_append_equal_allocators() {
    let alloc = TrackingAllocator::new();
    let mut a = BlockList::new_in(&alloc);
    let mut b = BlockList::new_in(&alloc);
    a.push_back([1, 2]);
    b.push_back([3]);
    b.push_back([4, 5]);
    let allocations = alloc.allocations();

    a.append(&mut b);
    assert_eq!(alloc.allocations(), allocations, "Equal allocators should splice blocks.");
    assert!(b.is_empty() && b.len() == 0);
    assert_eq!(blocks_of(&a), [vec![1, 2], vec![3], vec![4, 5]]);

    let mut c = BlockList::new_in(&alloc);
    c.push_back([0]);
    a.prepend(&mut c);
    assert_eq!(blocks_of(&a), [vec![0], vec![1, 2], vec![3], vec![4, 5]]);
    assert_eq!(a.len(), 6);
    assert!(a.verify() && c.verify());

    a.append(&mut c);
    assert_eq!(a.block_len(), 4, "Appending an empty list should do nothing.");
}

#[test]
fn test_append_unequal_allocators() {
    let first = TrackingAllocator::new();
    let second = TrackingAllocator::new();
    let mut a = BlockList::new_in(&first);
    let mut b = BlockList::new_in(&second);
    a.push_back([1]);
    b.push_back([2, 3]);
    b.push_back([4]);

    a.append(&mut b);
    assert_eq!(blocks_of(&a), [vec![1], vec![2, 3], vec![4]]);
    assert_eq!(first.live(), 3, "Every block should have moved to the first allocator.");
    assert_eq!(second.live(), 0, "The second allocator should have been given its blocks back.");
    assert!(b.is_empty());
    assert!(a.verify() && b.verify());
}

#[test]
fn test_append_failure_leaves_lists_unchanged() {
    let first = TrackingAllocator::new();
    let second = TrackingAllocator::new();
    let mut a = BlockList::new_in(&first);
    let mut b = BlockList::new_in(&second);
    a.push_back([1]);
    b.push_back([2, 3]);
    b.push_back([4]);

    first.fail_after(1);
    let err = a.try_append(&mut b).unwrap_err();
    assert!(err.is_allocator_failure());
    assert_eq!(first.live(), 1, "The partially migrated blocks should have been released.");
    assert_eq!(blocks_of(&a), [vec![1]]);
    assert_eq!(blocks_of(&b), [vec![2, 3], vec![4]]);
    assert!(a.verify() && b.verify());

    first.never_fail();
    a.try_prepend(&mut b).unwrap();
    assert_eq!(blocks_of(&a), [vec![2, 3], vec![4], vec![1]]);
}

#[test]
fn test_allocation_failure_leaves_list_unchanged() {
    let mut buf = [MaybeUninit::uninit(); 128];
    let arena = Arena::new(&mut buf);
    let mut list = BlockList::<u64, _>::new_in(&arena);
    list.push_back([1, 2]);

    let err = list.try_push_back([0; 64]).unwrap_err();
    assert!(err.is_allocator_failure());
    assert_eq!(blocks_of(&list), [vec![1, 2]]);
    assert!(list.verify());

    let dropped = CountedDrop::new(0);
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::new_in(&alloc);
    alloc.fail_after(0);
    assert!(list.try_push_front([dropped.clone(), dropped.clone()]).is_err());
    assert_eq!(*dropped.borrow(), 2, "Items which couldn't be pushed should be dropped.");
    assert!(list.is_empty());
}

#[test]
fn test_drop() {
    let dropped = CountedDrop::new(0);
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::new_in(&alloc);
    for len in 1..5 {
        list.push_back((0..len).map(|_| dropped.clone()));
    }
    assert_eq!(alloc.live(), 4);

    drop(list);
    assert_eq!(*dropped.borrow(), 10, "Dropping a list should drop every item.");
    assert_eq!(alloc.live(), 0, "Dropping a list should release every block.");
}

#[test]
fn test_panicking_fill() {
    let dropped = CountedDrop::new(0);
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::new_in(&alloc);

    assert_panics!({
        list.push_back((0..4).map(|i| {
            assert!(i < 2);
            dropped.clone()
        }))
    });
    assert_eq!(*dropped.borrow(), 2, "Items written before the panic should be dropped.");
    assert_eq!(alloc.live(), 0, "The partially filled block should be released.");
    assert!(list.is_empty());
}

#[test]
fn test_into_iter() {
    let mut list = BlockList::new();
    list.push_back([1, 2, 3]);
    list.push_back([4]);
    list.push_back([5, 6]);

    let mut iter = list.clone().into_iter();
    assert_eq!(iter.len(), 6);
    assert_eq!(iter.next(), Some(1));
    assert_eq!(iter.next_back(), Some(6));
    assert_eq!(iter.next_back(), Some(5));
    assert_eq!(iter.next_back(), Some(4));
    assert_eq!(iter.next(), Some(2));
    assert_eq!(iter.next_back(), Some(3));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);

    assert_eq!(list.into_iter().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_into_iter_partial_drop() {
    let dropped = CountedDrop::new(0);
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::new_in(&alloc);
    list.push_back([dropped.clone(), dropped.clone()]);
    list.push_back([dropped.clone(), dropped.clone(), dropped.clone()]);

    let mut iter = list.into_iter();
    drop(iter.next());
    drop(iter.next());
    drop(iter.next());
    assert_eq!(*dropped.borrow(), 3);
    assert_eq!(alloc.live(), 1, "An exhausted block should be released straight away.");

    drop(iter);
    assert_eq!(*dropped.borrow(), 5);
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_iter_mut() {
    let mut list = BlockList::new();
    list.push_back([1, 2]);
    list.push_back([3]);

    for item in &mut list {
        *item *= 10;
    }
    assert_eq!(blocks_of(&list), [vec![10, 20], vec![30]]);
    assert_eq!(list.iter().len(), 3);
    assert_eq!(list.blocks().len(), 2);
}

#[test]
fn test_clone_and_eq() {
    let mut list = BlockList::new();
    list.push_back(["a".to_string(), "b".to_string()]);
    list.push_back(["c".to_string()]);

    let cloned = list.clone();
    assert_eq!(blocks_of(&cloned), blocks_of(&list), "Clones should keep block boundaries.");

    let mut other = BlockList::new();
    other.push_back(["a".to_string()]);
    other.push_back(["b".to_string(), "c".to_string()]);
    assert_eq!(list, other, "Equality shouldn't depend on block boundaries.");

    other.push_back(["d".to_string()]);
    assert_ne!(list, other);
    assert_eq!(format!("{cloned:?}"), r#"[["a", "b"], ["c"]]"#);
}

#[test]
fn test_zero_sized() {
    let alloc = TrackingAllocator::new();
    let mut list = BlockList::new_in(&alloc);
    list.push_back([ZeroSizedType; 3]);
    list.push_front([ZeroSizedType; 2]);

    assert_eq!(list.len(), 5);
    assert_eq!(alloc.live(), 2, "Blocks of zero sized items still need a header.");
    assert_eq!(list.item_at(4), Some(&ZeroSizedType));
    assert_eq!(list.pop_back(1).len(), 3);
    assert_eq!(list.into_iter().count(), 2);
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_over_aligned_items() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    #[repr(align(64))]
    struct Aligned(u8);

    let mut list = BlockList::new();
    list.push_back([Aligned(1), Aligned(2)]);
    list.push_back([Aligned(3)]);

    for block in list.blocks() {
        assert_eq!(block.as_ptr() as usize % 64, 0, "Items should respect their alignment.");
    }
    assert_eq!(list.item_at(2), Some(&Aligned(3)));
}

#[derive(Debug, Clone)]
enum Op {
    PushBack(Vec<u16>),
    PushFront(Vec<u16>),
    PopBack(usize),
    PopFront(usize),
    PopBlock(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let items = proptest::collection::vec(any::<u16>(), 0..8);
    prop_oneof![
        items.clone().prop_map(Op::PushBack),
        items.prop_map(Op::PushFront),
        (0usize..4).prop_map(Op::PopBack),
        (0usize..4).prop_map(Op::PopFront),
        any::<usize>().prop_map(Op::PopBlock),
    ]
}

proptest! {
    #[test]
    fn counts_are_conserved(ops in proptest::collection::vec(op(), 0..64)) {
        let mut list = BlockList::new();
        let mut model: Vec<Vec<u16>> = Vec::new();

        for op in ops {
            match op {
                Op::PushBack(items) => {
                    list.push_back_slice(&items);
                    if !items.is_empty() {
                        model.push(items);
                    }
                },
                Op::PushFront(items) => {
                    list.push_front_slice(&items);
                    if !items.is_empty() {
                        model.insert(0, items);
                    }
                },
                Op::PopBack(n) => {
                    let popped = list.pop_back(n);
                    let split = model.len() - n.min(model.len());
                    prop_assert_eq!(blocks_of(&popped), model.split_off(split));
                    prop_assert!(popped.verify());
                },
                Op::PopFront(n) => {
                    let popped = list.pop_front(n);
                    let rest = model.split_off(n.min(model.len()));
                    prop_assert_eq!(blocks_of(&popped), model);
                    prop_assert!(popped.verify());
                    model = rest;
                },
                Op::PopBlock(seed) => {
                    if !model.is_empty() {
                        let index = seed % model.len();
                        let popped = list.pop_block_at(index).unwrap();
                        prop_assert_eq!(blocks_of(&popped), [model.remove(index)]);
                    }
                },
            }

            prop_assert!(list.verify());
            prop_assert_eq!(list.block_len(), model.len());
            prop_assert_eq!(list.len(), model.iter().map(Vec::len).sum::<usize>());
            prop_assert_eq!(blocks_of(&list), model.clone());
        }
    }

    #[test]
    fn split_and_rejoin(
        blocks in proptest::collection::vec(proptest::collection::vec(any::<i32>(), 1..6), 0..12),
        k in 0usize..16,
    ) {
        let mut list = BlockList::new();
        for block in &blocks {
            list.push_back_slice(block);
        }
        let (len, block_len) = (list.len(), list.block_len());

        let mut popped = list.pop_back(k);
        prop_assert_eq!(popped.block_len(), k.min(block_len));
        list.append(&mut popped);

        prop_assert_eq!(list.len(), len);
        prop_assert_eq!(list.block_len(), block_len);
        prop_assert_eq!(blocks_of(&list), blocks);
        prop_assert!(list.verify());
    }
}
