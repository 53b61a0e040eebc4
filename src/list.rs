//! Pool-backed singly linked list
//!
//! The reference consumer for [`BlockPool`]: every node is a pool block,
//! so pushing and popping recycle fixed-size slots instead of hitting the
//! global allocator per element. Restructuring operations (`sort`,
//! `remove`) relink nodes in place and never move values.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::error::{PoolError, PoolResult};
use crate::pool::{BlockPool, PoolConfig, RawBlock};
use crate::sync::{RawLock, SpinLock};

struct Node<T> {
    value: T,
    next: Option<NonNull<Node<T>>>,
}

/// Singly linked list whose nodes live in an owned [`BlockPool`].
///
/// # Example
///
/// ```
/// use blockpool::PooledList;
///
/// let mut list = PooledList::new()?;
/// for n in [3, 1, 2] {
///     list.push_back(n)?;
/// }
/// list.sort();
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// # Ok::<(), blockpool::PoolError>(())
/// ```
pub struct PooledList<T, R: RawLock = SpinLock> {
    pool: BlockPool<R>,
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
}

impl<T> PooledList<T> {
    /// Empty list backed by a pool sized for a handful of nodes.
    pub fn new() -> PoolResult<Self> {
        Self::with_capacity(16)
    }

    /// Empty list whose pool starts with room for `nodes` elements. The
    /// pool grows on demand, so this is a hint, not a cap.
    pub fn with_capacity(nodes: usize) -> PoolResult<Self> {
        Self::with_capacity_in(nodes)
    }
}

impl<T, R: RawLock> PooledList<T, R> {
    /// Empty list with an explicit lock type for the backing pool.
    pub fn with_capacity_in(nodes: usize) -> PoolResult<Self> {
        let config = PoolConfig::new(size_of::<Node<T>>().max(1), nodes.max(1))
            .with_alignment(align_of::<Node<T>>());
        Ok(Self {
            pool: BlockPool::with_config_in(config)?,
            head: None,
            tail: None,
            len: 0,
        })
    }

    /// Elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        // SAFETY: head points at a live node owned by this list.
        self.head.map(|node| unsafe { &node.as_ref().value })
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        // SAFETY: tail points at a live node owned by this list.
        self.tail.map(|node| unsafe { &node.as_ref().value })
    }

    /// The backing pool, for capacity and statistics queries.
    pub fn pool(&self) -> &BlockPool<R> {
        &self.pool
    }

    /// Appends `value` at the back.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] if the backing pool cannot supply a node.
    pub fn push_back(&mut self, value: T) -> PoolResult<()> {
        let node = self.acquire(value)?;
        match self.tail {
            // SAFETY: tail is a live node; we own it exclusively via &mut.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Prepends `value` at the front.
    pub fn push_front(&mut self, value: T) -> PoolResult<()> {
        let mut node = self.acquire(value)?;
        // SAFETY: node is freshly acquired and not yet linked.
        unsafe { node.as_mut().next = self.head };
        if self.tail.is_none() {
            self.tail = Some(node);
        }
        self.head = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.head?;
        // SAFETY: head is a live node owned by this list.
        self.head = unsafe { node.as_ref().next };
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(self.release(node))
    }

    /// Unlinks and destroys the first element equal to `value`.
    ///
    /// Returns `true` if an element was removed. O(n).
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let mut prev: Option<NonNull<Node<T>>> = None;
        let mut cursor = self.head;

        while let Some(node) = cursor {
            // SAFETY: cursor walks live nodes owned by this list.
            let next = unsafe { node.as_ref().next };
            if unsafe { &node.as_ref().value } == value {
                match prev {
                    // SAFETY: prev is the live predecessor of node.
                    Some(mut p) => unsafe { p.as_mut().next = next },
                    None => self.head = next,
                }
                if self.tail == Some(node) {
                    self.tail = prev;
                }
                self.len -= 1;
                drop(self.release(node));
                return true;
            }
            prev = cursor;
            cursor = next;
        }
        false
    }

    /// The middle element: for an even length, the earlier of the two
    /// central elements. O(n) with a two-speed walk, no length counter
    /// consulted.
    pub fn middle(&self) -> Option<&T> {
        let mut slow = self.head?;
        // SAFETY: all cursors below walk live nodes owned by this list.
        let mut fast = unsafe { slow.as_ref().next };

        while let Some(f) = fast {
            let Some(f2) = (unsafe { f.as_ref().next }) else {
                break;
            };
            slow = unsafe { slow.as_ref().next }?;
            fast = unsafe { f2.as_ref().next };
        }

        Some(unsafe { &slow.as_ref().value })
    }

    /// Sorts the list in place, ascending and stable.
    ///
    /// Bottom-up merge sort over the links: runs of doubling width are
    /// merged per pass in O(n log n) time with O(1) extra space. No
    /// recursion, so arbitrarily long lists cannot overflow the stack.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        if self.len < 2 {
            return;
        }

        let mut list = self.head.take();
        self.tail = None;
        let mut width = 1usize;

        loop {
            let mut remaining = list.take();
            let mut merged_head: Option<NonNull<Node<T>>> = None;
            let mut merged_tail: Option<NonNull<Node<T>>> = None;
            let mut merges = 0usize;

            while let Some(left) = remaining {
                merges += 1;
                let right = Self::split_after(left, width);
                remaining = match right {
                    Some(r) => Self::split_after(r, width),
                    None => None,
                };

                let (head, tail) = Self::merge_runs(Some(left), right);
                match merged_tail {
                    // SAFETY: merged_tail is the live end of the merged
                    // prefix; appending the next merged run keeps one chain.
                    Some(mut t) => unsafe { t.as_mut().next = head },
                    None => merged_head = head,
                }
                merged_tail = tail;
            }

            list = merged_head;
            if merges <= 1 {
                self.tail = merged_tail;
                break;
            }
            width *= 2;
        }

        self.head = list;
    }

    /// Cuts the chain after `len` nodes starting at `start`; returns the
    /// detached remainder, if any.
    fn split_after(
        start: NonNull<Node<T>>,
        len: usize,
    ) -> Option<NonNull<Node<T>>> {
        let mut cursor = start;
        for _ in 1..len {
            // SAFETY: cursor walks live nodes of the chain being split.
            match unsafe { cursor.as_ref().next } {
                Some(next) => cursor = next,
                None => return None,
            }
        }
        // SAFETY: cursor is the last node of the leading run.
        unsafe {
            let rest = cursor.as_ref().next;
            cursor.as_mut().next = None;
            rest
        }
    }

    /// Merges two sorted runs; returns the merged head and tail. `<=`
    /// keeps equal elements in their original order.
    fn merge_runs(
        mut a: Option<NonNull<Node<T>>>,
        mut b: Option<NonNull<Node<T>>>,
    ) -> (Option<NonNull<Node<T>>>, Option<NonNull<Node<T>>>)
    where
        T: Ord,
    {
        let mut head: Option<NonNull<Node<T>>> = None;
        let mut tail: Option<NonNull<Node<T>>> = None;

        loop {
            // SAFETY: a and b walk the two live runs being merged.
            let take_a = match (a, b) {
                (Some(x), Some(y)) => unsafe { x.as_ref().value <= y.as_ref().value },
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            let mut node = if take_a {
                let Some(n) = a else { break };
                a = unsafe { n.as_ref().next };
                n
            } else {
                let Some(n) = b else { break };
                b = unsafe { n.as_ref().next };
                n
            };

            // SAFETY: node is detached from its run and appended exactly
            // once.
            unsafe { node.as_mut().next = None };
            match tail {
                Some(mut t) => unsafe { t.as_mut().next = Some(node) },
                None => head = Some(node),
            }
            tail = Some(node);
        }

        (head, tail)
    }

    /// Removes every element, returning all nodes to the pool.
    pub fn clear(&mut self) {
        let mut cursor = self.head.take();
        self.tail = None;
        self.len = 0;
        while let Some(node) = cursor {
            // SAFETY: node is a live, now-unlinked node owned by this list.
            cursor = unsafe { node.as_ref().next };
            drop(self.release(node));
        }
    }

    /// Iterator over the elements, front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            cursor: self.head,
            _marker: PhantomData,
        }
    }

    /// Allocates a node from the pool and moves `value` into it.
    fn acquire(&self, value: T) -> PoolResult<NonNull<Node<T>>> {
        let Some(block) = self.pool.allocate() else {
            return Err(PoolError::pool_exhausted(self.pool.capacity()));
        };

        let ptr = block.as_ptr().cast::<Node<T>>();
        // SAFETY: the block is sized and aligned for Node<T> by
        // construction, uninitialized, and exclusively ours.
        unsafe { ptr.write(Node { value, next: None }) };
        core::mem::forget(block);

        // as_ptr never returns null.
        NonNull::new(ptr).ok_or_else(|| PoolError::pool_exhausted(self.pool.capacity()))
    }

    /// Moves the value out of an unlinked node and returns its block.
    fn release(&self, node: NonNull<Node<T>>) -> T {
        // SAFETY: node was acquired from self.pool, is initialized, and is
        // no longer reachable from the list; reading moves the Node out
        // (its next pointer needs no drop).
        let inner = unsafe { node.as_ptr().read() };
        self.pool.deallocate(RawBlock::from_ptr(node.cast()));
        inner.value
    }
}

/// Borrowing iterator over a [`PooledList`].
pub struct Iter<'a, T> {
    cursor: Option<NonNull<Node<T>>>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.cursor?;
        // SAFETY: the iterator borrows the list, so every node it reaches
        // stays live and unmutated for 'a.
        self.cursor = unsafe { node.as_ref().next };
        Some(unsafe { &node.as_ref().value })
    }
}

impl<'a, T, R: RawLock> IntoIterator for &'a PooledList<T, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T, R: RawLock> Drop for PooledList<T, R> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug, R: RawLock> fmt::Debug for PooledList<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SAFETY: the list owns its pool and all nodes; moving it to another
// thread moves the whole structure, and T: Send covers the values.
unsafe impl<T: Send, R: RawLock> Send for PooledList<T, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collect(list: &PooledList<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn push_and_iterate_in_order() {
        let mut list = PooledList::new().unwrap();
        list.push_back(1).unwrap();
        list.push_back(2).unwrap();
        list.push_front(0).unwrap();

        assert_eq!(collect(&list), vec![0, 1, 2]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.back(), Some(&2));
    }

    #[test]
    fn pop_front_drains_and_frees_nodes() {
        let mut list = PooledList::with_capacity(4).unwrap();
        list.push_back(10).unwrap();
        list.push_back(20).unwrap();

        assert_eq!(list.pop_front(), Some(10));
        assert_eq!(list.pop_front(), Some(20));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
        assert_eq!(list.pool().used(), 0);
    }

    #[test]
    fn remove_head_middle_and_tail() {
        let mut list = PooledList::new().unwrap();
        for n in [1, 2, 3, 4] {
            list.push_back(n).unwrap();
        }

        assert!(list.remove(&1)); // head
        assert_eq!(collect(&list), vec![2, 3, 4]);

        assert!(list.remove(&3)); // middle
        assert_eq!(collect(&list), vec![2, 4]);

        assert!(list.remove(&4)); // tail
        assert_eq!(collect(&list), vec![2]);
        assert_eq!(list.back(), Some(&2));

        assert!(!list.remove(&99));
        assert_eq!(list.len(), 1);

        // tail pointer must still be usable after tail removal
        list.push_back(5).unwrap();
        assert_eq!(collect(&list), vec![2, 5]);
    }

    #[test]
    fn middle_of_odd_and_even_lists() {
        let mut list = PooledList::new().unwrap();
        assert_eq!(list.middle(), None);

        list.push_back(1).unwrap();
        assert_eq!(list.middle(), Some(&1));

        for n in [2, 3, 4, 5] {
            list.push_back(n).unwrap();
        }
        assert_eq!(list.middle(), Some(&3)); // 5 elements

        list.push_back(6).unwrap();
        assert_eq!(list.middle(), Some(&3)); // 6 elements, earlier of the pair
    }

    #[test]
    fn sort_orders_and_keeps_tail_consistent() {
        let mut list = PooledList::new().unwrap();
        for n in [5, 3, 8, 1, 9, 2, 7, 4, 6, 0] {
            list.push_back(n).unwrap();
        }

        list.sort();
        assert_eq!(collect(&list), (0..10).collect::<Vec<_>>());
        assert_eq!(list.back(), Some(&9));

        // list remains fully functional after relinking
        list.push_back(10).unwrap();
        assert_eq!(list.back(), Some(&10));
        assert_eq!(list.len(), 11);
    }

    #[test]
    fn sort_handles_trivial_and_duplicate_inputs() {
        let mut empty: PooledList<i32> = PooledList::new().unwrap();
        empty.sort();
        assert!(empty.is_empty());

        let mut single = PooledList::new().unwrap();
        single.push_back(7).unwrap();
        single.sort();
        assert_eq!(collect(&single), vec![7]);

        let mut dupes = PooledList::new().unwrap();
        for n in [2, 1, 2, 1, 2] {
            dupes.push_back(n).unwrap();
        }
        dupes.sort();
        assert_eq!(collect(&dupes), vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn sort_is_stable() {
        // Compare only on the first field; payloads reveal original order.
        #[derive(PartialEq, Eq)]
        struct Keyed(u8, u8);

        impl PartialOrd for Keyed {
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Keyed {
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        let mut list = PooledList::new().unwrap();
        for (key, tag) in [(1, 0), (0, 0), (1, 1), (0, 1), (1, 2)] {
            list.push_back(Keyed(key, tag)).unwrap();
        }

        list.sort();
        let tags: Vec<(u8, u8)> = list.iter().map(|k| (k.0, k.1)).collect();
        assert_eq!(tags, vec![(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn long_list_sorts_without_recursion_depth_issues() {
        let mut list = PooledList::with_capacity(64).unwrap();
        for n in (0..10_000).rev() {
            list.push_back(n).unwrap();
        }

        list.sort();
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.back(), Some(&9_999));
        assert_eq!(list.len(), 10_000);
        assert!(list.iter().zip(list.iter().skip(1)).all(|(a, b)| a <= b));
    }

    #[test]
    fn clear_and_drop_run_destructors() {
        struct Counted(Arc<AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));

        let mut list = PooledList::new().unwrap();
        for _ in 0..3 {
            list.push_back(Counted(Arc::clone(&drops))).unwrap();
        }

        list.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(list.pool().used(), 0);

        list.push_back(Counted(Arc::clone(&drops))).unwrap();
        drop(list); // Drop clears the remaining node
        assert_eq!(drops.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn nodes_reuse_pool_blocks() {
        let mut list = PooledList::with_capacity(2).unwrap();
        list.push_back(1).unwrap();
        list.push_back(2).unwrap();
        let capacity = list.pool().capacity();

        // Churn within the same footprint: no growth required.
        for n in 3..100 {
            assert_eq!(list.pop_front(), Some(n - 2));
            list.push_back(n).unwrap();
        }
        assert_eq!(list.pool().capacity(), capacity);
    }
}
