/*****************************************************************************************[intmap.rs]
Copyright (c) 2019-2019, the minksat authors

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use std::cmp;
use std::iter;
use std::marker::PhantomData;
use std::ops;

/// Types that can serve as dense map keys.
pub trait AsIndex: Copy {
    fn as_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

/// A dense map from an index-like key to `V`, backed by a single vector.
#[derive(Debug, Clone)]
pub struct IntMap<K: AsIndex, V> {
    map: Vec<V>,
    _marker: PhantomData<fn(K)>, // contravariance
}

impl<K: AsIndex, V> Default for IntMap<K, V> {
    fn default() -> Self {
        Self {
            map: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<K: AsIndex, V> IntMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
    #[inline]
    pub fn has(&self, k: K) -> bool {
        k.as_index() < self.map.len()
    }
    /// Make sure `key` is addressable, padding new slots with `pad`.
    pub fn reserve(&mut self, key: K, pad: V)
    where
        V: Clone,
    {
        let index = key.as_index();
        if index >= self.map.len() {
            self.map.resize(index + 1, pad);
        }
    }
    #[inline]
    pub fn insert(&mut self, key: K, val: V, pad: V)
    where
        V: Clone,
    {
        self.reserve(key, pad);
        self[key] = val;
    }
    pub fn iter(&self) -> impl iter::Iterator<Item = (K, &V)> {
        self.map
            .iter()
            .enumerate()
            .map(|(k, v)| (K::from_index(k), v))
    }
    pub fn iter_mut(&mut self) -> impl iter::Iterator<Item = (K, &mut V)> {
        self.map
            .iter_mut()
            .enumerate()
            .map(|(k, v)| (K::from_index(k), v))
    }
}

impl<K: AsIndex, V> ops::Index<K> for IntMap<K, V> {
    type Output = V;
    #[inline]
    fn index(&self, index: K) -> &Self::Output {
        &self.map[index.as_index()]
    }
}
impl<K: AsIndex, V> ops::IndexMut<K> for IntMap<K, V> {
    #[inline]
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.map[index.as_index()]
    }
}

/// Ordering used by the heap; smaller elements percolate towards the root.
pub trait Comparator<T: ?Sized> {
    fn cmp(&self, lhs: &T, rhs: &T) -> cmp::Ordering;
    fn lt(&self, lhs: &T, rhs: &T) -> bool {
        self.cmp(lhs, rhs) == cmp::Ordering::Less
    }
}

/// Storage of the binary heap: the element array plus a back-map from keys
/// to positions (`-1` when absent), so membership tests and targeted
/// percolation are O(1) lookups.
#[derive(Debug, Clone)]
pub struct HeapData<K: AsIndex> {
    heap: Vec<K>,
    indices: IntMap<K, i32>,
}

impl<K: AsIndex> Default for HeapData<K> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            indices: IntMap::new(),
        }
    }
}

impl<K: AsIndex> HeapData<K> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn in_heap(&self, k: K) -> bool {
        self.indices.has(k) && self.indices[k] >= 0
    }

    /// Pair the storage with a comparator, yielding a usable heap.
    pub fn promote<Comp: Comparator<K>>(&mut self, comp: Comp) -> Heap<K, Comp> {
        Heap { data: self, comp }
    }
}

#[derive(Debug)]
pub struct Heap<'a, K: AsIndex + 'a, Comp: Comparator<K>> {
    data: &'a mut HeapData<K>,
    comp: Comp,
}

impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> ops::Deref for Heap<'a, K, Comp> {
    type Target = HeapData<K>;
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> ops::DerefMut for Heap<'a, K, Comp> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> Heap<'a, K, Comp> {
    fn percolate_up(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        let mut p = parent_index(i);

        while i != 0 && self.comp.lt(&x, &self.heap[p as usize]) {
            self.heap[i as usize] = self.heap[p as usize];
            let tmp = self.heap[p as usize];
            self.data.indices[tmp] = i as i32;
            i = p;
            p = parent_index(p);
        }
        self.heap[i as usize] = x;
        self.data.indices[x] = i as i32;
    }

    fn percolate_down(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        while (left_index(i) as usize) < self.heap.len() {
            let child = if (right_index(i) as usize) < self.heap.len()
                && self.comp.lt(
                    &self.heap[right_index(i) as usize],
                    &self.heap[left_index(i) as usize],
                ) {
                right_index(i)
            } else {
                left_index(i)
            };
            if !self.comp.lt(&self.heap[child as usize], &x) {
                break;
            }
            self.heap[i as usize] = self.heap[child as usize];
            let tmp = self.heap[i as usize];
            self.data.indices[tmp] = i as i32;
            i = child;
        }
        self.heap[i as usize] = x;
        self.data.indices[x] = i as i32;
    }

    /// Re-establish ordering after `k`'s value moved towards the root.
    pub fn decrease(&mut self, k: K) {
        debug_assert!(self.in_heap(k));
        let k_index = self.data.indices[k];
        self.percolate_up(k_index as u32);
    }

    pub fn insert(&mut self, k: K) {
        self.data.indices.reserve(k, -1);
        debug_assert!(!self.in_heap(k));

        self.data.indices[k] = self.heap.len() as i32;
        self.data.heap.push(k);
        let k_index = self.data.indices[k];
        self.percolate_up(k_index as u32);
    }

    pub fn remove_min(&mut self) -> K {
        let x = *self.heap.first().expect("heap is empty");
        let lastval = *self.heap.last().expect("heap is empty");
        self.data.heap[0] = lastval;
        self.data.indices[lastval] = 0;
        self.data.indices[x] = -1;
        self.data.heap.pop().expect("cannot pop from empty heap");
        if self.heap.len() > 1 {
            self.percolate_down(0);
        }
        x
    }
}

#[inline(always)]
fn left_index(i: u32) -> u32 {
    i * 2 + 1
}
#[inline(always)]
fn right_index(i: u32) -> u32 {
    (i + 1) * 2
}
#[inline(always)]
fn parent_index(i: u32) -> u32 {
    (i.wrapping_sub(1)) >> 1
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cmp;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct K(u32);
    impl AsIndex for K {
        fn as_index(self) -> usize {
            self.0 as usize
        }
        fn from_index(index: usize) -> Self {
            K(index as u32)
        }
    }

    struct ByScore<'a> {
        score: &'a IntMap<K, f64>,
    }
    // reversed: remove_min yields the highest score
    impl<'a> Comparator<K> for ByScore<'a> {
        fn cmp(&self, lhs: &K, rhs: &K) -> cmp::Ordering {
            PartialOrd::partial_cmp(&self.score[*rhs], &self.score[*lhs]).expect("NaN score")
        }
    }

    #[test]
    fn test_delete_max_order() {
        let mut score = IntMap::new();
        for (i, &s) in [1.0, 5.0, 3.0, 0.5, 4.0].iter().enumerate() {
            score.insert(K(i as u32), s, 0.0);
        }
        let mut data = HeapData::new();
        let mut heap = data.promote(ByScore { score: &score });
        for i in 0..5 {
            heap.insert(K(i));
        }
        let order: Vec<u32> = (0..5).map(|_| heap.remove_min().0).collect();
        assert_eq!(order, vec![1, 4, 2, 0, 3]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_membership_and_reinsert() {
        let mut score = IntMap::new();
        for i in 0..4 {
            score.insert(K(i), i as f64, 0.0);
        }
        let mut data = HeapData::new();
        {
            let mut heap = data.promote(ByScore { score: &score });
            for i in 0..4 {
                heap.insert(K(i));
            }
            assert_eq!(heap.remove_min(), K(3));
        }
        assert!(!data.in_heap(K(3)));
        assert!(data.in_heap(K(0)));
        {
            let mut heap = data.promote(ByScore { score: &score });
            heap.insert(K(3));
            assert_eq!(heap.remove_min(), K(3));
        }
    }

    #[test]
    fn test_decrease_after_bump() {
        let mut score = IntMap::new();
        for i in 0..3 {
            score.insert(K(i), i as f64, 0.0);
        }
        let mut data = HeapData::new();
        {
            let mut heap = data.promote(ByScore { score: &score });
            for i in 0..3 {
                heap.insert(K(i));
            }
        }
        score[K(0)] = 10.0;
        let mut heap = data.promote(ByScore { score: &score });
        heap.decrease(K(0));
        assert_eq!(heap.remove_min(), K(0));
    }
}
