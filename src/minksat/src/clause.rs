/*****************************************************************************************[clause.rs]
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

use crate::intmap::{AsIndex, IntMap};
use std::fmt;
use std::ops;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);
    #[inline(always)]
    pub fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
}

impl AsIndex for Var {
    fn as_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);

    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }
    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        Lit(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    /// `true` for the positive literal of the variable.
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{}", if self.sign() { "" } else { "-" }, self.0 / 2 + 1)
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LMap<V> = IntMap<Lit, V>;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
/// A ternary boolean (true, false, undefined) used for partial assignments.
pub struct lbool(u8);

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else {
            write!(f, "UNDEF")
        }
    }
}

impl Default for lbool {
    fn default() -> Self {
        lbool::UNDEF
    }
}

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);
    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }
    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }
    #[inline(always)]
    pub fn to_u8(&self) -> u8 {
        self.0
    }
}

// both undefined values compare equal, as in MiniSat
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

/// Origin of a clause in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Original,
    Learnt,
}

/// A reference to a clause: the cell index of its first literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CRef(pub(crate) u32);

impl CRef {
    pub const NIL: CRef = CRef(!0);
}

/// Cells reserved in front of every clause's literal span.
///
/// Relative to a clause id `c` they hold, in order: the LBD score (`c-4`,
/// `0` marks a permanent clause), the watch-list next pointer of the
/// second watched literal (`c-3`), the watch-list next pointer of the
/// first watched literal (`c-2`), and the clause size (`c-1`).
pub const HEADER_CELLS: u32 = 4;

/// The clause database: a single growable arena of `u32` cells holding
/// every clause behind its four header cells, plus the watch index.
///
/// The two literals at offsets 0 and 1 of each clause are its watched
/// literals. A clause sits on the watch list of both; the lists are
/// intrusive, threaded through the two next-pointer header slots, so the
/// propagator can splice a clause out in O(1) and move it to another list
/// by rewriting a single cell. Clause ids are plain indices and survive
/// arena growth; they are never pointers.
#[derive(Debug)]
pub struct ClauseDb {
    cells: Vec<u32>,
    watch: LMap<CRef>,
}

impl ClauseDb {
    pub fn new(nvars: u32) -> Self {
        let mut watch = LMap::new();
        if nvars > 0 {
            // the negative literal of the last variable has the largest index
            watch.reserve(Lit::new(Var::from_idx(nvars - 1), false), CRef::NIL);
        }
        Self {
            cells: Vec::new(),
            watch,
        }
    }

    /// Total number of cells in use.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Append a clause and put it on the watch lists of its first two
    /// literals (only the first when the clause is unit).
    pub fn append_clause(&mut self, lits: &[Lit], lbd: u32) -> CRef {
        debug_assert!(!lits.is_empty());
        let c = CRef(self.cells.len() as u32 + HEADER_CELLS);
        self.cells.push(lbd);
        self.cells.push(CRef::NIL.0); // next pointer, second watched literal
        self.cells.push(CRef::NIL.0); // next pointer, first watched literal
        self.cells.push(lits.len() as u32);
        self.cells.extend(lits.iter().map(|l| l.idx()));
        self.link_watch(c, 0);
        if lits.len() > 1 {
            self.link_watch(c, 1);
        }
        c
    }

    /// Prepend `c` onto the watch list of its literal at `pos` (0 or 1).
    pub(crate) fn link_watch(&mut self, c: CRef, pos: u32) {
        let l = self.lit(c, pos);
        let h = self.head(l);
        self.set_watch_next(c, pos, h);
        self.set_head(l, c);
    }

    #[inline(always)]
    pub fn size(&self, c: CRef) -> u32 {
        self.cells[(c.0 - 1) as usize]
    }
    #[inline(always)]
    pub(crate) fn set_size(&mut self, c: CRef, size: u32) {
        self.cells[(c.0 - 1) as usize] = size;
    }

    #[inline(always)]
    pub fn lbd(&self, c: CRef) -> u32 {
        self.cells[(c.0 - HEADER_CELLS) as usize]
    }
    #[inline(always)]
    pub(crate) fn set_lbd(&mut self, c: CRef, lbd: u32) {
        self.cells[(c.0 - HEADER_CELLS) as usize] = lbd;
    }

    #[inline(always)]
    pub fn lit(&self, c: CRef, i: u32) -> Lit {
        Lit::from_idx(self.cells[(c.0 + i) as usize])
    }
    #[inline(always)]
    pub(crate) fn set_lit(&mut self, c: CRef, i: u32, l: Lit) {
        self.cells[(c.0 + i) as usize] = l.idx();
    }
    pub(crate) fn swap_lits(&mut self, c: CRef, i: u32, j: u32) {
        self.cells.swap((c.0 + i) as usize, (c.0 + j) as usize);
    }

    /// Next pointer of the watched literal at `pos` (0 or 1).
    #[inline(always)]
    pub fn watch_next(&self, c: CRef, pos: u32) -> CRef {
        debug_assert!(pos < 2);
        CRef(self.cells[(c.0 - 2 - pos) as usize])
    }
    #[inline(always)]
    pub(crate) fn set_watch_next(&mut self, c: CRef, pos: u32, next: CRef) {
        debug_assert!(pos < 2);
        self.cells[(c.0 - 2 - pos) as usize] = next.0;
    }

    #[inline(always)]
    pub fn head(&self, l: Lit) -> CRef {
        self.watch[l]
    }
    #[inline(always)]
    pub(crate) fn set_head(&mut self, l: Lit, c: CRef) {
        self.watch[l] = c;
    }

    /// Which watch slot of `c` lies on the list of `l`.
    #[inline]
    pub fn watch_pos(&self, c: CRef, l: Lit) -> u32 {
        if self.lit(c, 0) == l {
            0
        } else {
            debug_assert_eq!(self.lit(c, 1), l);
            1
        }
    }

    /// Successor of `c` on the watch list of `l`.
    #[inline]
    pub fn next_on_list(&self, c: CRef, l: Lit) -> CRef {
        let pos = self.watch_pos(c, l);
        self.watch_next(c, pos)
    }

    /// Remove `c` from the watch list of `l`, walking from the head and
    /// choosing the correct next-pointer slot at every hop.
    pub(crate) fn unlink(&mut self, c: CRef, l: Lit) {
        let succ = self.next_on_list(c, l);
        let mut w = self.head(l);
        if w == c {
            self.set_head(l, succ);
            return;
        }
        loop {
            debug_assert!(w != CRef::NIL, "unlink: clause not on the list");
            let pos = self.watch_pos(w, l);
            let next = self.watch_next(w, pos);
            if next == c {
                self.set_watch_next(w, pos, succ);
                return;
            }
            w = next;
        }
    }

    /// Exchange the two watched literals together with their next
    /// pointers, so list membership follows the literals.
    pub(crate) fn swap_watches(&mut self, c: CRef) {
        self.cells.swap(c.0 as usize, (c.0 + 1) as usize);
        self.cells.swap((c.0 - 2) as usize, (c.0 - 3) as usize);
    }

    /// Shift live literals left over tombstones; freed trailing cells stay
    /// tombstoned and the size shrinks accordingly. Slots 0 and 1 are
    /// watched and never contain tombstones.
    pub(crate) fn compact_clause(&mut self, c: CRef) {
        let k = self.size(c);
        let mut j = 2;
        for i in 2..k {
            let m = self.lit(c, i);
            if m != Lit::UNDEF {
                if i != j {
                    self.set_lit(c, j, m);
                }
                j += 1;
            }
        }
        for i in j..k {
            self.set_lit(c, i, Lit::UNDEF);
        }
        self.set_size(c, j);
    }

    /// Roll the arena back to just before `c`'s header. Only valid when
    /// `c` is the last clause that was appended.
    pub(crate) fn truncate_to(&mut self, c: CRef) {
        self.cells.truncate((c.0 - HEADER_CELLS) as usize);
    }

    /// Copy `c` (header plus live literals) onto the end of `out`,
    /// returning the id it will have once `out` becomes the cell array.
    pub(crate) fn copy_clause_to(&self, c: CRef, out: &mut Vec<u32>) -> CRef {
        let nc = CRef(out.len() as u32 + HEADER_CELLS);
        out.push(self.lbd(c));
        out.push(CRef::NIL.0);
        out.push(CRef::NIL.0);
        let k = self.size(c);
        out.push(k);
        for i in 0..k {
            out.push(self.lit(c, i).idx());
        }
        nc
    }

    /// Swap in a freshly compacted cell array and reset every watch list.
    pub(crate) fn replace_cells(&mut self, cells: Vec<u32>) {
        self.cells = cells;
        for (_, h) in self.watch.iter_mut() {
            *h = CRef::NIL;
        }
    }
}
