/*****************************************************************************************[core.rs]
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

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{lbool, CRef, ClauseDb, Kind, Lit, VMap, Var},
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData},
    std::{cmp, collections::HashMap, fmt, mem},
};

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT solver: the
/// clause database with its watch index, the trail, the decision heap and
/// the restart/purge bookkeeping.
///
/// It is parametrized by `Callbacks`
pub struct Solver<Cb: Callbacks> {
    cb: Cb,
    opts: SolverOpts,
    db: ClauseDb,
    vars: VarState,
    order_heap_data: HeapData<Var>,

    /// Problem clauses, in arena order.
    clauses: Vec<CRef>,
    /// Learnt clauses, in arena order.
    learnts: Vec<CRef>,

    /// If the problem is satisfiable, this vector contains the model.
    model: Vec<lbool>,

    nvars: u32,
    /// If `false`, the clause set is already unsatisfiable.
    ok: bool,
    /// Head of the propagation queue, as an index into the trail.
    qhead: usize,

    /// Conflict-analysis epoch, advanced by 3 per conflict so the three
    /// stamp values encode transient bits without ever being cleared.
    epoch: u64,
    /// Epoch at which the last restart happened.
    last_restart: u64,
    /// Exponential moving average of phase flips, fixed point over 2^32.
    agility: u32,
    /// The most recently learnt clause, while it is still the last clause
    /// in the arena; `CRef::NIL` otherwise.
    last_learnt: CRef,

    /// Per-level stamp marking levels with one (`epoch`) or at least two
    /// (`epoch+1`) literals in the clause under construction.
    lstamp: Vec<u64>,
    /// Per-level stamp for counting distinct levels (LBD).
    lbds: Vec<u64>,
    /// Tail of the clause under construction: the literals from levels
    /// below the conflict level, kept in their false polarity.
    tail: Vec<Lit>,
    /// Scratch buffer for installing learnt clauses.
    tmp_learnt: Vec<Lit>,

    // Statistics: (read-only member variables)
    starts: u64,
    decisions: u64,
    propagations: u64,
    conflicts: u64,
    purges: u64,
    n_lemmas: u64,
    max_literals: u64,
    tot_literals: u64,
}

/// The current assignments.
struct VarState {
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Saved phase: the polarity each variable last had.
    oval: VMap<bool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Trail position of each variable, `-1` when unassigned.
    tloc: VMap<i32>,
    /// Transient epoch tags used by conflict analysis.
    stamp: VMap<u64>,
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assignments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::NIL,
            level: -1,
        }
    }
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

// reversed comparison: `remove_min` yields the most active variable
impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs]).expect("NaN activity")
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            oval: VMap::new(),
            vardata: VMap::new(),
            tloc: VMap::new(),
            stamp: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    fn init(&mut self, nvars: u32) {
        if nvars == 0 {
            return;
        }
        let last = Var::from_idx(nvars - 1);
        self.ass.reserve(last, lbool::UNDEF);
        self.oval.reserve(last, false);
        self.vardata.reserve(last, VarData::default());
        self.tloc.reserve(last, -1);
        self.stamp.reserve(last, 0);
        self.activity.reserve(last, 0.0);
        self.trail.reserve(nvars as usize);
    }

    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn num_vars(&self) -> u32 {
        self.nvars
    }
    fn num_clauses(&self) -> u64 {
        self.clauses.len() as u64
    }
    fn num_conflicts(&self) -> u64 {
        self.conflicts
    }
    fn num_restarts(&self) -> u64 {
        self.starts
    }
    fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }
    fn is_ok(&self) -> bool {
        self.ok
    }

    fn reserve_vars(&mut self, nvars: u32) {
        debug_assert_eq!(self.nvars, 0, "variable space already sized");
        self.nvars = nvars;
        self.db = ClauseDb::new(nvars);
        self.vars.init(nvars);
        self.lstamp = vec![0; nvars as usize + 1];
        self.lbds = vec![0; nvars as usize + 1];
        // every variable starts out in the decision heap
        for i in 0..nvars {
            let v = Var::from_idx(i);
            let mut heap = self
                .order_heap_data
                .promote(VarOrder {
                    activity: &self.vars.activity,
                });
            heap.insert(v);
        }
    }

    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(
            self.vars.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        self.add_clause_(clause)
    }

    fn solve(&mut self) -> lbool {
        self.solve_internal()
    }

    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&val| val)
    }
    fn value_lit(&self, l: Lit) -> lbool {
        self.value_var(l.var()) ^ !l.sign()
    }

    fn print_stats(&self) {
        println!("c restarts              : {}", self.starts);
        println!("c conflicts             : {:<12}", self.conflicts);
        println!("c decisions             : {:<12}", self.decisions);
        println!("c propagations          : {:<12}", self.propagations);
        println!(
            "c lemmas                : {:<12}   ({} purges)",
            self.n_lemmas, self.purges
        );
        if self.max_literals > 0 {
            println!(
                "c conflict literals     : {:<12}   ({:4.2} % deleted)",
                self.tot_literals,
                (self.max_literals - self.tot_literals) as f64 * 100.0 / self.max_literals as f64
            );
        }
    }
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check());
        let vars = VarState::new(&opts);
        Self {
            cb,
            opts,
            db: ClauseDb::new(0),
            vars,
            order_heap_data: HeapData::new(),
            clauses: vec![],
            learnts: vec![],
            model: vec![],
            nvars: 0,
            ok: true,
            qhead: 0,
            epoch: 0,
            last_restart: 0,
            agility: 0,
            last_learnt: CRef::NIL,
            lstamp: vec![],
            lbds: vec![],
            tail: vec![],
            tmp_learnt: vec![],
            starts: 0,
            decisions: 0,
            propagations: 0,
            conflicts: 0,
            purges: 0,
            n_lemmas: 0,
            max_literals: 0,
            tot_literals: 0,
        }
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Display the model as `v` lines, ten literals per line.
    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    /// Phase-flip rate in `[0,1)`.
    pub fn agility(&self) -> f64 {
        self.agility as f64 / ((1u64 << 32) as f64)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn insert_var_order(&mut self, v: Var) {
        let mut heap = self.order_heap();
        if !heap.in_heap(v) {
            heap.insert(v);
        }
    }

    /// Increase a variable's activity with the current bump value.
    fn var_bump_activity(&mut self, v: Var) {
        let vars = &mut self.vars;
        vars.activity[v] += vars.var_inc;
        if vars.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in vars.activity.iter_mut() {
                *x *= 1e-100;
            }
            vars.var_inc *= 1e-100;
        }

        let mut heap = self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        });
        if heap.in_heap(v) {
            heap.decrease(v);
        }
    }

    /// A clause is locked while it is the reason for its first literal.
    fn locked(&self, c: CRef) -> bool {
        let l0 = self.db.lit(c, 0);
        self.vars.value_lit(l0) == lbool::TRUE && self.vars.reason(l0.var()) == c
    }

    /// Put `l` on the trail at the current decision level.
    fn assign(&mut self, l: Lit, reason: CRef) {
        let v = l.var();
        debug_assert_eq!(self.vars.value(v), lbool::UNDEF, "assign {:?} twice", l);
        self.vars.ass[v] = lbool::new(l.sign());
        self.vars.vardata[v] = VarData {
            reason,
            level: self.vars.decision_level() as i32,
        };
        self.vars.tloc[v] = self.vars.trail.len() as i32;
        self.vars.trail.push(l);
        // agility: EMA of how often assignments flip their saved phase,
        // with plain unsigned-32-bit wraparound
        self.agility -= self.agility >> 13;
        if self.vars.oval[v] != l.sign() {
            self.agility = self.agility.wrapping_add(1 << 19);
        }
    }

    /// Add clause during input construction (decision level 0).
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.ok {
            return false;
        }
        clause.sort_unstable();

        // strip duplicates, literals already false at the top level, and
        // clauses that are tautological or already satisfied
        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.vars.value_lit(lit_i);
            if value == lbool::TRUE || lit_i == !last_lit {
                return true;
            } else if value != lbool::FALSE && lit_i != last_lit {
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        if clause.is_empty() {
            debug!("empty clause in input, formula is unsatisfiable");
            self.ok = false;
            return false;
        }
        self.cb.on_new_clause(&clause[..], Kind::Original);
        if clause.len() == 1 {
            // forced at the top level
            self.assign(clause[0], CRef::NIL);
        } else {
            let cr = self.db.append_clause(&clause[..], 0);
            self.clauses.push(cr);
        }
        true
    }

    /// Propagates all enqueued facts. (C2/C3)
    ///
    /// If a conflict arises, the conflicting clause is returned and the
    /// remaining queue is left for the backjump to discard.
    fn propagate(&mut self) -> Option<CRef> {
        while self.qhead < self.vars.trail.len() {
            let l = self.vars.trail[self.qhead];
            self.qhead += 1;
            self.propagations += 1;
            let confl = self.propagate_lit(l);
            if confl.is_some() {
                return confl;
            }
        }
        None
    }

    /// Walk the watch list of `!l` after `l` became true. (C4, per clause)
    fn propagate_lit(&mut self, l: Lit) -> Option<CRef> {
        let false_lit = !l;
        trace!("propagate {:?}, walking watchers of {:?}", l, false_lit);
        // last clause that stayed on the list, for O(1) splicing
        let mut wll = CRef::NIL;
        let mut w = self.db.head(false_lit);
        while w != CRef::NIL {
            debug_assert!(self.db.size(w) >= 2);
            let pos = self.db.watch_pos(w, false_lit);
            let next = self.db.watch_next(w, pos);
            let other = self.db.lit(w, 1 - pos);

            // blocking check: a satisfied clause stays exactly as it is
            if self.vars.value_lit(other) == lbool::TRUE {
                wll = w;
                w = next;
                continue;
            }

            // normalize: the falsified watch goes to slot 0
            if pos == 1 {
                self.db.swap_watches(w);
            }

            // look for a new watch, tombstoning literals false at level 0
            let k = self.db.size(w);
            let mut new_watch = None;
            let mut tombstoned = false;
            for i in 2..k {
                let m = self.db.lit(w, i);
                if self.vars.value_lit(m) == lbool::FALSE {
                    if self.vars.level(m.var()) == 0 {
                        self.db.set_lit(w, i, Lit::UNDEF);
                        tombstoned = true;
                    }
                    continue;
                }
                new_watch = Some(i);
                break;
            }

            if let Some(i) = new_watch {
                // move the clause to the new watch's list
                let m = self.db.lit(w, i);
                self.db.set_lit(w, 0, m);
                self.db.set_lit(w, i, false_lit);
                if tombstoned {
                    self.db.compact_clause(w);
                }
                if wll == CRef::NIL {
                    self.db.set_head(false_lit, next);
                } else {
                    let p = self.db.watch_pos(wll, false_lit);
                    self.db.set_watch_next(wll, p, next);
                }
                let h = self.db.head(m);
                self.db.set_watch_next(w, 0, h);
                self.db.set_head(m, w);
                w = next;
                continue;
            }

            if tombstoned {
                self.db.compact_clause(w);
            }
            if self.vars.value_lit(other) == lbool::FALSE {
                // conflict; stop immediately (C7 takes over)
                trace!("conflict in {:?}", w);
                return Some(w);
            }
            // unit: swap the propagated literal into slot 0 so the clause
            // can serve as its reason
            self.db.swap_watches(w);
            self.assign(other, w);
            wll = w;
            w = next;
        }
        None
    }

    /// Pick the next decision variable and assign it. (C6)
    fn decide(&mut self) {
        let mut next = Var::UNDEF;
        while next == Var::UNDEF || self.vars.value(next) != lbool::UNDEF {
            let mut order_heap = self.order_heap();
            next = order_heap.remove_min();
        }
        let l = Lit::new(next, self.vars.oval[next]);
        trace!("decide {:?}", l);
        self.vars.trail_lim.push(self.vars.trail.len() as i32);
        self.assign(l, CRef::NIL);
        self.decisions += 1;
    }

    /// Revert to the state at the given level, keeping all assignments at
    /// `level` but not beyond. (C8)
    fn cancel_until(&mut self, level: u32) {
        if self.vars.decision_level() <= level {
            return;
        }
        let lim = self.vars.trail_lim[level as usize] as usize;
        for c in (lim..self.vars.trail.len()).rev() {
            let l = self.vars.trail[c];
            let v = l.var();
            self.vars.oval[v] = l.sign();
            self.vars.ass[v] = lbool::UNDEF;
            self.vars.vardata[v] = VarData::default();
            self.vars.tloc[v] = -1;
            self.insert_var_order(v);
        }
        self.qhead = lim;
        self.vars.trail.truncate(lim);
        self.vars.trail_lim.truncate(level as usize);
    }

    /// Stamp a variable for the current epoch and bump its activity.
    fn stamp_var(&mut self, v: Var) {
        self.vars.stamp[v] = self.epoch;
        self.var_bump_activity(v);
    }

    /// Stamp and classify one false literal of a conflict or reason
    /// clause: conflict-level literals are counted in `q`, lower-level
    /// ones join the tail. (analysis step 4)
    fn classify(&mut self, m: Lit, d: i32, q: &mut u32, dp: &mut i32) {
        let v = m.var();
        let lv = self.vars.level(v);
        if lv == 0 || self.vars.stamp[v] >= self.epoch {
            return;
        }
        debug_assert_eq!(self.vars.value_lit(m), lbool::FALSE);
        self.stamp_var(v);
        if lv == d {
            *q += 1;
        } else {
            self.tail.push(m);
            *dp = cmp::max(*dp, lv);
            let e = self.epoch;
            let ls = &mut self.lstamp[lv as usize];
            if *ls == e {
                *ls = e + 1; // second literal seen at this level
            } else if *ls < e {
                *ls = e;
            }
        }
    }

    /// First-UIP conflict analysis. (C7)
    ///
    /// Returns the UIP (as the trail literal), the backjump level and the
    /// LBD of the learnt clause; the learnt tail is left in `self.tail`.
    fn analyze(&mut self, confl: CRef) -> (Lit, u32, u32) {
        self.epoch += 3;
        let d = self.vars.decision_level() as i32;
        debug_assert!(d > 0);
        self.tail.clear();

        // Move the literal assigned last into slot 0 so the walk below
        // starts at the right trail position; undone after stamping so the
        // watched layout survives later modification of the clause.
        let k = self.db.size(confl);
        let mut max_i = 0;
        for i in 1..k {
            if self.vars.tloc[self.db.lit(confl, i).var()]
                > self.vars.tloc[self.db.lit(confl, max_i).var()]
            {
                max_i = i;
            }
        }
        if max_i != 0 {
            self.db.swap_lits(confl, 0, max_i);
        }

        let l0 = self.db.lit(confl, 0);
        debug_assert_eq!(self.vars.level(l0.var()), d);
        let mut t = self.vars.tloc[l0.var()] as usize;
        self.stamp_var(l0.var());

        let mut q: u32 = 0;
        let mut dp: i32 = 0;
        for i in 1..k {
            let m = self.db.lit(confl, i);
            self.classify(m, d, &mut q, &mut dp);
        }
        if max_i != 0 {
            self.db.swap_lits(confl, 0, max_i);
        }

        // resolve out stamped conflict-level literals, newest first
        while q > 0 {
            let l = self.vars.trail[t];
            t -= 1;
            if self.vars.stamp[l.var()] != self.epoch {
                continue;
            }
            q -= 1;
            let r = self.vars.reason(l.var());
            if r == CRef::NIL {
                continue;
            }
            debug_assert_eq!(self.db.lit(r, 0).var(), l.var());
            let rk = self.db.size(r);
            let mut has_level0 = false;
            for i in 1..rk {
                let m = self.db.lit(r, i);
                if self.vars.level(m.var()) == 0 {
                    has_level0 = true;
                }
                self.classify(m, d, &mut q, &mut dp);
            }
            // on-the-fly subsumption: the clause under construction now
            // holds q + |tail| + 1 literals; when that is smaller than the
            // reason, it subsumes the reason modulo `l`.
            if !has_level0 && q as usize + self.tail.len() + 1 < rk as usize {
                self.subsume_reason(r, l, d);
            }
        }

        // skip unstamped literals; the stamped one below is the first UIP
        while self.vars.stamp[self.vars.trail[t].var()] != self.epoch {
            t -= 1;
        }
        let uip = self.vars.trail[t];
        debug_assert_eq!(self.vars.level(uip.var()), d);

        // redundant-literal minimization over the tail
        self.max_literals += self.tail.len() as u64 + 1;
        let mut tail = mem::replace(&mut self.tail, Vec::new());
        tail.retain(|&m| {
            let v = m.var();
            let lv = self.vars.level(v) as usize;
            !(self.lstamp[lv] == self.epoch + 1 && self.lit_redundant(v))
        });
        self.tail = tail;
        self.tot_literals += self.tail.len() as u64 + 1;

        // LBD: number of distinct decision levels among the learnt literals
        let e = self.epoch;
        self.lbds[d as usize] = e;
        let mut lbd: u32 = 1;
        for i in 0..self.tail.len() {
            let lv = self.vars.level(self.tail[i].var()) as usize;
            if self.lbds[lv] != e {
                self.lbds[lv] = e;
                lbd += 1;
            }
        }

        trace!("analyze: uip {:?}, jump to {}, lbd {}", uip, dp, lbd);
        (uip, dp as u32, lbd)
    }

    /// The clause under construction strictly subsumes `r` minus its
    /// first literal; strengthen `r` in place by dropping that literal.
    fn subsume_reason(&mut self, r: CRef, l: Lit, d: i32) {
        debug_assert_eq!(self.db.lit(r, 0), l);
        let k = self.db.size(r);
        // the replacement watch must survive the backjump, so it has to
        // come from the conflict level; slot 1 stays put so only one watch
        // list needs surgery
        let mut found = None;
        for i in 2..k {
            if self.vars.level(self.db.lit(r, i).var()) >= d {
                found = Some(i);
                break;
            }
        }
        let j = match found {
            Some(j) => j,
            None => return,
        };
        trace!("subsume reason {:?}, dropping {:?}", r, l);
        let m = self.db.lit(r, j);
        self.db.unlink(r, l);
        self.db.set_lit(r, 0, m);
        let last = self.db.lit(r, k - 1);
        if j != k - 1 {
            self.db.set_lit(r, j, last);
        }
        self.db.set_lit(r, k - 1, Lit::UNDEF);
        self.db.set_size(r, k - 1);
        let h = self.db.head(m);
        self.db.set_watch_next(r, 0, h);
        self.db.set_head(m, r);
    }

    /// Is the false literal of `v` implied by level-0 assignments and the
    /// rest of the clause under construction? Memoized within the epoch:
    /// `epoch+1` certainly yes, `epoch+2` certainly not.
    fn lit_redundant(&mut self, v: Var) -> bool {
        let r = self.vars.reason(v);
        if r == CRef::NIL {
            return false;
        }
        let k = self.db.size(r);
        for i in 1..k {
            let w = self.db.lit(r, i).var();
            let lv = self.vars.level(w);
            if lv == 0 {
                continue;
            }
            let st = self.vars.stamp[w];
            if st == self.epoch || st == self.epoch + 1 {
                continue;
            }
            if st == self.epoch + 2
                || self.lstamp[lv as usize] != self.epoch + 1
                || self.vars.reason(w) == CRef::NIL
                || !self.lit_redundant(w)
            {
                if self.vars.stamp[w] < self.epoch {
                    self.vars.stamp[w] = self.epoch + 2;
                }
                return false;
            }
            if self.vars.stamp[w] < self.epoch {
                self.vars.stamp[w] = self.epoch + 1;
            }
        }
        true
    }

    /// Discard the previous lemma when the one about to be learnt
    /// subsumes it. Runs after the backjump, so every assigned variable
    /// sits at a level `<= dp` and "still assigned" is meaningful.
    fn subsume_last_learnt(&mut self, uip: Lit) {
        let lc = self.last_learnt;
        if lc == CRef::NIL {
            return;
        }
        // a lemma whose asserting slot is still assigned may be locked
        if self.vars.value_lit(self.db.lit(lc, 0)) != lbool::UNDEF {
            return;
        }
        let neg_uip = !uip;
        let k = self.db.size(lc);
        for i in 0..k {
            let u = self.db.lit(lc, i);
            if u == neg_uip {
                continue;
            }
            let v = u.var();
            if self.vars.value(v) != lbool::UNDEF
                && self.vars.stamp[v] == self.epoch
                && self.vars.value_lit(u) == lbool::FALSE
            {
                continue;
            }
            return;
        }
        debug!("previous lemma {:?} subsumed, reclaiming it", lc);
        let l0 = self.db.lit(lc, 0);
        self.db.unlink(lc, l0);
        if k > 1 {
            let l1 = self.db.lit(lc, 1);
            self.db.unlink(lc, l1);
        }
        self.db.truncate_to(lc);
        let popped = self.learnts.pop();
        debug_assert_eq!(popped, Some(lc));
        self.n_lemmas -= 1;
        self.last_learnt = CRef::NIL;
    }

    /// Install the learnt clause and assert its first literal. (C9)
    fn learn(&mut self, uip: Lit, lbd: u32) {
        debug_assert!(lbd >= 1);
        let neg_uip = !uip;
        // slot 1 watches the highest-level tail literal
        if self.tail.len() > 1 {
            let mut max_i = 0;
            for i in 1..self.tail.len() {
                if self.vars.level(self.tail[i].var()) > self.vars.level(self.tail[max_i].var()) {
                    max_i = i;
                }
            }
            self.tail.swap(0, max_i);
        }
        self.tmp_learnt.clear();
        self.tmp_learnt.push(neg_uip);
        self.tmp_learnt.extend_from_slice(&self.tail);

        let cr = self.db.append_clause(&self.tmp_learnt, lbd);
        self.cb.on_new_clause(&self.tmp_learnt, Kind::Learnt);
        self.learnts.push(cr);
        self.n_lemmas += 1;
        self.last_learnt = cr;
        self.assign(neg_uip, cr);
        // grow the bump delta; overflow is caught by the rescale
        self.vars.var_decay_activity();
    }

    fn want_restart(&self) -> bool {
        self.vars.decision_level() > 0
            && (self.agility as f64) < self.opts.agility_limit * ((1u64 << 32) as f64)
            && self.epoch - self.last_restart >= self.opts.restart_interval
    }

    /// Reclaim the worst half of the non-locked lemmas by LBD and compact
    /// the arena. (the purge of C5)
    fn purge(&mut self) {
        let mut cands: Vec<CRef> = Vec::new();
        for &c in &self.learnts {
            if !self.locked(c) {
                cands.push(c);
            }
        }
        let db = &self.db;
        cands.sort_by_key(|&c| db.lbd(c));
        let ndrop = cands.len() / 2;
        if ndrop == 0 {
            return;
        }
        for &c in &cands[cands.len() - ndrop..] {
            self.db.set_lbd(c, u32::MAX);
        }

        let old_cells = self.db.len();
        let mut new_cells = Vec::with_capacity(old_cells);
        let mut reloc: HashMap<CRef, CRef> = HashMap::new();
        let mut kept_clauses = Vec::with_capacity(self.clauses.len());
        for &c in &self.clauses {
            let nc = self.db.copy_clause_to(c, &mut new_cells);
            reloc.insert(c, nc);
            kept_clauses.push(nc);
        }
        let mut kept_learnts = Vec::with_capacity(self.learnts.len() - ndrop);
        for &c in &self.learnts {
            if self.db.lbd(c) == u32::MAX {
                continue;
            }
            let nc = self.db.copy_clause_to(c, &mut new_cells);
            reloc.insert(c, nc);
            kept_learnts.push(nc);
        }

        self.db.replace_cells(new_cells);
        for &c in kept_clauses.iter().chain(kept_learnts.iter()) {
            self.db.link_watch(c, 0);
            if self.db.size(c) > 1 {
                self.db.link_watch(c, 1);
            }
        }
        // reasons move with their clauses
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();
            let r = self.vars.vardata[v].reason;
            if r != CRef::NIL {
                self.vars.vardata[v].reason = reloc[&r];
            }
        }

        self.clauses = kept_clauses;
        self.learnts = kept_learnts;
        self.n_lemmas = self.learnts.len() as u64;
        self.last_learnt = CRef::NIL;
        self.purges += 1;
        debug!("purge: {} -> {} cells", old_cells, self.db.len());
        self.cb.on_purge(old_cells, self.db.len());
    }

    /// The main controller loop (C2..C9).
    fn search(&mut self) -> lbool {
        info!("search.start");
        self.cb.on_start();
        loop {
            if let Some(confl) = self.propagate() {
                // C7
                self.conflicts += 1;
                if self.vars.decision_level() == 0 {
                    return lbool::FALSE;
                }
                let (uip, dp, lbd) = self.analyze(confl);
                self.cancel_until(dp); // C8
                self.subsume_last_learnt(uip);
                self.learn(uip, lbd); // C9
                if self.cb.stop() {
                    return lbool::UNDEF;
                }
            } else {
                // C5
                if self.vars.num_assigns() == self.nvars {
                    return lbool::TRUE;
                }
                if self.n_lemmas > self.opts.max_lemmas {
                    self.purge();
                }
                if self.want_restart() {
                    self.starts += 1;
                    self.last_restart = self.epoch;
                    self.cancel_until(0);
                    self.cb.on_restart();
                    let (conflicts, starts, n_clauses, n_lemmas, trail, agility) = (
                        self.conflicts,
                        self.starts,
                        self.clauses.len() as u64,
                        self.n_lemmas,
                        self.vars.num_assigns(),
                        self.agility(),
                    );
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts,
                        restarts: starts,
                        n_clauses,
                        n_lemmas,
                        trail,
                        agility,
                    });
                    continue;
                }
                self.decide(); // C6
            }
        }
    }

    /// Main solve method.
    fn solve_internal(&mut self) -> lbool {
        debug_assert_eq!(self.vars.decision_level(), 0);
        if !self.ok {
            return lbool::FALSE;
        }
        let status = self.search();
        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            self.model.clear();
            self.model.resize(self.nvars as usize, lbool::UNDEF);
            for i in 0..self.nvars {
                let v = Var::from_idx(i);
                self.model[i as usize] = self.vars.value(v);
            }
        } else if status == lbool::FALSE {
            self.ok = false;
        }
        self.cancel_until(0);
        debug!("res: {:?}", status);
        status
    }
}

/// Print the model in DIMACS `v`-line format, ten literals per line.
pub struct SolverPrintDimacs<'a, Cb: Callbacks> {
    s: &'a Solver<Cb>,
}

impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let model = &self.s.model;
        let mut j = 0;
        for (i, &val) in model.iter().enumerate() {
            if val == lbool::UNDEF {
                continue;
            }
            if j % 10 == 0 {
                if j > 0 {
                    writeln!(out)?;
                }
                write!(out, "v")?;
            }
            if val == lbool::TRUE {
                write!(out, " {}", i + 1)?;
            } else {
                write!(out, " -{}", i + 1)?;
            }
            j += 1;
        }
        if j == 0 {
            write!(out, "v")?;
        }
        writeln!(out, " 0")
    }
}

pub struct SolverOpts {
    /// The variable activity decay factor.
    pub var_decay: f64,
    /// Learnt clauses kept before a purge is triggered.
    pub max_lemmas: u64,
    /// Minimum number of epochs between restarts.
    pub restart_interval: u64,
    /// Restart when the phase-flip rate drops below this fraction.
    pub agility_limit: f64,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            max_lemmas: 10_000,
            restart_interval: 1_000,
            agility_limit: 0.25,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && self.max_lemmas >= 1
            && self.restart_interval >= 1
            && (0.0 <= self.agility_limit && self.agility_limit < 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::Basic;
    use rand::prelude::*;

    fn lit(x: i32) -> Lit {
        assert!(x != 0);
        Lit::new(Var::from_idx((x.abs() - 1) as u32), x > 0)
    }

    fn mk_solver(nvars: u32) -> Solver<Basic> {
        let mut s = Solver::new(SolverOpts::default(), Basic::new());
        s.reserve_vars(nvars);
        s
    }

    fn add(s: &mut Solver<Basic>, c: &[i32]) -> bool {
        let mut v: Vec<Lit> = c.iter().map(|&x| lit(x)).collect();
        s.add_clause_reuse(&mut v)
    }

    fn solve_cnf(nvars: u32, cnf: &[Vec<i32>]) -> (lbool, Vec<lbool>) {
        let mut s = mk_solver(nvars);
        for c in cnf {
            add(&mut s, c);
        }
        let res = s.solve();
        (res, s.get_model().to_vec())
    }

    /// Evaluate a CNF under a total model.
    fn eval(cnf: &[Vec<i32>], model: &[lbool]) -> bool {
        cnf.iter().all(|c| {
            c.iter().any(|&x| {
                let val = model[(x.abs() - 1) as usize];
                if x > 0 {
                    val == lbool::TRUE
                } else {
                    val == lbool::FALSE
                }
            })
        })
    }

    /// Exhaustive satisfiability check for small variable counts.
    fn brute_force_sat(nvars: u32, cnf: &[Vec<i32>]) -> bool {
        assert!(nvars <= 16);
        for bits in 0u32..(1 << nvars) {
            let model: Vec<lbool> = (0..nvars)
                .map(|i| lbool::new(bits & (1 << i) != 0))
                .collect();
            if eval(cnf, &model) {
                return true;
            }
        }
        false
    }

    /// PHP(pigeons, holes): unsatisfiable whenever pigeons > holes.
    fn pigeonhole(pigeons: i32, holes: i32) -> (u32, Vec<Vec<i32>>) {
        let var = |p: i32, h: i32| (p - 1) * holes + h;
        let mut cnf = vec![];
        for p in 1..=pigeons {
            cnf.push((1..=holes).map(|h| var(p, h)).collect());
        }
        for h in 1..=holes {
            for p1 in 1..=pigeons {
                for p2 in (p1 + 1)..=pigeons {
                    cnf.push(vec![-var(p1, h), -var(p2, h)]);
                }
            }
        }
        ((pigeons * holes) as u32, cnf)
    }

    fn random_cnf(rng: &mut StdRng, nvars: u32, nclauses: usize, width: usize) -> Vec<Vec<i32>> {
        let mut cnf = Vec::with_capacity(nclauses);
        for _ in 0..nclauses {
            let mut vars: Vec<i32> = (1..=nvars as i32).collect();
            vars.shuffle(rng);
            let clause: Vec<i32> = vars[..width]
                .iter()
                .map(|&v| if rng.gen::<bool>() { v } else { -v })
                .collect();
            cnf.push(clause);
        }
        cnf
    }

    /// Invariant 1: every stored clause is on the watch lists of exactly
    /// its first two literals (first only when unit), and on no others.
    fn check_watch_invariants(s: &Solver<Basic>) {
        use std::collections::HashMap;
        let mut seen: HashMap<CRef, Vec<Lit>> = HashMap::new();
        let total = s.clauses.len() + s.learnts.len();
        for vi in 0..s.nvars {
            for &sign in &[false, true] {
                let l = Lit::new(Var::from_idx(vi), sign);
                let mut w = s.db.head(l);
                let mut hops = 0;
                while w != CRef::NIL {
                    seen.entry(w).or_default().push(l);
                    hops += 1;
                    assert!(hops <= 2 * total, "watch list of {:?} has a cycle", l);
                    w = s.db.next_on_list(w, l);
                }
            }
        }
        for &c in s.clauses.iter().chain(s.learnts.iter()) {
            let mut expect = vec![s.db.lit(c, 0)];
            if s.db.size(c) > 1 {
                expect.push(s.db.lit(c, 1));
            }
            expect.sort_unstable();
            let mut got = seen.remove(&c).unwrap_or_default();
            got.sort_unstable();
            assert_eq!(got, expect, "bad watches for {:?}", c);
        }
        assert!(seen.is_empty(), "watch lists contain dead clauses");
    }

    #[test]
    fn test_single_unit_sat() {
        let (res, model) = solve_cnf(1, &[vec![1]]);
        assert_eq!(res, lbool::TRUE);
        assert_eq!(model[0], lbool::TRUE);
    }

    #[test]
    fn test_model_printing() {
        let mut s = mk_solver(1);
        add(&mut s, &[1]);
        assert_eq!(s.solve(), lbool::TRUE);
        assert_eq!(format!("{}", s.dimacs_model()), "v 1 0\n");
    }

    #[test]
    fn test_model_printing_wraps_lines() {
        let n = 13;
        let mut s = mk_solver(n);
        for i in 1..=n as i32 {
            add(&mut s, &[-i]);
        }
        assert_eq!(s.solve(), lbool::TRUE);
        let shown = format!("{}", s.dimacs_model());
        assert_eq!(
            shown,
            "v -1 -2 -3 -4 -5 -6 -7 -8 -9 -10\nv -11 -12 -13 0\n"
        );
    }

    #[test]
    fn test_contradictory_units_unsat() {
        let mut s = mk_solver(1);
        assert!(add(&mut s, &[1]));
        assert!(!add(&mut s, &[-1]));
        assert!(!s.is_ok());
        assert_eq!(s.solve(), lbool::FALSE);
    }

    #[test]
    fn test_empty_clause_unsat() {
        let mut s = mk_solver(2);
        let mut empty: Vec<Lit> = vec![];
        assert!(!s.add_clause_reuse(&mut empty));
        assert_eq!(s.solve(), lbool::FALSE);
    }

    #[test]
    fn test_example_formula() {
        let cnf = vec![vec![1, 2], vec![3], vec![-2, -3, 4]];
        let (res, model) = solve_cnf(4, &cnf);
        assert_eq!(res, lbool::TRUE);
        assert_eq!(model[2], lbool::TRUE);
        assert!(eval(&cnf, &model));
    }

    #[test]
    fn test_tautology_and_duplicates_are_harmless() {
        let cnf = vec![vec![1, -1, 2], vec![2, 2, 3], vec![-3, -3]];
        let (res, model) = solve_cnf(3, &cnf);
        assert_eq!(res, lbool::TRUE);
        assert!(eval(&vec![vec![2, 3], vec![-3]], &model));
    }

    #[test]
    fn test_forced_chain() {
        // unit 1 forces 2 forces 3, all at level 0
        let cnf = vec![vec![1], vec![-1, 2], vec![-2, 3]];
        let (res, model) = solve_cnf(3, &cnf);
        assert_eq!(res, lbool::TRUE);
        assert_eq!(model[0], lbool::TRUE);
        assert_eq!(model[1], lbool::TRUE);
        assert_eq!(model[2], lbool::TRUE);
    }

    #[test]
    fn test_pigeonhole_3_2_unsat() {
        let (n, cnf) = pigeonhole(3, 2);
        let (res, _) = solve_cnf(n, &cnf);
        assert_eq!(res, lbool::FALSE);
    }

    #[test]
    fn test_pigeonhole_4_3_unsat_with_tiny_purge_budget() {
        let (n, cnf) = pigeonhole(4, 3);
        let opts = SolverOpts {
            max_lemmas: 1,
            ..SolverOpts::default()
        };
        let mut s = Solver::new(opts, Basic::new());
        s.reserve_vars(n);
        for c in &cnf {
            add(&mut s, c);
        }
        assert_eq!(s.solve(), lbool::FALSE);
    }

    #[test]
    fn test_pigeonhole_with_eager_restarts() {
        let (n, cnf) = pigeonhole(3, 2);
        let opts = SolverOpts {
            restart_interval: 1,
            agility_limit: 0.99,
            ..SolverOpts::default()
        };
        let mut s = Solver::new(opts, Basic::new());
        s.reserve_vars(n);
        for c in &cnf {
            add(&mut s, c);
        }
        assert_eq!(s.solve(), lbool::FALSE);
    }

    #[test]
    fn test_stop_callback_reports_unknown() {
        let (n, cnf) = pigeonhole(6, 5);
        let mut cb = Basic::new();
        cb.set_stop(|| true);
        let mut s = Solver::new(SolverOpts::default(), cb);
        s.reserve_vars(n);
        for c in &cnf {
            add(&mut s, c);
        }
        assert_eq!(s.solve(), lbool::UNDEF);
    }

    #[test]
    fn test_random_3sat_models_satisfy() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        for _ in 0..25 {
            let cnf = random_cnf(&mut rng, 20, 85, 3);
            let (res, model) = solve_cnf(20, &cnf);
            if res == lbool::TRUE {
                assert!(eval(&cnf, &model), "reported model does not satisfy");
            }
        }
    }

    #[test]
    fn test_small_random_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..60 {
            let nclauses = 10 + (round % 30);
            let cnf = random_cnf(&mut rng, 8, nclauses, 3);
            let (res, model) = solve_cnf(8, &cnf);
            let expect = brute_force_sat(8, &cnf);
            if expect {
                assert_eq!(res, lbool::TRUE, "missed a model of {:?}", cnf);
                assert!(eval(&cnf, &model));
            } else {
                assert_eq!(res, lbool::FALSE, "claimed a model of UNSAT {:?}", cnf);
            }
        }
    }

    #[test]
    fn test_watch_invariants_after_solving() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let cnf = random_cnf(&mut rng, 12, 40, 3);
            let mut s = mk_solver(12);
            for c in &cnf {
                add(&mut s, c);
            }
            s.solve();
            check_watch_invariants(&s);
        }
    }

    #[test]
    fn test_trail_has_distinct_consistent_vars() {
        // invariant 3, checked at level 0 after propagation
        let mut s = mk_solver(4);
        add(&mut s, &[1]);
        add(&mut s, &[-1, 2]);
        add(&mut s, &[-2, -3]);
        assert!(s.propagate().is_none());
        let mut vars: Vec<Var> = s.vars.trail.iter().map(|l| l.var()).collect();
        vars.sort_unstable();
        vars.dedup();
        assert_eq!(vars.len(), s.vars.trail.len());
        for &l in &s.vars.trail {
            assert_eq!(s.vars.value_lit(l), lbool::TRUE);
            assert!(s.vars.tloc[l.var()] >= 0);
        }
    }

    #[test]
    fn test_backjump_then_redo_restores_state() {
        let mut s = mk_solver(6);
        add(&mut s, &[-1, 2]);
        add(&mut s, &[-2, 3]);
        add(&mut s, &[-4, 5]);
        assert!(s.propagate().is_none());

        let step = |s: &mut Solver<Basic>, l: Lit| {
            s.vars.trail_lim.push(s.vars.trail.len() as i32);
            s.assign(l, CRef::NIL);
            assert!(s.propagate().is_none());
        };
        step(&mut s, lit(1));
        let snapshot: Vec<(lbool, i32, CRef)> = (0..6)
            .map(|i| {
                let v = Var::from_idx(i);
                (s.vars.value(v), s.vars.level(v), s.vars.reason(v))
            })
            .collect();
        step(&mut s, lit(4));
        assert_eq!(s.vars.decision_level(), 2);

        // dropping level 2 leaves level 1 untouched
        s.cancel_until(1);
        for (i, &(val, lev, reason)) in snapshot.iter().enumerate() {
            let v = Var::from_idx(i as u32);
            assert_eq!(s.vars.value(v), val);
            assert_eq!(s.vars.level(v), lev);
            assert_eq!(s.vars.reason(v), reason);
        }

        // redoing the same decision restores identical state
        s.cancel_until(0);
        step(&mut s, lit(1));
        for (i, &(val, lev, reason)) in snapshot.iter().enumerate() {
            let v = Var::from_idx(i as u32);
            assert_eq!(s.vars.value(v), val);
            assert_eq!(s.vars.level(v), lev);
            assert_eq!(s.vars.reason(v), reason);
        }
    }

    #[test]
    fn test_reason_first_literal_convention() {
        // invariant 5: a reason clause's first literal is the forced one
        let mut s = mk_solver(3);
        add(&mut s, &[-1, -2, 3]);
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(1), CRef::NIL);
        assert!(s.propagate().is_none());
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(2), CRef::NIL);
        assert!(s.propagate().is_none());
        let v3 = Var::from_idx(2);
        assert_eq!(s.vars.value(v3), lbool::TRUE);
        let r = s.vars.reason(v3);
        assert!(r != CRef::NIL);
        assert_eq!(s.db.lit(r, 0), lit(3));
        for i in 1..s.db.size(r) {
            assert_eq!(s.vars.value_lit(s.db.lit(r, i)), lbool::FALSE);
        }
    }

    #[test]
    fn test_level0_literals_are_tombstoned() {
        // 3 is false at level 0; the long clause sheds it lazily when the
        // propagator scans past it
        let mut s = mk_solver(4);
        add(&mut s, &[-1, 3, -2, 4]);
        add(&mut s, &[-3]);
        assert!(s.propagate().is_none());
        let c = s.clauses[0];
        assert_eq!(s.db.size(c), 4);
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(1), CRef::NIL);
        assert!(s.propagate().is_none());
        // the scan for a new watch dropped the false level-0 literal
        assert_eq!(s.db.size(c), 3);
        for i in 0..s.db.size(c) {
            assert!(s.db.lit(c, i) != lit(3));
        }
        check_watch_invariants(&s);
    }

    #[test]
    fn test_decision_levels_have_one_decision() {
        // invariant 8, after a couple of manual decisions
        let mut s = mk_solver(5);
        add(&mut s, &[-1, 2]);
        add(&mut s, &[-3, 4]);
        assert!(s.propagate().is_none());
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(1), CRef::NIL);
        assert!(s.propagate().is_none());
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(3), CRef::NIL);
        assert!(s.propagate().is_none());
        for d in 0..s.vars.decision_level() {
            let lo = s.vars.trail_lim[d as usize] as usize;
            let hi = if (d + 1) < s.vars.decision_level() {
                s.vars.trail_lim[(d + 1) as usize] as usize
            } else {
                s.vars.trail.len()
            };
            let decisions = (lo..hi)
                .filter(|&i| s.vars.reason(s.vars.trail[i].var()) == CRef::NIL)
                .count();
            assert_eq!(decisions, 1);
        }
    }

    #[test]
    fn test_phase_saving_prefers_last_polarity() {
        let mut s = mk_solver(2);
        add(&mut s, &[1, 2]);
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(lit(1), CRef::NIL);
        s.cancel_until(0);
        assert_eq!(s.vars.oval[Var::from_idx(0)], true);
        // the next decision on variable 1 tries TRUE again
        s.decide();
        let l = *s.vars.trail.last().unwrap();
        if l.var() == Var::from_idx(0) {
            assert!(l.sign());
        }
    }

    #[test]
    fn test_learnt_clauses_have_positive_lbd() {
        let (n, cnf) = pigeonhole(3, 2);
        let mut s = mk_solver(n);
        for c in &cnf {
            add(&mut s, c);
        }
        // run the search by hand so lemmas can be inspected mid-flight
        loop {
            if let Some(confl) = s.propagate() {
                if s.vars.decision_level() == 0 {
                    break;
                }
                s.conflicts += 1;
                let (uip, dp, lbd) = s.analyze(confl);
                s.cancel_until(dp);
                s.subsume_last_learnt(uip);
                s.learn(uip, lbd);
                for &c in &s.learnts {
                    assert!(s.db.lbd(c) >= 1);
                }
            } else if s.vars.num_assigns() == n {
                panic!("PHP(3,2) cannot be satisfiable");
            } else {
                s.decide();
            }
        }
    }

    #[test]
    fn test_agility_decays_without_flips() {
        let mut s = mk_solver(3);
        s.agility = u32::MAX;
        // assigning the saved phase only decays the average
        s.vars.trail_lim.push(0);
        s.assign(Lit::new(Var::from_idx(0), false), CRef::NIL);
        assert!(s.agility < u32::MAX);
        let before = s.agility;
        // a flipped phase bumps it back up
        s.vars.oval[Var::from_idx(1)] = true;
        s.vars.trail_lim.push(s.vars.trail.len() as i32);
        s.assign(Lit::new(Var::from_idx(1), false), CRef::NIL);
        assert!(s.agility > before - (before >> 13));
    }
}
