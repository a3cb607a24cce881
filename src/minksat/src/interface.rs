/*****************************************************************************************[interface.rs]
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

/* Main Interface */

use crate::clause::{lbool, Lit, Var};

/// Main interface for a solver: it makes it possible to size the variable
/// space, add clauses, and check for satisfiability.
pub trait SolverInterface {
    /// Number of variables, as fixed by `reserve_vars`.
    fn num_vars(&self) -> u32;

    /// Number of clauses stored in the database (unit clauses are
    /// assigned directly and not stored).
    fn num_clauses(&self) -> u64;

    fn num_conflicts(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// Number of literals currently on the trail.
    fn num_assigns(&self) -> u32;

    /// `false` once the clause set is known to be unsatisfiable.
    fn is_ok(&self) -> bool;

    /// Size the per-variable state. Must be called exactly once, before
    /// any clause is added.
    fn reserve_vars(&mut self, nvars: u32);

    /// Add a clause to the solver, reusing the given buffer. Returns
    /// `false` if the solver is now in an UNSAT state.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Search for a model. Returns `lbool::TRUE` on SAT, `lbool::FALSE`
    /// on UNSAT, and `lbool::UNDEF` when the callbacks asked to stop.
    fn solve(&mut self) -> lbool;

    /// Query whole model
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn get_model(&self) -> &[lbool];

    /// Query model for var
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn value_var(&self, v: Var) -> lbool;

    /// Query model for lit
    fn value_lit(&self, l: Lit) -> lbool;

    /// Print some current statistics to standard output.
    fn print_stats(&self);
}
