/*****************************************************************************************[main.rs]
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

extern crate clap;
extern crate cpu_time;
extern crate flate2;
extern crate minksat;

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
extern crate env_logger;

use clap::{App, Arg};
use cpu_time::ProcessTime;
use flate2::bufread::GzDecoder;
use minksat::{lbool, Callbacks, ProgressStatus, Solver, SolverInterface, SolverOpts};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::exit;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Printing callbacks
struct CB {
    pub verbosity: i32,
    /// CPU-time budget: the instant solving started and the limit in seconds.
    pub lim: Option<(ProcessTime, f64)>,
}

impl CB {
    fn new() -> Self {
        CB {
            verbosity: 0,
            lim: None,
        }
    }
}

impl Callbacks for CB {
    fn on_start(&mut self) {
        if self.verbosity >= 1 {
            println!("c =========================[ Search Statistics ]==========================");
            println!("c | Conflicts | Restarts |  Clauses   Lemmas |  Trail  | Agility |");
            println!("c =========================================================================");
        }
    }

    fn on_progress<F>(&mut self, f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbosity >= 1 {
            let p = f();
            println!(
                "c | {:9} | {:8} | {:8} {:8} | {:7} | {:5.1} % |",
                p.conflicts,
                p.restarts,
                p.n_clauses,
                p.n_lemmas,
                p.trail,
                p.agility * 100.0
            );
        }
    }

    fn on_purge(&mut self, old: usize, new: usize) {
        if self.verbosity >= 2 {
            println!("c purge: {:12} cells => {:12} cells", old, new);
        }
    }

    fn on_result(&mut self, _: lbool) {
        if self.verbosity >= 1 {
            println!("c =========================================================================");
        }
    }

    fn stop(&self) -> bool {
        match self.lim {
            None => false,
            Some((start, max_cpu)) => start.elapsed().as_secs_f64() > max_cpu,
        }
    }
}

type MSolver = Solver<CB>; // specialized solver

fn main2() -> io::Result<i32> {
    let start = ProcessTime::now();

    let matches = App::new("minksat")
        .version("0.1.0")
        .about("A CDCL SAT solver with watched literals and agility-driven restarts")
        .arg(Arg::with_name("input-file"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("CPU time budget in seconds; UNKNOWN is reported on expiry")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("is-strict")
                .long("strict")
                .help("Fail when the clause count does not match the header"),
        )
        .arg(
            Arg::with_name("var-decay")
                .long("var-decay")
                .help("The variable activity decay factor")
                .default_value("0.95")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("max-lemmas")
                .long("max-lemmas")
                .help("Learnt clauses kept before a purge is triggered")
                .default_value("10000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restart-interval")
                .long("rinterval")
                .help("Minimum number of epochs between restarts")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("agility-limit")
                .long("agility-lim")
                .help("Restart when the phase-flip rate drops below this fraction")
                .default_value("0.25")
                .takes_value(true),
        )
        .get_matches();

    let mut solver_opts = SolverOpts::default();
    solver_opts.var_decay = matches
        .value_of("var-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.var_decay);
    solver_opts.max_lemmas = matches
        .value_of("max-lemmas")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.max_lemmas);
    solver_opts.restart_interval = matches
        .value_of("restart-interval")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.restart_interval);
    solver_opts.agility_limit = matches
        .value_of("agility-limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.agility_limit);

    if !solver_opts.check() {
        eprintln!("Invalid option value");
        exit(1);
    }

    let verbosity = matches
        .value_of("verbosity")
        .unwrap()
        .parse::<i32>()
        .unwrap_or(0);
    if verbosity < 0 || verbosity > 2 {
        eprintln!("ERROR! invalid value <{}> for option \"verb\".", verbosity);
        exit(1);
    }
    let is_strict = matches.is_present("is-strict");
    let cpu_lim: Option<f64> = matches
        .value_of("cpu-lim")
        .and_then(|s| s.parse().ok())
        .filter(|x| *x > 0.);

    let mut cb = CB::new();
    cb.verbosity = verbosity;
    if let Some(max_cpu) = cpu_lim {
        cb.lim = Some((ProcessTime::now(), max_cpu));
    }

    let mut solver = Solver::new(solver_opts, cb);

    if let Some(input_file) = matches.value_of("input-file") {
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut solver, is_strict)?;
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut solver, is_strict)?;
    }

    if solver.cb().verbosity > 0 {
        println!("c |  Number of variables:  {:12}", solver.num_vars());
        println!("c |  Number of clauses:    {:12}", solver.num_clauses());
    }

    // an input with neither clauses nor units is unsatisfiable
    if solver.num_clauses() == 0 && solver.num_assigns() == 0 {
        println!("s UNSATISFIABLE");
        return Ok(20);
    }

    let ret = solver.solve();

    if solver.cb().verbosity > 0 {
        solver.print_stats();
        println!(
            "c CPU time              : {:.3}s",
            start.elapsed().as_secs_f64()
        );
    }

    if ret == lbool::TRUE {
        println!("s SATISFIABLE");
        print!("{}", solver.dimacs_model());
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");
    } else {
        println!("s UNKNOWN");
    }

    Ok(if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        0
    })
}

fn read_input_autogz<R: BufRead>(
    mut input: R,
    solver: &mut MSolver,
    is_strict: bool,
) -> io::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        minksat::dimacs::parse(
            &mut BufReader::new(GzDecoder::new(input)),
            solver,
            is_strict,
        )
    } else {
        minksat::dimacs::parse(&mut input, solver, is_strict)
    }
}
