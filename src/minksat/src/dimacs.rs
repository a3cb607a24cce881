/*****************************************************************************************[dimacs.rs]
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
    crate::{
        clause::{Lit, Var},
        interface::SolverInterface,
    },
    std::io::{self, BufRead},
};

/// `parse(input, solver, is_strict)` reads a DIMACS CNF problem into `solver`.
///
/// Comment lines precede a mandatory `p cnf <nvars> <nclauses>` header;
/// the header sizes the solver's variable space once. Unit clauses are
/// assigned immediately (the solver flags contradictions), an empty
/// clause makes the solver unsatisfiable, and literals are range-checked
/// against both the declared variable count and the 32-bit id space.
///
/// ## Params
/// - `is_strict` if true, fail when the number of clauses does not match
///   the declared header
pub fn parse<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    is_strict: bool,
) -> io::Result<()> {
    let (num_vars, num_clauses) = parse_header(input)?;
    solver.reserve_vars(num_vars);
    debug!("parse: {} vars, {} clauses declared", num_vars, num_clauses);

    let mut lits = vec![];
    let mut num_read_clauses = 0;
    loop {
        skip_whitespace(input)?;
        let ch = next_byte(input)?;
        if ch == Some(b'c') {
            skip_line(input)?;
        } else if let Some(_) = ch {
            read_clause(input, num_vars, &mut lits)?;
            solver.add_clause_reuse(&mut lits);
            num_read_clauses += 1;
        } else {
            break;
        }
    }
    if is_strict && num_clauses != num_read_clauses {
        return parse_error(format!(
            "PARSE ERROR! DIMACS header mismatch: declared {} clauses, read {}",
            num_clauses, num_read_clauses
        ));
    }
    Ok(())
}

fn parse_header<R: BufRead>(input: &mut R) -> io::Result<(u32, u64)> {
    loop {
        skip_whitespace(input)?;
        match next_byte(input)? {
            Some(b'c') => skip_line(input)?,
            Some(b'p') => {
                let mut header = [0; 5];
                input.read_exact(&mut header)?;
                if &header != b"p cnf" {
                    return parse_error(format!("PARSE ERROR! Unexpected char: p"));
                }
                let num_vars = parse_int(input)?;
                let num_clauses = parse_int(input)?;
                if num_vars < 0 || num_vars >= i32::MAX as i64 {
                    return parse_error(format!(
                        "PARSE ERROR! Variable count {} out of range",
                        num_vars
                    ));
                }
                if num_clauses < 0 {
                    return parse_error(format!(
                        "PARSE ERROR! Negative clause count {}",
                        num_clauses
                    ));
                }
                return Ok((num_vars as u32, num_clauses as u64));
            }
            Some(ch) => return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char)),
            None => return parse_error(format!("PARSE ERROR! Unexpected EOF before header")),
        }
    }
}

fn read_clause<R: BufRead>(input: &mut R, num_vars: u32, lits: &mut Vec<Lit>) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        let var_num = parsed_lit.abs();
        if var_num > num_vars as i64 {
            return parse_error(format!(
                "PARSE ERROR! Literal {} out of range (header declares {} variables)",
                parsed_lit, num_vars
            ));
        }
        let var = Var::from_idx((var_num - 1) as u32);
        lits.push(Lit::new(var, parsed_lit > 0));
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i64> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    match next_byte(input)? {
        Some(ch) if b'0' <= ch && ch <= b'9' => (),
        Some(ch) => return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char)),
        None => return parse_error(format!("PARSE ERROR! Unexpected EOF")),
    }
    let mut val: i64 = 0;
    while let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            break;
        }
        input.consume(1);
        val = val * 10 + (ch - b'0') as i64;
        // literal and clause counts live in a 32-bit id space
        if val > i32::MAX as i64 {
            return parse_error(format!("PARSE ERROR! Integer {}... overflows", val));
        }
    }
    if neg {
        Ok(-val)
    } else {
        Ok(val)
    }
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| b'\x09' <= ch && ch <= b'\x0d' || ch == b' ')
        .unwrap_or(false)
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    loop {
        if let Some(ch) = next_byte(input)? {
            input.consume(1);
            if ch == b'\n' {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().map(|&ch| ch))
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidInput, message))
}
