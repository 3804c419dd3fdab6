//! Built-in resolution engine.
//!
//! A purpose-built SLD resolver for the flat predicate shapes the decision
//! engine emits: clauses are facts `p(a, 'B', 3).` or rules
//! `h(...) :- b1(...), b2(...).` with atom, quoted-string, integer, and
//! variable arguments. Nested compound arguments are rejected as malformed
//! rather than mis-read. Proof search is depth-first with backtracking,
//! clause-variable renaming, and a configurable depth bound so a
//! left-recursive theory fails fast instead of hanging. A branch that hits
//! the bound is pruned; the query errors only when truncation occurred and
//! no proof was found, since a truncated zero must stay distinguishable
//! from a clean zero.

use std::collections::HashMap;

use log::debug;

use crate::error::SolverError;
use crate::solution::Solution;
use crate::solver::Solver;
use crate::term::{Term, TermKind};

/// A goal or clause argument.
#[derive(Debug, Clone, PartialEq)]
enum Arg {
    /// Bare lowercase constant.
    Atom(String),
    /// Single-quoted constant; unifies with an [`Arg::Atom`] of equal text.
    Str(String),
    /// Integer constant.
    Int(i64),
    /// Named variable. Names starting with `_` are internal (anonymous or
    /// renamed) and never reported.
    Var(String),
}

impl Arg {
    fn same_constant(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Atom(a) | Self::Str(a), Self::Atom(b) | Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Literal {
    predicate: String,
    args: Vec<Arg>,
}

#[derive(Debug, Clone)]
struct Clause {
    head: Literal,
    body: Vec<Literal>,
}

type Subst = HashMap<String, Arg>;

/// The default [`Solver`] implementation.
#[derive(Debug)]
pub struct ResolutionEngine {
    clauses: Vec<Clause>,
    fresh: u64,
    depth_limit: usize,
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionEngine {
    /// Default resolution-step bound per query.
    pub const DEFAULT_DEPTH_LIMIT: usize = 512;

    /// Creates an engine with an empty theory and the default depth bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_depth_limit(Self::DEFAULT_DEPTH_LIMIT)
    }

    /// Creates an engine with a custom resolution-step bound, for theories
    /// whose proof chains are deeper (or whose callers want tighter
    /// latency) than the default allows.
    #[must_use]
    pub fn with_depth_limit(depth_limit: usize) -> Self {
        Self {
            clauses: Vec::new(),
            fresh: 0,
            depth_limit,
        }
    }

    /// Number of loaded clauses.
    #[must_use]
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    fn parse_goal(&mut self, goal: &str) -> Result<(Vec<Literal>, Vec<String>), SolverError> {
        let clause =
            parse_clause(goal.trim(), &mut self.fresh).map_err(|reason| SolverError::MalformedGoal {
                goal: goal.to_string(),
                reason,
            })?;

        // A goal may be a single literal or a conjunction written in rule
        // syntax; either way every literal becomes a subgoal.
        let mut goals = vec![clause.head];
        goals.extend(clause.body);

        let mut vars = Vec::new();
        for literal in &goals {
            for arg in &literal.args {
                if let Arg::Var(name) = arg {
                    if !name.starts_with('_') && !vars.contains(name) {
                        vars.push(name.clone());
                    }
                }
            }
        }
        Ok((goals, vars))
    }

    fn prove(
        &self,
        goals: &[Literal],
        subst: &Subst,
        depth: usize,
        counter: &mut u64,
        max: usize,
        out: &mut Vec<Subst>,
        truncated: &mut bool,
    ) {
        if out.len() >= max {
            return;
        }
        let Some((goal, rest)) = goals.split_first() else {
            out.push(subst.clone());
            return;
        };
        if depth >= self.depth_limit {
            // Prune this branch; whether the truncation matters is decided
            // once the whole search has finished.
            *truncated = true;
            return;
        }

        for clause in &self.clauses {
            if clause.head.predicate != goal.predicate
                || clause.head.args.len() != goal.args.len()
            {
                continue;
            }

            *counter += 1;
            let instance = rename_clause(clause, *counter);
            let mut candidate = subst.clone();
            let unified = goal
                .args
                .iter()
                .zip(&instance.head.args)
                .all(|(g, h)| unify(g.clone(), h.clone(), &mut candidate));
            if !unified {
                continue;
            }

            let mut next = instance.body;
            next.extend_from_slice(rest);
            self.prove(&next, &candidate, depth + 1, counter, max, out, truncated);
            if out.len() >= max {
                return;
            }
        }
    }

    fn bindings(vars: &[String], subst: &Subst) -> Solution {
        vars.iter()
            .map(|name| match walk(subst, Arg::Var(name.clone())) {
                Arg::Atom(value) => Term {
                    kind: TermKind::Atom,
                    name: name.clone(),
                    value,
                },
                Arg::Str(value) => Term {
                    kind: TermKind::Str,
                    name: name.clone(),
                    value,
                },
                Arg::Int(value) => Term {
                    kind: TermKind::Number,
                    name: name.clone(),
                    value: value.to_string(),
                },
                Arg::Var(_) => Term {
                    kind: TermKind::Unbound,
                    name: name.clone(),
                    value: String::new(),
                },
            })
            .collect()
    }
}

impl Solver for ResolutionEngine {
    fn reset(&mut self) {
        self.clauses.clear();
    }

    fn consult(&mut self, theory: &str) -> Result<(), SolverError> {
        for line in theory.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            let clause = parse_clause(line, &mut self.fresh).map_err(|reason| {
                SolverError::MalformedClause {
                    clause: line.to_string(),
                    reason,
                }
            })?;
            self.clauses.push(clause);
        }
        Ok(())
    }

    fn solve(&mut self, goal: &str) -> Result<Option<Solution>, SolverError> {
        Ok(self.solve_all(goal, 1)?.into_iter().next())
    }

    fn solve_all(&mut self, goal: &str, max: usize) -> Result<Vec<Solution>, SolverError> {
        let (goals, vars) = self.parse_goal(goal)?;
        let mut counter = self.fresh;
        let mut assignments = Vec::new();
        let mut truncated = false;
        self.prove(
            &goals,
            &Subst::new(),
            0,
            &mut counter,
            max,
            &mut assignments,
            &mut truncated,
        );
        self.fresh = counter;

        if truncated && assignments.is_empty() {
            return Err(SolverError::DepthLimitExceeded {
                limit: self.depth_limit,
            });
        }
        if truncated {
            debug!(
                "proof search truncated at depth {} after {} solutions",
                self.depth_limit,
                assignments.len()
            );
        }
        Ok(assignments
            .iter()
            .map(|subst| Self::bindings(&vars, subst))
            .collect())
    }
}

/// Resolves an argument through the substitution until a constant or an
/// unbound variable is reached.
fn walk(subst: &Subst, mut arg: Arg) -> Arg {
    loop {
        let next = match &arg {
            Arg::Var(name) => subst.get(name).cloned(),
            _ => None,
        };
        match next {
            Some(bound) => arg = bound,
            None => return arg,
        }
    }
}

/// Unifies two arguments, extending `subst` on success.
///
/// No occurs check is needed: arguments are flat, so no binding can contain
/// a variable inside a structure.
fn unify(a: Arg, b: Arg, subst: &mut Subst) -> bool {
    let a = walk(subst, a);
    let b = walk(subst, b);
    match (a, b) {
        (Arg::Var(x), Arg::Var(y)) if x == y => true,
        (Arg::Var(x), bound) => {
            subst.insert(x, bound);
            true
        }
        (bound, Arg::Var(y)) => {
            subst.insert(y, bound);
            true
        }
        (a, b) => a.same_constant(&b),
    }
}

/// Produces a fresh instance of a clause with all variables renamed, so two
/// uses of the same clause in one proof cannot collide.
fn rename_clause(clause: &Clause, n: u64) -> Clause {
    let rename_arg = |arg: &Arg| match arg {
        Arg::Var(name) => Arg::Var(format!("_r{n}_{name}")),
        other => other.clone(),
    };
    let rename_literal = |literal: &Literal| Literal {
        predicate: literal.predicate.clone(),
        args: literal.args.iter().map(rename_arg).collect(),
    };
    Clause {
        head: rename_literal(&clause.head),
        body: clause.body.iter().map(rename_literal).collect(),
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
}

/// Parses one clause line: `head.` or `head :- b1, b2.`.
fn parse_clause(line: &str, fresh: &mut u64) -> Result<Clause, String> {
    let mut scanner = Scanner::new(line);
    let head = parse_literal(&mut scanner, fresh)?;

    scanner.skip_ws();
    let mut body = Vec::new();
    if scanner.src[scanner.pos..].starts_with(":-") {
        scanner.pos += 2;
        loop {
            body.push(parse_literal(&mut scanner, fresh)?);
            scanner.skip_ws();
            if !scanner.eat(',') {
                break;
            }
        }
    }

    scanner.skip_ws();
    if !scanner.eat('.') {
        return Err("expected '.' terminator".to_string());
    }
    scanner.skip_ws();
    if !scanner.at_end() {
        return Err("trailing characters after '.'".to_string());
    }
    Ok(Clause { head, body })
}

fn parse_literal(scanner: &mut Scanner<'_>, fresh: &mut u64) -> Result<Literal, String> {
    scanner.skip_ws();
    match scanner.peek() {
        Some(c) if c.is_ascii_lowercase() => {}
        Some(c) => return Err(format!("expected predicate name, found '{c}'")),
        None => return Err("expected predicate name, found end of input".to_string()),
    }
    let predicate = scanner.ident();

    let mut args = Vec::new();
    scanner.skip_ws();
    if scanner.eat('(') {
        scanner.skip_ws();
        if !scanner.eat(')') {
            loop {
                args.push(parse_arg(scanner, fresh)?);
                scanner.skip_ws();
                if scanner.eat(')') {
                    break;
                }
                if !scanner.eat(',') {
                    return Err("expected ',' or ')' in argument list".to_string());
                }
            }
        }
    }
    Ok(Literal { predicate, args })
}

fn parse_arg(scanner: &mut Scanner<'_>, fresh: &mut u64) -> Result<Arg, String> {
    scanner.skip_ws();
    match scanner.peek() {
        Some('\'') => {
            scanner.bump();
            let start = scanner.pos;
            while let Some(c) = scanner.peek() {
                if c == '\'' {
                    let text = scanner.src[start..scanner.pos].to_string();
                    scanner.bump();
                    return Ok(Arg::Str(text));
                }
                scanner.bump();
            }
            Err("unterminated quoted string".to_string())
        }
        Some(c) if c.is_ascii_digit() || c == '-' => {
            let start = scanner.pos;
            scanner.bump();
            while matches!(scanner.peek(), Some(d) if d.is_ascii_digit()) {
                scanner.bump();
            }
            scanner.src[start..scanner.pos]
                .parse::<i64>()
                .map(Arg::Int)
                .map_err(|_| "invalid number".to_string())
        }
        Some(c) if c.is_ascii_uppercase() || c == '_' => {
            let name = scanner.ident();
            if name == "_" {
                *fresh += 1;
                Ok(Arg::Var(format!("_a{fresh}")))
            } else {
                Ok(Arg::Var(name))
            }
        }
        Some(c) if c.is_ascii_lowercase() => {
            let name = scanner.ident();
            if scanner.peek() == Some('(') {
                return Err("compound arguments are not supported".to_string());
            }
            Ok(Arg::Atom(name))
        }
        Some(c) => Err(format!("unexpected character '{c}' in argument")),
        None => Err("unexpected end of input in argument".to_string()),
    }
}
