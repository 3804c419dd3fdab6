//! Knowledge base store: the durable fact/rule text.
//!
//! Facts and rules live in two plain-text files, one clause per line, UTF-8,
//! no header. The store owns that text exclusively: every mutation re-reads
//! the persisted file, applies the change in memory, and writes the whole
//! file back, so no clause list is ever cached across calls. Clause syntax
//! is validated on every load; a malformed line fails loudly instead of
//! being skipped.
//!
//! Cross-process coordination is out of scope: two stores pointed at the
//! same files are a lost-update race (single-writer-per-process assumption).

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::error::{PersistenceError, RulegateResult, ValidationError};

/// Lines must look like `name(args).` or `head(args) :- body.`; blank lines
/// and `%` comments pass through unvalidated.
const CLAUSE_PATTERN: &str = r"^[a-z][A-Za-z0-9_]*\s*(\(.*\))?\s*(:-.*)?\.$";

/// Verbatim copy of both backing files, captured before a mutation so the
/// persisted state can be reinstated if the mutated state turns out to be
/// unloadable.
#[derive(Debug, Clone)]
pub struct KbSnapshot {
    facts: Vec<String>,
    rules: Vec<String>,
}

/// File-backed store for the facts and rules collections.
#[derive(Debug)]
pub struct KnowledgeBase {
    facts_path: PathBuf,
    rules_path: PathBuf,
    clause_re: Regex,
}

impl KnowledgeBase {
    /// Opens (creating if absent) and validates the two backing files.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if either file cannot be created or
    /// read, or contains a malformed clause line.
    pub fn open(
        facts_path: impl Into<PathBuf>,
        rules_path: impl Into<PathBuf>,
    ) -> RulegateResult<Self> {
        let kb = Self {
            facts_path: facts_path.into(),
            rules_path: rules_path.into(),
            clause_re: Regex::new(CLAUSE_PATTERN).expect("clause pattern is a valid regex"),
        };
        kb.ensure_exists(&kb.facts_path)?;
        kb.ensure_exists(&kb.rules_path)?;
        kb.load(&kb.facts_path)?;
        kb.load(&kb.rules_path)?;
        Ok(kb)
    }

    /// Path of the facts file.
    #[must_use]
    pub fn facts_path(&self) -> &Path {
        &self.facts_path
    }

    /// Path of the rules file.
    #[must_use]
    pub fn rules_path(&self) -> &Path {
        &self.rules_path
    }

    /// Appends `fact` to the facts collection unless already present.
    ///
    /// # Errors
    /// Validation error for malformed clause text, persistence error on I/O.
    pub fn add_fact(&self, fact: &str) -> RulegateResult<bool> {
        self.add_facts(&[fact])
    }

    /// Batch insert into the facts collection; idempotent per element.
    ///
    /// Returns whether the persisted set changed.
    ///
    /// # Errors
    /// Validation error for malformed clause text, persistence error on I/O.
    pub fn add_facts(&self, facts: &[&str]) -> RulegateResult<bool> {
        self.add(&self.facts_path, facts)
    }

    /// Removes the first exact match of `fact`; no-op when absent.
    ///
    /// # Errors
    /// Persistence error on I/O.
    pub fn remove_fact(&self, fact: &str) -> RulegateResult<bool> {
        self.remove_facts(&[fact])
    }

    /// Batch removal from the facts collection.
    ///
    /// Returns whether the persisted set changed.
    ///
    /// # Errors
    /// Persistence error on I/O.
    pub fn remove_facts(&self, facts: &[&str]) -> RulegateResult<bool> {
        self.remove(&self.facts_path, facts)
    }

    /// Appends `rule` to the rules collection unless already present.
    ///
    /// # Errors
    /// Validation error for malformed clause text, persistence error on I/O.
    pub fn add_rule(&self, rule: &str) -> RulegateResult<bool> {
        self.add_rules(&[rule])
    }

    /// Batch insert into the rules collection; idempotent per element.
    ///
    /// # Errors
    /// Validation error for malformed clause text, persistence error on I/O.
    pub fn add_rules(&self, rules: &[&str]) -> RulegateResult<bool> {
        self.add(&self.rules_path, rules)
    }

    /// Removes the first exact match of `rule`; no-op when absent.
    ///
    /// # Errors
    /// Persistence error on I/O.
    pub fn remove_rule(&self, rule: &str) -> RulegateResult<bool> {
        self.remove_rules(&[rule])
    }

    /// Batch removal from the rules collection.
    ///
    /// # Errors
    /// Persistence error on I/O.
    pub fn remove_rules(&self, rules: &[&str]) -> RulegateResult<bool> {
        self.remove(&self.rules_path, rules)
    }

    /// Current fact clauses, in file order (comments and blanks skipped).
    ///
    /// # Errors
    /// Persistence error on I/O or malformed clause.
    pub fn facts(&self) -> RulegateResult<Vec<String>> {
        Ok(clause_lines(&self.load(&self.facts_path)?))
    }

    /// Current rule clauses, in file order (comments and blanks skipped).
    ///
    /// # Errors
    /// Persistence error on I/O or malformed clause.
    pub fn rules(&self) -> RulegateResult<Vec<String>> {
        Ok(clause_lines(&self.load(&self.rules_path)?))
    }

    /// The validated full text of the facts file, for solver consumption.
    ///
    /// # Errors
    /// Persistence error on I/O or malformed clause.
    pub fn facts_theory(&self) -> RulegateResult<String> {
        Ok(self.load(&self.facts_path)?.join("\n"))
    }

    /// The validated full text of the rules file, for solver consumption.
    ///
    /// # Errors
    /// Persistence error on I/O or malformed clause.
    pub fn rules_theory(&self) -> RulegateResult<String> {
        Ok(self.load(&self.rules_path)?.join("\n"))
    }

    /// Captures the current persisted state of both files.
    ///
    /// # Errors
    /// Persistence error on I/O or malformed clause.
    pub fn snapshot(&self) -> RulegateResult<KbSnapshot> {
        Ok(KbSnapshot {
            facts: self.load(&self.facts_path)?,
            rules: self.load(&self.rules_path)?,
        })
    }

    /// Writes a previously captured state back over both files.
    ///
    /// # Errors
    /// Persistence error on I/O.
    pub fn restore(&self, snapshot: &KbSnapshot) -> RulegateResult<()> {
        self.store(&self.facts_path, &snapshot.facts)?;
        self.store(&self.rules_path, &snapshot.rules)?;
        Ok(())
    }

    fn ensure_exists(&self, path: &Path) -> Result<(), PersistenceError> {
        if !path.exists() {
            fs::write(path, "").map_err(|source| PersistenceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Read-all with per-line syntax validation. Lines are kept verbatim so
    /// removal by exact match works against what was actually persisted.
    fn load(&self, path: &Path) -> Result<Vec<String>, PersistenceError> {
        let text = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        for (idx, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }
            if !self.clause_re.is_match(trimmed) {
                return Err(PersistenceError::MalformedClause {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    text: line.clone(),
                });
            }
        }
        Ok(lines)
    }

    fn store(&self, path: &Path, lines: &[String]) -> Result<(), PersistenceError> {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        fs::write(path, text).map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn add(&self, path: &Path, clauses: &[&str]) -> RulegateResult<bool> {
        for clause in clauses {
            self.check_clause(clause)?;
        }

        let mut lines = self.load(path)?;
        let mut changed = false;
        for clause in clauses {
            if lines.iter().any(|l| l == clause) {
                debug!("clause already present, nothing to do: {clause}");
            } else {
                lines.push((*clause).to_string());
                changed = true;
            }
        }

        if changed {
            self.store(path, &lines)?;
        }
        Ok(changed)
    }

    fn remove(&self, path: &Path, clauses: &[&str]) -> RulegateResult<bool> {
        let mut lines = self.load(path)?;
        let mut changed = false;
        for clause in clauses {
            if let Some(idx) = lines.iter().position(|l| l == clause) {
                lines.remove(idx);
                changed = true;
            } else {
                debug!("clause already absent, nothing to do: {clause}");
            }
        }

        if changed {
            self.store(path, &lines)?;
        }
        Ok(changed)
    }

    fn check_clause(&self, clause: &str) -> Result<(), ValidationError> {
        if self.clause_re.is_match(clause.trim()) {
            Ok(())
        } else {
            Err(ValidationError::MalformedClause {
                clause: clause.to_string(),
                reason: "expected 'name(args).' optionally with a ':-' body".to_string(),
            })
        }
    }
}

fn clause_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('%'))
        .map(str::to_string)
        .collect()
}
