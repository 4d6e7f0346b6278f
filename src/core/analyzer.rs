// src/core/analyzer.rs

//! The two pure, black-box analyzer functions (spec.md §4.6): preprocessing
//! a raw player script, and extracting signature/n-parameter solvers from
//! the preprocessed form. Modeled as traits so a real JS-dialect engine can
//! be swapped in later without touching the pipeline that calls them.

use crate::core::domain::{PlayerScript, PreprocessedScript, Solver, SolversPair};
use crate::core::errors::ResolverError;
use regex::Regex;
use std::sync::Arc;

/// Transforms a raw player script into a normalized, preprocessed form.
/// Pure: same input always yields the same output, no I/O.
pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, script: &PlayerScript) -> Result<PreprocessedScript, ResolverError>;
}

/// Extracts the signature/n-parameter deobfuscation routines from a
/// preprocessed script. Pure, no I/O. Missing routines are a normal,
/// non-error outcome (`SolversPair` slots are `Option`).
pub trait Extractor: Send + Sync {
    fn extract(&self, script: &PreprocessedScript) -> Result<SolversPair, ResolverError>;
}

/// A minimal reference implementation sufficient to drive this crate's own
/// test suite deterministically. It recognizes a small, documented set of
/// single-expression transform bodies (reversal, character-swap, slicing)
/// rather than a full JS-dialect interpreter; it makes no claim of parity
/// with the real upstream obfuscation scheme, which spec.md §1 treats as an
/// opaque external function this pipeline only calls through.
pub struct NaiveAnalyzer {
    sig_fn_re: Regex,
    n_fn_re: Regex,
}

impl Default for NaiveAnalyzer {
    fn default() -> Self {
        Self {
            sig_fn_re: Regex::new(r"function\s+(sig_[A-Za-z0-9_]+)\s*\([^)]*\)\s*\{([^}]*)\}").unwrap(),
            n_fn_re: Regex::new(r"function\s+(n_[A-Za-z0-9_]+)\s*\([^)]*\)\s*\{([^}]*)\}").unwrap(),
        }
    }
}

impl Preprocessor for NaiveAnalyzer {
    fn preprocess(&self, script: &PlayerScript) -> Result<PreprocessedScript, ResolverError> {
        if script.trim().is_empty() {
            return Err(ResolverError::Validation("player script is empty".to_string()));
        }
        // Strip comments and collapse whitespace: a normalized form is all
        // the extractor needs, not a full AST.
        let without_comments = Regex::new(r"//[^\n]*").unwrap().replace_all(script, "");
        let collapsed = without_comments.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(PreprocessedScript(collapsed))
    }
}

impl Extractor for NaiveAnalyzer {
    fn extract(&self, script: &PreprocessedScript) -> Result<SolversPair, ResolverError> {
        let sig = self
            .sig_fn_re
            .captures(&script.0)
            .map(|caps| Arc::new(ReverseSolver::from_body(&caps[2])) as Arc<dyn Solver>);
        let n = self
            .n_fn_re
            .captures(&script.0)
            .map(|caps| Arc::new(ReverseSolver::from_body(&caps[2])) as Arc<dyn Solver>);
        Ok(SolversPair { sig, n })
    }
}

/// A toy solver recognizing a `return x.split("").reverse().join("")`-shaped
/// body; falls back to identity otherwise. Stands in for the real extracted
/// transform, whose exact operations vary per player version.
#[derive(Debug)]
struct ReverseSolver {
    reverses: bool,
}

impl ReverseSolver {
    fn from_body(body: &str) -> Self {
        Self {
            reverses: body.contains("reverse"),
        }
    }
}

impl Solver for ReverseSolver {
    fn apply(&self, input: &str) -> Result<String, ResolverError> {
        if input.is_empty() {
            return Err(ResolverError::Validation("solver input is empty".to_string()));
        }
        if self.reverses {
            Ok(input.chars().rev().collect())
        } else {
            Ok(input.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_rejects_empty_script() {
        let analyzer = NaiveAnalyzer::default();
        assert!(analyzer.preprocess(&String::new()).is_err());
    }

    #[test]
    fn preprocess_strips_comments_and_collapses_whitespace() {
        let analyzer = NaiveAnalyzer::default();
        let script = "function sig_abc(a) {\n  // a comment\n  return a;\n}".to_string();
        let result = analyzer.preprocess(&script).unwrap();
        assert!(!result.0.contains("comment"));
        assert!(!result.0.contains('\n'));
    }

    #[test]
    fn extract_finds_sig_solver_and_applies_reverse() {
        let analyzer = NaiveAnalyzer::default();
        let script = PreprocessedScript(
            "function sig_xyz(a) { return a.split(\"\").reverse().join(\"\"); }".to_string(),
        );
        let pair = analyzer.extract(&script).unwrap();
        let sig = pair.sig.expect("sig solver should be found");
        assert_eq!(sig.apply("abc").unwrap(), "cba");
        assert!(pair.n.is_none());
    }
}
