use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::annotations::{self, Annotation, Syntax, SyntaxError};
use crate::fault::{E_USER_WARNING, E_WARNING, FaultPolicy};
use crate::logger::Location;

pub mod scan;

use scan::{Comment, Scan};

/// Builds annotations from one kind of source construct.
pub trait AnnotationFactory {
    fn build(&self, source: &str, scan: &Scan) -> Vec<Result<Annotation, SyntaxError>>;
}

/// `@OA\...` annotations inside doc comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocBlockFactory;

impl AnnotationFactory for DocBlockFactory {
    fn build(&self, _source: &str, scan: &Scan) -> Vec<Result<Annotation, SyntaxError>> {
        scan.comments
            .iter()
            .filter(|c| c.kind.is_doc())
            .flat_map(in_comment)
            .collect()
    }
}

/// `#[oa::...]` attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeFactory;

impl AnnotationFactory for AttributeFactory {
    fn build(&self, source: &str, scan: &Scan) -> Vec<Result<Annotation, SyntaxError>> {
        scan.attributes
            .iter()
            .map(|&(offset, line)| {
                annotations::parse(&source[offset..], line, Syntax::Attribute).map(|(ann, _)| ann)
            })
            .collect()
    }
}

fn in_comment(comment: &Comment) -> Vec<Result<Annotation, SyntaxError>> {
    const MARKER: &str = "@OA\\";
    let text = comment.text.as_str();
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find(MARKER) {
        let start = pos + found + MARKER.len();
        let line = comment.line + text[..start].matches('\n').count();
        match annotations::parse(&text[start..], line, Syntax::DocBlock) {
            Ok((ann, used)) => {
                out.push(Ok(ann));
                pos = start + used;
            }
            Err(err) => {
                out.push(Err(err));
                pos = start;
            }
        }
    }
    out
}

/// Strategy for extracting annotations from a source file.
pub enum Analyzer {
    /// Doc comments and attributes, through the given factories.
    Reflection(Vec<Box<dyn AnnotationFactory>>),
    /// Every comment is a candidate; attributes are not looked at.
    Token,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Analyzer::Reflection(factories) => f
                .debug_tuple("Reflection")
                .field(&factories.len())
                .finish(),
            Analyzer::Token => f.write_str("Token"),
        }
    }
}

impl Analyzer {
    /// The default analyzer: doc-comment and attribute factories.
    pub fn reflection() -> Self {
        Analyzer::Reflection(vec![Box::new(DocBlockFactory), Box::new(AttributeFactory)])
    }

    pub fn token() -> Self {
        Analyzer::Token
    }

    /// Annotations in `source`, ordered by line.
    pub fn analyze_source(&self, source: &str) -> Vec<Result<Annotation, SyntaxError>> {
        let scan = scan::scan(source);
        let mut found: Vec<Result<Annotation, SyntaxError>> = match self {
            Analyzer::Reflection(factories) => factories
                .iter()
                .flat_map(|f| f.build(source, &scan))
                .collect(),
            Analyzer::Token => scan.comments.iter().flat_map(in_comment).collect(),
        };
        found.sort_by_key(|r| match r {
            Ok(ann) => ann.line,
            Err(err) => err.line,
        });
        found
    }

    /// Reads and analyzes one file. Unreadable files and malformed
    /// annotations are reported as warnings and skipped.
    ///
    /// # Errors
    /// Only when a reported fault is fatal.
    pub fn analyze_file(&self, path: &Path, faults: &FaultPolicy<'_>) -> Result<Vec<Annotation>> {
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(err) => {
                faults.raise(
                    E_WARNING,
                    &format!("Unable to read {}: {err}", path.display()),
                    None,
                )?;
                return Ok(Vec::new());
            }
        };
        let mut out = Vec::new();
        for result in self.analyze_source(&source) {
            match result {
                Ok(ann) => out.push(ann),
                Err(err) => faults.raise(
                    E_USER_WARNING,
                    &format!("Unable to parse annotation in {}: {}", path.display(), err.message),
                    Some(&Location::new(path, err.line)),
                )?,
            }
        }
        tracing::debug!(path = %path.display(), annotations = out.len(), "analyzed");
        Ok(out)
    }
}
