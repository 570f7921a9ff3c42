//! Tokenizer for annotation comment lines.
//!
//! An annotation line is one doc-comment line starting with `@`:
//!
//! ```text
//! @Param id query int true "User ID"
//! ```
//!
//! The first token is the tag name (marker included); the rest are arguments.
//! Double-quoted runs form a single argument with the quotes stripped.

use crate::error::{Error, Result};
use log::debug;

const TAG_MARKER: char = '@';

/// One tokenized annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTag {
    /// Tag name including the marker, e.g. `@Param`
    pub name: String,
    /// Remaining tokens in their original order
    pub arguments: Vec<String>,
}

/// Tokenizes one annotation line into an [`AnnotationTag`].
///
/// # Errors
///
/// Returns `MalformedAnnotation` if the line does not start with a tag marker
/// or if a double quote is left open.
pub fn tokenize(line: &str) -> Result<AnnotationTag> {
    let line = line.trim();
    let mut tokens = split_arguments(line)?.into_iter();

    let name = match tokens.next() {
        Some(name) if name.len() > 1 && name.starts_with(TAG_MARKER) => name,
        _ => {
            return Err(Error::MalformedAnnotation(format!(
                "comment does not start with a tag: {:?}",
                line
            )))
        }
    };

    let tag = AnnotationTag {
        name,
        arguments: tokens.collect(),
    };
    debug!("Tokenized {} with {} arguments", tag.name, tag.arguments.len());
    Ok(tag)
}

/// Splits on whitespace outside double-quoted spans.
fn split_arguments(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // An empty quoted span ("") still yields an argument.
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::MalformedAnnotation(format!(
            "unbalanced quotes in comment: {:?}",
            line
        )));
    }
    if pending {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Collects the text of `#[doc = "..."]` attributes in order.
///
/// Both `///` and `//!` comments desugar to these attributes.
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|text| text.lines().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Doc lines that carry an annotation tag, trimmed.
pub fn annotation_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    doc_lines(attrs)
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| line.starts_with(TAG_MARKER))
        .collect()
}
