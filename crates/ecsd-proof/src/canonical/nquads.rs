//! Minimal N-Quads model: default-graph quads with IRI, blank-node, and
//! typed-literal terms.

use std::fmt;

use ecsd_core::ProofError;

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl Term {
    pub fn blank_label(&self) -> Option<&str> {
        match self {
            Term::Blank(label) => Some(label),
            _ => None,
        }
    }

    fn relabel<F>(&self, f: &mut F) -> Result<Term, ProofError>
    where
        F: FnMut(&str) -> Result<String, ProofError>,
    {
        match self {
            Term::Blank(label) => Ok(Term::Blank(f(label)?)),
            other => Ok(other.clone()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal { value, datatype } => {
                write!(f, "\"{}\"", escape(value))?;
                match datatype {
                    Some(dt) if dt != XSD_STRING => write!(f, "^^<{}>", escape_iri(dt)),
                    _ => Ok(()),
                }
            }
        }
    }
}

/// A default-graph statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Quad {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    /// Blank-node labels used by this quad, subject first.
    pub fn blank_labels(&self) -> impl Iterator<Item = &str> {
        self.subject
            .blank_label()
            .into_iter()
            .chain(self.object.blank_label())
    }

    /// Copy of this quad with every blank-node label passed through `f`.
    pub fn relabel<F>(&self, mut f: F) -> Result<Quad, ProofError>
    where
        F: FnMut(&str) -> Result<String, ProofError>,
    {
        Ok(Quad {
            subject: self.subject.relabel(&mut f)?,
            predicate: self.predicate.clone(),
            object: self.object.relabel(&mut f)?,
        })
    }

    /// Serialize as one N-Quads line, newline included.
    pub fn to_nquad(&self) -> String {
        format!(
            "{} <{}> {} .\n",
            self.subject,
            escape_iri(&self.predicate),
            self.object
        )
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// IRIs are written between `<` `>`; characters N-Quads forbids inside an
/// IRIREF become `\uXXXX` / `\UXXXXXXXX` escapes.
fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        if c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
            out.push_str(&format!("\\u{:04X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a single N-Quads line as produced by [`Quad::to_nquad`].
pub fn parse_nquad(line: &str) -> Result<Quad, ProofError> {
    let body = line
        .strip_suffix('\n')
        .unwrap_or(line)
        .strip_suffix(" .")
        .ok_or_else(|| malformed(line, "missing terminating ' .'"))?;
    let mut cursor = Cursor { rest: body, line };

    let subject = cursor.term()?;
    if matches!(subject, Term::Literal { .. }) {
        return Err(malformed(line, "literal in subject position"));
    }
    cursor.space()?;
    let predicate = match cursor.term()? {
        Term::Iri(iri) => iri,
        _ => return Err(malformed(line, "predicate must be an IRI")),
    };
    cursor.space()?;
    let object = cursor.term()?;
    if !cursor.rest.is_empty() {
        return Err(malformed(line, "named graphs are not supported"));
    }
    Ok(Quad {
        subject,
        predicate,
        object,
    })
}

fn malformed(line: &str, reason: &str) -> ProofError {
    ProofError::Canonicalization(format!(
        "malformed statement {:?}: {}",
        line.trim_end(),
        reason
    ))
}

struct Cursor<'a> {
    rest: &'a str,
    line: &'a str,
}

impl<'a> Cursor<'a> {
    fn space(&mut self) -> Result<(), ProofError> {
        self.rest = self
            .rest
            .strip_prefix(' ')
            .ok_or_else(|| malformed(self.line, "expected a space between terms"))?;
        Ok(())
    }

    /// IRI body after `<`, up to and including the closing `>`.
    fn iri(&mut self) -> Result<String, ProofError> {
        let mut iri = String::new();
        let mut chars = self.rest.char_indices();
        let end = loop {
            match chars.next() {
                Some((i, '>')) => break i,
                Some((_, '\\')) => {
                    let digits = match chars.next() {
                        Some((_, 'u')) => 4,
                        Some((_, 'U')) => 8,
                        _ => return Err(malformed(self.line, "unsupported IRI escape")),
                    };
                    let hex: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
                    let c = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == digits)
                        .and_then(char::from_u32)
                        .ok_or_else(|| malformed(self.line, "invalid IRI escape"))?;
                    iri.push(c);
                }
                Some((_, c)) if c <= ' ' || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`') => {
                    return Err(malformed(self.line, "invalid character in IRI"))
                }
                Some((_, c)) => iri.push(c),
                None => return Err(malformed(self.line, "unterminated IRI")),
            }
        };
        self.rest = &self.rest[end + 1..];
        Ok(iri)
    }

    fn term(&mut self) -> Result<Term, ProofError> {
        if let Some(rest) = self.rest.strip_prefix('<') {
            self.rest = rest;
            Ok(Term::Iri(self.iri()?))
        } else if let Some(rest) = self.rest.strip_prefix("_:") {
            let end = rest.find(' ').unwrap_or(rest.len());
            if end == 0 {
                return Err(malformed(self.line, "empty blank node label"));
            }
            self.rest = &rest[end..];
            Ok(Term::Blank(rest[..end].to_string()))
        } else if let Some(rest) = self.rest.strip_prefix('"') {
            self.rest = rest;
            self.literal()
        } else {
            Err(malformed(self.line, "unrecognized term"))
        }
    }

    fn literal(&mut self) -> Result<Term, ProofError> {
        let mut value = String::new();
        let mut chars = self.rest.char_indices();
        let end = loop {
            match chars.next() {
                Some((i, '"')) => break i,
                Some((_, '\\')) => match chars.next() {
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    _ => return Err(malformed(self.line, "unsupported escape")),
                },
                Some((_, c)) => value.push(c),
                None => return Err(malformed(self.line, "unterminated literal")),
            }
        };
        self.rest = &self.rest[end + 1..];

        let datatype = if let Some(rest) = self.rest.strip_prefix("^^<") {
            self.rest = rest;
            Some(self.iri()?)
        } else if self.rest.starts_with('@') {
            return Err(malformed(self.line, "language-tagged literals are not supported"));
        } else {
            None
        };
        Ok(Term::Literal { value, datatype })
    }
}
