//! Minimal CSS selector engine for the virtual document.
//!
//! Supports the grammar the selector generator emits plus what
//! user-authored rules commonly need: type selectors, `*`, `#id`,
//! `.class`, `:nth-of-type(n)`, compound selectors, the child (`>`) and
//! descendant (whitespace) combinators, and comma-separated lists.
//! Anything else is a parse error, surfaced as a document fault.

use crate::dom::{NodeId, Tree};

/// A selector failed to parse.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector (or one list branch) is empty.
    #[error("empty selector")]
    Empty,

    /// A character outside the supported grammar.
    #[error("unexpected character `{0}` in selector")]
    UnexpectedChar(char),

    /// `:nth-of-type` with a missing or non-positive index.
    #[error("invalid :nth-of-type argument `{0}`")]
    InvalidNth(String),

    /// A pseudo-class other than `:nth-of-type`.
    #[error("unsupported pseudo-class `:{0}`")]
    UnsupportedPseudo(String),

    /// A combinator with nothing on one of its sides.
    #[error("dangling combinator")]
    DanglingCombinator,
}

/// One simple-selector bundle matched against a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_of_type: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A complex selector: compounds joined left-to-right by combinators.
/// `parts[i].0` relates part `i` to part `i - 1`; the first is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<(Combinator, Compound)>,
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    branches: Vec<ComplexSelector>,
}

/// Parse a selector list.
///
/// # Errors
///
/// Returns [`SelectorError`] for anything outside the supported grammar.
pub fn parse(input: &str) -> Result<SelectorList, SelectorError> {
    let branches = input
        .split(',')
        .map(parse_complex)
        .collect::<Result<Vec<_>, _>>()?;
    if branches.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(SelectorList { branches })
}

fn parse_complex(input: &str) -> Result<ComplexSelector, SelectorError> {
    // Normalize so `a>b` and `a > b` tokenize the same way.
    let normalized = input.replace('>', " > ");
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    let mut expect_compound = false;

    for token in normalized.split_whitespace() {
        if token == ">" {
            if parts.is_empty() || expect_compound {
                return Err(SelectorError::DanglingCombinator);
            }
            combinator = Combinator::Child;
            expect_compound = true;
        } else {
            parts.push((combinator, parse_compound(token)?));
            combinator = Combinator::Descendant;
            expect_compound = false;
        }
    }

    if expect_compound {
        return Err(SelectorError::DanglingCombinator);
    }
    if parts.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(ComplexSelector { parts })
}

fn parse_compound(token: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut chars = token.chars().peekable();

    if matches!(chars.peek(), Some('*')) {
        chars.next();
    } else if chars.peek().is_some_and(|ch| is_ident_char(*ch)) {
        compound.tag = Some(read_ident(&mut chars).to_ascii_lowercase());
    }

    while let Some(marker) = chars.next() {
        match marker {
            '#' => {
                let ident = read_ident(&mut chars);
                if ident.is_empty() {
                    return Err(SelectorError::UnexpectedChar('#'));
                }
                compound.id = Some(ident);
            }
            '.' => {
                let ident = read_ident(&mut chars);
                if ident.is_empty() {
                    return Err(SelectorError::UnexpectedChar('.'));
                }
                compound.classes.push(ident);
            }
            ':' => {
                let name = read_ident(&mut chars);
                if name != "nth-of-type" {
                    return Err(SelectorError::UnsupportedPseudo(name));
                }
                compound.nth_of_type = Some(read_nth_argument(&mut chars)?);
            }
            other => return Err(SelectorError::UnexpectedChar(other)),
        }
    }

    if compound == Compound::default() && !token.starts_with('*') {
        return Err(SelectorError::Empty);
    }
    Ok(compound)
}

fn read_nth_argument(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<usize, SelectorError> {
    if chars.next() != Some('(') {
        return Err(SelectorError::InvalidNth(String::new()));
    }
    let mut digits = String::new();
    for ch in chars.by_ref() {
        if ch == ')' {
            return match digits.parse::<usize>() {
                Ok(nth) if nth >= 1 => Ok(nth),
                _ => Err(SelectorError::InvalidNth(digits)),
            };
        }
        digits.push(ch);
    }
    Err(SelectorError::InvalidNth(digits))
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&ch) = chars.peek() {
        if is_ident_char(ch) {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

impl Compound {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let data = tree.node(node);
        if let Some(tag) = &self.tag
            && *tag != data.tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && data.id_attr.as_deref() != Some(id.as_str())
        {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|class| data.classes.iter().any(|have| have == class))
        {
            return false;
        }
        if let Some(nth) = self.nth_of_type
            && tree.nth_of_type(node) != nth
        {
            return false;
        }
        true
    }
}

impl SelectorList {
    /// Whether `node` matches any branch of the list.
    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.branches
            .iter()
            .any(|branch| matches_at(tree, &branch.parts, node))
    }

    /// All live nodes matching the list, in document order.
    pub fn select(&self, tree: &Tree) -> Vec<NodeId> {
        tree.live_nodes()
            .into_iter()
            .filter(|&node| self.matches(tree, node))
            .collect()
    }
}

/// Match right-to-left: the rightmost compound must match `node`, then the
/// remaining parts must match along the ancestor chain.
fn matches_at(tree: &Tree, parts: &[(Combinator, Compound)], node: NodeId) -> bool {
    let Some(((combinator, compound), head)) = parts.split_last() else {
        return true;
    };
    if !compound.matches(tree, node) {
        return false;
    }
    if head.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|parent| matches_at(tree, head, parent)),
        Combinator::Descendant => {
            let mut current = tree.parent(node);
            while let Some(ancestor) = current {
                if matches_at(tree, head, ancestor) {
                    return true;
                }
                current = tree.parent(ancestor);
            }
            false
        }
    }
}
