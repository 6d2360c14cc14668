//! Selector type definitions.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A comma-separated list of selectors (e.g., "button, a.link").
///
/// A node matches the list if it matches any of its selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorList {
    /// The alternatives, in source order.
    pub selectors: Vec<Selector>,
}

impl SelectorList {
    /// Create a list holding a single selector.
    pub fn single(selector: Selector) -> Self {
        Self {
            selectors: vec![selector],
        }
    }
}

impl FromStr for SelectorList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse_selector_list(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

/// A complex selector (e.g., "ul.menu > li:first-child a").
///
/// A selector consists of one or more compound parts connected by combinators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    /// Compound parts, left to right.
    pub parts: Vec<SelectorPart>,
    /// Combinators between parts (length = parts.len() - 1).
    pub combinators: Vec<Combinator>,
}

impl Selector {
    /// Create a simple type selector.
    pub fn type_selector(tag: impl Into<String>) -> Self {
        Self {
            parts: vec![SelectorPart::type_only(tag)],
            combinators: vec![],
        }
    }

    /// Create a universal selector (*).
    pub fn universal() -> Self {
        Self {
            parts: vec![SelectorPart::universal()],
            combinators: vec![],
        }
    }

    /// Create a class selector.
    pub fn class(class_name: impl Into<String>) -> Self {
        Self {
            parts: vec![SelectorPart::class_only(class_name)],
            combinators: vec![],
        }
    }

    /// Create an ID selector.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            parts: vec![SelectorPart::id_only(id)],
            combinators: vec![],
        }
    }

    /// Add a descendant selector part.
    pub fn descendant(mut self, part: SelectorPart) -> Self {
        if !self.parts.is_empty() {
            self.combinators.push(Combinator::Descendant);
        }
        self.parts.push(part);
        self
    }

    /// Add a child selector part.
    pub fn child(mut self, part: SelectorPart) -> Self {
        if !self.parts.is_empty() {
            self.combinators.push(Combinator::Child);
        }
        self.parts.push(part);
        self
    }

    /// Get the rightmost (subject) selector part.
    pub fn subject(&self) -> Option<&SelectorPart> {
        self.parts.last()
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse_selector(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                match &self.combinators[i - 1] {
                    Combinator::Descendant => write!(f, " ")?,
                    Combinator::Child => write!(f, " > ")?,
                    Combinator::AdjacentSibling => write!(f, " + ")?,
                    Combinator::GeneralSibling => write!(f, " ~ ")?,
                }
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// A compound selector (e.g., "a.link[href^=\"https\"]:first-child").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorPart {
    /// Type selector (tag name or universal).
    pub type_selector: Option<TypeSelector>,
    /// ID selector (#id).
    pub id: Option<String>,
    /// Class selectors (.class).
    pub classes: Vec<String>,
    /// Attribute selectors ([name], [name=value], ...).
    pub attributes: Vec<AttributeSelector>,
    /// Structural pseudo-class selectors.
    pub pseudo_classes: Vec<PseudoClass>,
}

impl SelectorPart {
    /// Create a new empty selector part.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a type-only selector.
    pub fn type_only(tag: impl Into<String>) -> Self {
        Self {
            type_selector: Some(TypeSelector::Type(tag.into())),
            ..Default::default()
        }
    }

    /// Create a universal selector part.
    pub fn universal() -> Self {
        Self {
            type_selector: Some(TypeSelector::Universal),
            ..Default::default()
        }
    }

    /// Create a class-only selector.
    pub fn class_only(class_name: impl Into<String>) -> Self {
        Self {
            classes: vec![class_name.into()],
            ..Default::default()
        }
    }

    /// Create an ID-only selector.
    pub fn id_only(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Add a class selector.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add an attribute selector.
    pub fn with_attribute(mut self, attribute: AttributeSelector) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a pseudo-class selector.
    pub fn with_pseudo(mut self, pseudo: PseudoClass) -> Self {
        self.pseudo_classes.push(pseudo);
        self
    }

    /// Whether the part has no constraints at all.
    pub fn is_empty(&self) -> bool {
        self.type_selector.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_selector {
            Some(TypeSelector::Universal) => write!(f, "*")?,
            Some(TypeSelector::Type(t)) => write!(f, "{}", t)?,
            None => {}
        }

        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }

        for class in &self.classes {
            write!(f, ".{}", class)?;
        }

        for attribute in &self.attributes {
            write!(f, "{}", attribute)?;
        }

        for pseudo in &self.pseudo_classes {
            write!(f, ":{}", pseudo)?;
        }

        Ok(())
    }
}

/// Type selector - matches the node's tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSelector {
    /// Universal selector (*) - matches any element.
    Universal,
    /// Named tag (e.g., "div", "span"). Compared case-insensitively.
    Type(String),
}

/// Attribute selector (e.g., `[data-yup="meho"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Attribute name, lowercased.
    pub name: String,
    /// Value test; `None` means presence only.
    pub value: Option<(AttrOperator, String)>,
}

impl AttributeSelector {
    /// `[name]` - the attribute is present.
    pub fn exists(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            value: None,
        }
    }

    /// `[name=value]` - the attribute equals the value exactly.
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_operator(name, AttrOperator::Equals, value)
    }

    /// Attribute test with an explicit operator.
    pub fn with_operator(
        name: impl Into<String>,
        operator: AttrOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            value: Some((operator, value.into())),
        }
    }

    /// Test an attribute value (or its absence) against this selector.
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((operator, expected)) = &self.value else {
            return true;
        };
        operator.matches(actual, expected)
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "[{}]", self.name),
            Some((operator, value)) => {
                write!(f, "[{}{}\"{}\"]", self.name, operator, value.replace('"', "\\\""))
            }
        }
    }
}

/// Comparison used by an attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `=` exact match.
    Equals,
    /// `~=` whitespace-separated word match.
    Includes,
    /// `|=` exact match or prefix followed by `-`.
    DashMatch,
    /// `^=` prefix match.
    Prefix,
    /// `$=` suffix match.
    Suffix,
    /// `*=` substring match.
    Substring,
}

impl AttrOperator {
    /// Apply the operator to an actual attribute value.
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::Includes => {
                !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            Self::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            Self::Prefix => !expected.is_empty() && actual.starts_with(expected),
            Self::Suffix => !expected.is_empty() && actual.ends_with(expected),
            Self::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

impl fmt::Display for AttrOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Equals => "=",
            Self::Includes => "~=",
            Self::DashMatch => "|=",
            Self::Prefix => "^=",
            Self::Suffix => "$=",
            Self::Substring => "*=",
        };
        f.write_str(op)
    }
}

/// Combinator between selector parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Descendant combinator (space): matches any descendant.
    Descendant,
    /// Child combinator (>): matches direct child only.
    Child,
    /// Adjacent sibling (+): matches immediately following sibling.
    AdjacentSibling,
    /// General sibling (~): matches any following sibling.
    GeneralSibling,
}

/// Structural pseudo-class selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// :first-child - first element among siblings.
    FirstChild,
    /// :last-child - last element among siblings.
    LastChild,
    /// :nth-child(An+B) - position among siblings.
    NthChild(NthExpr),
    /// :only-child - only element child of its parent.
    OnlyChild,
    /// :empty - no element children and no text.
    Empty,
    /// :not(compound) - negation.
    Not(Box<SelectorPart>),
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PseudoClass::FirstChild => write!(f, "first-child"),
            PseudoClass::LastChild => write!(f, "last-child"),
            PseudoClass::NthChild(expr) => write!(f, "nth-child({})", expr),
            PseudoClass::OnlyChild => write!(f, "only-child"),
            PseudoClass::Empty => write!(f, "empty"),
            PseudoClass::Not(inner) => write!(f, "not({})", inner),
        }
    }
}

impl PseudoClass {
    /// Parse an argument-less pseudo-class name.
    pub fn from_css(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first-child" => Some(Self::FirstChild),
            "last-child" => Some(Self::LastChild),
            "only-child" => Some(Self::OnlyChild),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }
}

/// Expression for :nth-child (An+B).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NthExpr {
    /// Coefficient (A in An+B).
    pub a: i32,
    /// Offset (B in An+B).
    pub b: i32,
}

impl NthExpr {
    /// Create a new nth expression.
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Check if a 0-indexed position matches this expression.
    ///
    /// Arithmetic is done in `i64`; a position that overflows never matches.
    pub fn matches(&self, index: usize) -> bool {
        let Some(n) = i64::try_from(index).ok().and_then(|i| i.checked_add(1)) else {
            return false;
        };
        let (a, b) = (i64::from(self.a), i64::from(self.b));
        if a == 0 {
            return n == b;
        }
        let Some(diff) = n.checked_sub(b) else {
            return false;
        };
        let aligned = diff.checked_rem(a) == Some(0);
        if a > 0 { diff >= 0 && aligned } else { diff <= 0 && aligned }
    }

    /// :nth-child(odd) = 2n+1.
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// :nth-child(even) = 2n.
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }
}

impl fmt::Display for NthExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.a, self.b) {
            (2, 1) => write!(f, "odd"),
            (2, 0) => write!(f, "even"),
            (0, b) => write!(f, "{}", b),
            (1, 0) => write!(f, "n"),
            (a, 0) => write!(f, "{}n", a),
            (1, b) if b > 0 => write!(f, "n+{}", b),
            (1, b) => write!(f, "n{}", b),
            (a, b) if b > 0 => write!(f, "{}n+{}", a, b),
            (a, b) => write!(f, "{}n{}", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_display() {
        let sel = Selector::type_selector("ul")
            .descendant(SelectorPart::class_only("item").with_pseudo(PseudoClass::FirstChild));
        assert_eq!(sel.to_string(), "ul .item:first-child");

        let sel = Selector::class("menu").child(SelectorPart::type_only("li"));
        assert_eq!(sel.to_string(), ".menu > li");
    }

    #[test]
    fn attribute_display() {
        let part = SelectorPart::type_only("div")
            .with_attribute(AttributeSelector::equals("data-yup", "meho"))
            .with_attribute(AttributeSelector::exists("hidden"));
        assert_eq!(part.to_string(), "div[data-yup=\"meho\"][hidden]");
    }

    #[test]
    fn attribute_operators() {
        assert!(AttrOperator::Equals.matches("meho", "meho"));
        assert!(!AttrOperator::Equals.matches("meh", "meho"));
        assert!(AttrOperator::Includes.matches("bro jack rick", "jack"));
        assert!(!AttrOperator::Includes.matches("bro jack rick", "ja"));
        assert!(AttrOperator::DashMatch.matches("en-US", "en"));
        assert!(AttrOperator::DashMatch.matches("en", "en"));
        assert!(!AttrOperator::DashMatch.matches("english", "en"));
        assert!(AttrOperator::Prefix.matches("https://x", "https"));
        assert!(!AttrOperator::Prefix.matches("https://x", ""));
        assert!(AttrOperator::Suffix.matches("photo.png", ".png"));
        assert!(AttrOperator::Substring.matches("abcdef", "cd"));
    }

    #[test]
    fn attribute_presence() {
        let sel = AttributeSelector::exists("data-yup");
        assert!(sel.matches(Some("")));
        assert!(!sel.matches(None));
    }

    #[test]
    fn nth_expr_matches() {
        let expr = NthExpr::new(0, 3);
        assert!(!expr.matches(0));
        assert!(!expr.matches(1));
        assert!(expr.matches(2));
        assert!(!expr.matches(3));

        let expr = NthExpr::odd();
        assert!(expr.matches(0));
        assert!(!expr.matches(1));
        assert!(expr.matches(2));

        let expr = NthExpr::even();
        assert!(!expr.matches(0));
        assert!(expr.matches(1));
    }

    #[test]
    fn nth_expr_extreme_values_do_not_overflow() {
        let expr = NthExpr::new(1, i32::MIN);
        assert!(expr.matches(0));
        assert!(expr.matches(41));

        let expr = NthExpr::new(i32::MIN, 1);
        assert!(expr.matches(0));
        assert!(!expr.matches(1));

        let expr = NthExpr::new(i32::MAX, i32::MAX);
        assert!(!expr.matches(0));
        assert!(expr.matches(i32::MAX as usize - 1));

        let expr = NthExpr::new(-1, i32::MIN);
        assert!(!expr.matches(0));

        assert!(!NthExpr::new(1, 0).matches(usize::MAX));
        assert!(!NthExpr::new(0, 1).matches(usize::MAX));
    }

    #[test]
    fn extreme_nth_child_parses_and_matches() {
        let list: SelectorList = ":nth-child(n-2147483648)".parse().unwrap();
        let PseudoClass::NthChild(expr) = &list.selectors[0].parts[0].pseudo_classes[0] else {
            panic!("expected nth-child");
        };
        assert_eq!(expr, &NthExpr::new(1, i32::MIN));
        assert!(expr.matches(3));
    }
}
