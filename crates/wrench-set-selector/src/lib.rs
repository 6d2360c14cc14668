//! CSS-like selectors for wrench-set host trees.
//!
//! This crate provides the selector language used by `query_selector` and by
//! delegated event targeting:
//!
//! - **Selectors**: Type, universal, class, ID, attribute, and structural
//!   pseudo-class selectors
//! - **Combinators**: Descendant, child, adjacent sibling, general sibling
//! - **Selector lists**: Comma-separated alternatives
//! - **Matching**: Generic over any tree that implements [`SelectorElement`]
//!
//! # Example
//!
//! ```
//! use wrench_set_selector::SelectorList;
//!
//! let list: SelectorList = "div.card > [data-role=\"close\"], #dismiss".parse().unwrap();
//! assert_eq!(list.selectors.len(), 2);
//! assert_eq!(list.to_string(), "div.card > [data-role=\"close\"], #dismiss");
//! ```

mod error;
mod matcher;
mod parser;
mod types;

pub use error::{Error, Result};
pub use matcher::{matches_part, matches_selector, SelectorElement};
pub use parser::{parse_selector, parse_selector_list};
pub use types::{
    AttrOperator, AttributeSelector, Combinator, NthExpr, PseudoClass, Selector, SelectorList,
    SelectorPart, TypeSelector,
};
