//! Selector matching algorithm.
//!
//! Matching is generic over [`SelectorElement`], so any tree that can answer
//! tag, attribute, and navigation questions about its nodes can be queried.

use crate::types::{Combinator, PseudoClass, Selector, SelectorList, SelectorPart, TypeSelector};

/// Read access to an element node for selector matching.
///
/// Implementors are usually small `Copy` handles borrowing the tree
/// (a node id plus a tree reference). Navigation methods only ever yield
/// element nodes; text nodes are invisible to selectors.
pub trait SelectorElement: Sized {
    /// Tag name, lowercase.
    fn local_name(&self) -> &str;

    /// Value of the `id` attribute, if any.
    fn id(&self) -> Option<&str>;

    /// Whether the class list contains `name`.
    fn has_class(&self, name: &str) -> bool;

    /// Value of an attribute by lowercase name.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// The parent element, if any.
    fn parent_element(&self) -> Option<Self>;

    /// The closest preceding sibling element, if any.
    fn prev_sibling_element(&self) -> Option<Self>;

    /// The closest following sibling element, if any.
    fn next_sibling_element(&self) -> Option<Self>;

    /// Whether the node has any element children or non-empty text.
    fn has_content(&self) -> bool;
}

impl SelectorList {
    /// Check if any selector in the list matches the element.
    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches_selector(selector, element))
    }
}

/// Check if a full selector matches the element, considering combinators.
///
/// Walks the selector from right to left, backtracking through ancestors or
/// siblings when a descendant or general-sibling combinator admits more than
/// one candidate.
pub fn matches_selector<E: SelectorElement>(selector: &Selector, element: &E) -> bool {
    if selector.parts.is_empty() {
        return false;
    }
    matches_from(selector, selector.parts.len() - 1, element)
}

fn matches_from<E: SelectorElement>(selector: &Selector, index: usize, element: &E) -> bool {
    if !matches_part(&selector.parts[index], element) {
        return false;
    }
    if index == 0 {
        return true;
    }

    let next = index - 1;
    match selector.combinators[next] {
        Combinator::Descendant => {
            let mut current = element.parent_element();
            while let Some(ancestor) = current {
                if matches_from(selector, next, &ancestor) {
                    return true;
                }
                current = ancestor.parent_element();
            }
            false
        }
        Combinator::Child => element
            .parent_element()
            .is_some_and(|parent| matches_from(selector, next, &parent)),
        Combinator::AdjacentSibling => element
            .prev_sibling_element()
            .is_some_and(|sibling| matches_from(selector, next, &sibling)),
        Combinator::GeneralSibling => {
            let mut current = element.prev_sibling_element();
            while let Some(sibling) = current {
                if matches_from(selector, next, &sibling) {
                    return true;
                }
                current = sibling.prev_sibling_element();
            }
            false
        }
    }
}

/// Check if a single compound part matches the element.
pub fn matches_part<E: SelectorElement>(part: &SelectorPart, element: &E) -> bool {
    if let Some(TypeSelector::Type(name)) = &part.type_selector {
        if !name.eq_ignore_ascii_case(element.local_name()) {
            return false;
        }
    }

    if let Some(id) = &part.id {
        if element.id() != Some(id.as_str()) {
            return false;
        }
    }

    if !part.classes.iter().all(|class| element.has_class(class)) {
        return false;
    }

    if !part
        .attributes
        .iter()
        .all(|attr| attr.matches(element.attribute(&attr.name)))
    {
        return false;
    }

    part.pseudo_classes
        .iter()
        .all(|pseudo| pseudo_matches(pseudo, element))
}

fn pseudo_matches<E: SelectorElement>(pseudo: &PseudoClass, element: &E) -> bool {
    match pseudo {
        PseudoClass::FirstChild => element.prev_sibling_element().is_none(),
        PseudoClass::LastChild => element.next_sibling_element().is_none(),
        PseudoClass::OnlyChild => {
            element.prev_sibling_element().is_none() && element.next_sibling_element().is_none()
        }
        PseudoClass::NthChild(expr) => expr.matches(sibling_index(element)),
        PseudoClass::Empty => !element.has_content(),
        PseudoClass::Not(inner) => !matches_part(inner, element),
    }
}

fn sibling_index<E: SelectorElement>(element: &E) -> usize {
    let mut index = 0;
    let mut current = element.prev_sibling_element();
    while let Some(sibling) = current {
        index += 1;
        current = sibling.prev_sibling_element();
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selector;

    /// Flat test tree: index into a vector of nodes.
    struct Node {
        tag: &'static str,
        classes: Vec<&'static str>,
        attrs: Vec<(&'static str, &'static str)>,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    #[derive(Clone, Copy)]
    struct Handle<'a> {
        nodes: &'a [Node],
        index: usize,
    }

    impl<'a> Handle<'a> {
        fn node(&self) -> &'a Node {
            &self.nodes[self.index]
        }

        fn sibling(&self, offset: isize) -> Option<Self> {
            let parent = self.node().parent?;
            let siblings = &self.nodes[parent].children;
            let pos = siblings.iter().position(|&c| c == self.index)? as isize + offset;
            if pos < 0 {
                return None;
            }
            siblings.get(pos as usize).map(|&index| Handle {
                nodes: self.nodes,
                index,
            })
        }
    }

    impl SelectorElement for Handle<'_> {
        fn local_name(&self) -> &str {
            self.node().tag
        }
        fn id(&self) -> Option<&str> {
            self.attribute("id")
        }
        fn has_class(&self, name: &str) -> bool {
            self.node().classes.contains(&name)
        }
        fn attribute(&self, name: &str) -> Option<&str> {
            self.node()
                .attrs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
        }
        fn parent_element(&self) -> Option<Self> {
            self.node().parent.map(|index| Handle {
                nodes: self.nodes,
                index,
            })
        }
        fn prev_sibling_element(&self) -> Option<Self> {
            self.sibling(-1)
        }
        fn next_sibling_element(&self) -> Option<Self> {
            self.sibling(1)
        }
        fn has_content(&self) -> bool {
            !self.node().children.is_empty()
        }
    }

    fn node(
        tag: &'static str,
        classes: Vec<&'static str>,
        attrs: Vec<(&'static str, &'static str)>,
        parent: Option<usize>,
        children: Vec<usize>,
    ) -> Node {
        Node {
            tag,
            classes,
            attrs,
            parent,
            children,
        }
    }

    // 0: ul.menu
    //    1: li.item#first
    //    2: li.item[data-role=close]
    //       3: span
    fn tree() -> Vec<Node> {
        vec![
            node("ul", vec!["menu"], vec![], None, vec![1, 2]),
            node("li", vec!["item"], vec![("id", "first")], Some(0), vec![]),
            node("li", vec!["item"], vec![("data-role", "close")], Some(0), vec![3]),
            node("span", vec![], vec![], Some(2), vec![]),
        ]
    }

    fn check(selector: &str, index: usize) -> bool {
        let nodes = tree();
        let handle = Handle {
            nodes: &nodes,
            index,
        };
        matches_selector(&parse_selector(selector).unwrap(), &handle)
    }

    #[test]
    fn type_class_and_id() {
        assert!(check("li", 1));
        assert!(check("LI.item", 1));
        assert!(check("#first", 1));
        assert!(!check("#first", 2));
        assert!(!check(".menu", 1));
        assert!(check("*", 3));
    }

    #[test]
    fn attribute_selectors() {
        assert!(check("[data-role=\"close\"]", 2));
        assert!(check("[data-role]", 2));
        assert!(!check("[data-role]", 1));
    }

    #[test]
    fn combinators() {
        assert!(check(".menu span", 3));
        assert!(check(".menu > li > span", 3));
        assert!(!check(".menu > span", 3));
        assert!(check("#first + li", 2));
        assert!(check("#first ~ .item", 2));
        assert!(!check("#first + li", 1));
    }

    #[test]
    fn structural_pseudo_classes() {
        assert!(check("li:first-child", 1));
        assert!(check("li:last-child", 2));
        assert!(check("li:nth-child(2)", 2));
        assert!(check("span:only-child", 3));
        assert!(check("span:empty", 3));
        assert!(!check("li:empty", 2));
        assert!(check("li:not(#first)", 2));
        assert!(!check("li:not(.item)", 2));
    }
}
