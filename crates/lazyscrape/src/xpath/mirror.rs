// ABOUTME: Copies scraper's parsed HTML tree into an sxd_document so sxd_xpath can evaluate over it.
// ABOUTME: Remembers which ego_tree node each mirrored element came from to map results back.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};
use sxd_document::dom::{self, Document};
use sxd_xpath::nodeset;

enum Parent<'d> {
    Root(dom::Root<'d>),
    Element(dom::Element<'d>),
}

/// An XML view of an HTML document.
///
/// Element names and attribute names are the lowercase local names the HTML
/// parser produced; no namespaces are carried over, so unprefixed name tests
/// match HTML, SVG and MathML elements alike. Doctypes and processing
/// instructions are dropped.
pub(crate) struct Mirror<'d> {
    origin: HashMap<nodeset::Node<'d>, NodeId>,
}

impl<'d> Mirror<'d> {
    pub(crate) fn build(document: &Document<'d>, html: &Html) -> Self {
        let mut origin = HashMap::new();
        let mut stack: Vec<(NodeRef<'_, Node>, Parent<'d>)> = html
            .tree
            .root()
            .children()
            .rev()
            .map(|child| (child, Parent::Root(document.root())))
            .collect();

        // Children are pushed reversed so they pop in document order.
        while let Some((node, parent)) = stack.pop() {
            match node.value() {
                Node::Element(element) => {
                    let mirrored = document.create_element(element.name());
                    for (name, value) in element.attrs() {
                        mirrored.set_attribute_value(name, value);
                    }
                    match &parent {
                        Parent::Root(root) => root.append_child(mirrored),
                        Parent::Element(el) => el.append_child(mirrored),
                    }
                    origin.insert(nodeset::Node::Element(mirrored), node.id());
                    for child in node.children().rev() {
                        stack.push((child, Parent::Element(mirrored)));
                    }
                }
                Node::Text(text) => {
                    if let Parent::Element(el) = &parent {
                        el.append_child(document.create_text(text));
                    }
                }
                Node::Comment(comment) => {
                    let mirrored = document.create_comment(comment);
                    match &parent {
                        Parent::Root(root) => root.append_child(mirrored),
                        Parent::Element(el) => el.append_child(mirrored),
                    }
                }
                Node::Fragment | Node::Document => {
                    for child in node.children().rev() {
                        stack.push((child, Parent::Root(document.root())));
                    }
                }
                Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
            }
        }

        Self { origin }
    }

    /// The HTML element a mirrored node was copied from, if it is an element.
    pub(crate) fn element<'a>(&self, html: &'a Html, node: nodeset::Node<'d>) -> Option<ElementRef<'a>> {
        let id = self.origin.get(&node)?;
        html.tree.get(*id).and_then(ElementRef::wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sxd_document::Package;

    #[test]
    fn every_element_maps_back_to_its_origin() {
        let html = Html::parse_document(
            "<!DOCTYPE html><html><body><!-- c --><p class=\"a\">x<b>y</b></p></body></html>",
        );
        let package = Package::new();
        let document = package.as_document();
        let mirror = Mirror::build(&document, &html);

        assert_eq!(mirror.origin.len(), html.tree.nodes().filter(|n| n.value().is_element()).count());
        for (node, id) in &mirror.origin {
            let original = ElementRef::wrap(html.tree.get(*id).unwrap()).unwrap();
            assert_eq!(mirror.element(&html, *node), Some(original));
        }
    }
}
