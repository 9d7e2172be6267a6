//! Selector synthesis for user-picked elements.

use crate::dom::Dom;

/// Builds a CSS path for `element`.
///
/// Walks up the parent chain emitting `tag:nth-of-type(n)` per level and
/// stops at the first ancestor (or the element itself) with a non-empty id,
/// which is emitted as `tag#id`. Ids are assumed unique on the page.
///
/// The result is a snapshot: pages that reorder their DOM can make it point
/// somewhere else later.
pub fn synthesize<D: Dom>(dom: &D, element: &D::Node) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element.clone());

    while let Some(node) = current {
        let tag = dom.tag_name(&node).to_ascii_lowercase();

        if let Some(id) = dom.id(&node).filter(|id| !id.is_empty()) {
            parts.push(format!("{tag}#{id}"));
            break;
        }

        let mut nth = 1;
        let mut sibling = dom.previous_element_sibling(&node);
        while let Some(prev) = sibling {
            if dom.tag_name(&prev).eq_ignore_ascii_case(&tag) {
                nth += 1;
            }
            sibling = dom.previous_element_sibling(&prev);
        }
        parts.push(format!("{tag}:nth-of-type({nth})"));

        current = dom.parent_element(&node);
    }

    parts.reverse();
    parts.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::testing::MemoryDom;

    #[test]
    fn test_stops_at_id() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        let main = dom.element(body, "div", &[("id", "main")]);
        dom.append(main, "span");
        let second = dom.append(main, "span");

        assert_eq!(synthesize(&dom, &second), "div#main > span:nth-of-type(2)");
    }

    #[test]
    fn test_counts_only_same_tag_siblings() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        dom.append(body, "p");
        dom.append(body, "div");
        dom.append(body, "p");
        let target = dom.append(body, "div");

        assert_eq!(
            synthesize(&dom, &target),
            "html:nth-of-type(1) > body:nth-of-type(1) > div:nth-of-type(2)"
        );
    }

    #[test]
    fn test_element_with_own_id() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let dialog = dom.element(html, "dialog", &[("id", "consent")]);
        assert_eq!(synthesize(&dom, &dialog), "dialog#consent");
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let div = dom.element(html, "div", &[("id", "")]);
        assert_eq!(synthesize(&dom, &div), "html:nth-of-type(1) > div:nth-of-type(1)");
    }

    #[test]
    fn test_selector_finds_the_element() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        let list = dom.element(body, "ul", &[("class", "feed")]);
        dom.append(list, "li");
        let item = dom.append(list, "li");
        dom.append(list, "li");

        let selector = synthesize(&dom, &item);
        assert_eq!(dom.query_selector_all(&dom.document(), &selector).unwrap(), vec![item]);
    }
}
