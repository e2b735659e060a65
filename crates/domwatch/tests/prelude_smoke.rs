//! The prelude alone is enough to build and drive a live selection.

use domwatch::prelude::*;

#[test]
fn prelude_covers_a_full_session() {
    let doc = Document::new();
    let root = doc.create_element("main").unwrap();
    doc.document_element().append_child(&root).unwrap();

    let scope = Scope::new();
    let selector = Observable::new("a[href^=\"https:\"]".to_string());
    let links = LiveSelection::in_scope(&scope, &root, &selector);
    scope.activate();
    assert_eq!(links.phase(), Phase::Active);

    let link = doc.create_element("a").unwrap();
    link.set_attribute("href", "https://example.org").unwrap();
    root.append_child(&link).unwrap();
    doc.flush();
    assert_eq!(links.snapshot(), vec![link.clone()]);

    selector.set("a[href$=\".net\"]".to_string());
    assert!(links.is_empty());

    scope.deactivate();
    assert_eq!(links.phase(), Phase::Deactivated);
}
