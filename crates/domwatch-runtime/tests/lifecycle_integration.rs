//! End-to-end scenarios: selections owned by a scope, driven by a host that
//! mutates a document and flushes at its checkpoint.
//!
//! Trace output is captured per test; `cargo test -- --nocapture` shows it.

use std::cell::RefCell;
use std::rc::Rc;

use domwatch_core::{Document, Element};
use domwatch_runtime::{
    BindingState, LifecycleHooks, LiveSelection, LiveSelectionError, Observable, Phase, Scope,
};
use pretty_assertions::assert_eq;
use tracing::Level;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .try_init();
}

fn tags(elements: &[Element]) -> Vec<String> {
    elements
        .iter()
        .map(|e| match e.id() {
            Some(id) => format!("{}#{id}", e.tag_name()),
            None => e.tag_name(),
        })
        .collect()
}

/// A host component: a list it renders into and a scope for its lifetime.
struct Component {
    scope: Scope,
    doc: Document,
    list: Element,
}

impl Component {
    fn mount(doc: &Document) -> Self {
        let list = doc.create_element("ul").unwrap();
        doc.document_element().append_child(&list).unwrap();
        Self {
            scope: Scope::new(),
            doc: doc.clone(),
            list,
        }
    }

    fn push(&self, id: &str, done: bool) -> Element {
        let item = self.doc.create_element("li").unwrap();
        item.set_attribute("id", id).unwrap();
        if done {
            item.set_attribute("class", "done").unwrap();
        }
        self.list.append_child(&item).unwrap();
        item
    }
}

#[test]
fn component_lifetime_bounds_observation() {
    init_tracing();
    let doc = Document::new();
    let comp = Component::mount(&doc);
    comp.push("a", false);

    let all = LiveSelection::in_scope(&comp.scope, &comp.list, "li");
    let done = LiveSelection::in_scope(&comp.scope, &comp.list, "li.done");
    assert_eq!(all.phase(), Phase::Pending);

    comp.scope.activate();
    assert_eq!(tags(&all.snapshot()), vec!["li#a"]);
    assert!(done.is_empty());

    let b = comp.push("b", false);
    comp.push("c", true);
    doc.flush();
    assert_eq!(tags(&all.snapshot()), vec!["li#a", "li#b", "li#c"]);
    assert_eq!(tags(&done.snapshot()), vec!["li#c"]);

    b.set_attribute("class", "done").unwrap();
    doc.flush();
    assert_eq!(tags(&done.snapshot()), vec!["li#b", "li#c"]);

    comp.scope.deactivate();
    comp.push("d", true);
    doc.flush();
    assert_eq!(all.len(), 3);
    assert_eq!(done.len(), 2);
    assert_eq!(all.state(), BindingState::Idle);
}

#[test]
fn consumer_reaction_settles_within_one_flush() {
    init_tracing();
    let doc = Document::new();
    let comp = Component::mount(&doc);
    let sel = LiveSelection::in_scope(&comp.scope, &comp.list, "li");
    comp.scope.activate();

    // Whenever the list grows past two, the consumer marks the first item.
    let list = comp.list.clone();
    let _sub = sel.elements().subscribe(move |items: &Vec<Element>| {
        if items.len() > 2
            && let Some(first) = list.children().into_iter().next()
            && !first.has_class("done")
        {
            first.set_attribute("class", "done").unwrap();
        }
    });
    let done = LiveSelection::in_scope(&comp.scope, &comp.list, "li.done");

    comp.push("a", false);
    comp.push("b", false);
    comp.push("c", false);
    let invocations = doc.flush();
    assert!(invocations >= 2, "expected a follow-up delivery, got {invocations}");
    assert_eq!(tags(&done.snapshot()), vec!["li#a"]);
    assert!(!doc.has_pending_mutations());
}

#[test]
fn root_handoff_between_documents() {
    init_tracing();
    let first = Document::new();
    let second = Document::new();
    let a = Component::mount(&first);
    let b = Component::mount(&second);
    a.push("a1", false);
    b.push("b1", false);
    b.push("b2", false);

    let root = Observable::new(Some(a.list.clone()));
    let scope = Scope::new();
    let sel = LiveSelection::in_scope(&scope, &root, "li");
    scope.activate();
    assert_eq!(tags(&sel.snapshot()), vec!["li#a1"]);

    root.set(Some(b.list.clone()));
    assert_eq!(tags(&sel.snapshot()), vec!["li#b1", "li#b2"]);

    a.push("a2", false);
    assert_eq!(first.flush(), 0);
    b.push("b3", false);
    assert_eq!(second.flush(), 1);
    assert_eq!(sel.len(), 3);
}

#[test]
fn activation_failure_is_logged_not_panicked() {
    init_tracing();
    let doc = Document::new();
    let comp = Component::mount(&doc);
    comp.push("a", false);
    let sel = LiveSelection::in_scope(&comp.scope, &comp.list, "li::before");
    comp.scope.activate();
    assert_eq!(sel.phase(), Phase::Active);
    assert!(matches!(sel.last_error(), Some(LiveSelectionError::Selector(_))));
    assert!(sel.is_empty());
}

/// A host that records hooks and fires them on its own schedule.
#[derive(Default)]
struct ManualHost {
    activate: RefCell<Vec<domwatch_runtime::Hook>>,
    deactivate: RefCell<Vec<domwatch_runtime::Hook>>,
}

impl LifecycleHooks for ManualHost {
    fn on_activate(&self, hook: domwatch_runtime::Hook) {
        self.activate.borrow_mut().push(hook);
    }

    fn on_deactivate(&self, hook: domwatch_runtime::Hook) {
        self.deactivate.borrow_mut().push(hook);
    }
}

#[test]
fn custom_host_registers_exactly_one_hook_per_edge() {
    init_tracing();
    let doc = Document::new();
    let comp = Component::mount(&doc);
    comp.push("a", false);
    let host = Rc::new(ManualHost::default());
    let sel = LiveSelection::in_scope(host.as_ref(), &comp.list, "li");
    assert_eq!(host.activate.borrow().len(), 1);
    assert_eq!(host.deactivate.borrow().len(), 1);

    for hook in host.activate.borrow_mut().drain(..) {
        hook();
    }
    assert_eq!(sel.len(), 1);
    for hook in host.deactivate.borrow_mut().drain(..) {
        hook();
    }
    assert_eq!(sel.phase(), Phase::Deactivated);
}
