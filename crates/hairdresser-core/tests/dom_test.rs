//! Continuous rendering into a document.
#![allow(clippy::unwrap_used)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{BODY, HEAD, MemoryDocument};
use hairdresser_core::{
    ControllerOptions, Document, Hairdresser, HeadError, Render, RenderTarget, Signal,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn title_follows_the_stack_and_reverts_on_restore() {
    let doc = MemoryDocument::new("Original");
    let hairdresser = Hairdresser::new();
    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();

    let page = hairdresser.new_override();
    page.title("Page").unwrap();
    assert_eq!(doc.title(), "Page");

    let modal = hairdresser.new_override();
    modal.title("Modal").unwrap();
    assert_eq!(doc.title(), "Modal");

    modal.restore().unwrap();
    assert_eq!(doc.title(), "Page");

    page.restore().unwrap();
    assert_eq!(doc.title(), "Original");
    session.stop().unwrap();
}

#[test]
fn elements_are_created_updated_and_removed() {
    let doc = MemoryDocument::new("");
    let hairdresser = Hairdresser::new();
    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();

    let page = hairdresser.new_override();
    page.meta([("name", "description")], [("content", "page")])
        .unwrap();
    assert_eq!(doc.markup(HEAD), r#"<meta name="description" content="page">"#);

    let modal = hairdresser.new_override();
    modal
        .meta([("name", "description")], [("content", "modal")])
        .unwrap();
    assert_eq!(doc.markup(HEAD), r#"<meta name="description" content="modal">"#);

    modal.restore().unwrap();
    assert_eq!(doc.markup(HEAD), r#"<meta name="description" content="page">"#);

    page.restore().unwrap();
    assert_eq!(doc.markup(HEAD), "");
    session.stop().unwrap();
}

#[test]
fn existing_elements_are_reused_and_restored() {
    let doc = MemoryDocument::new("");
    doc.insert(
        HEAD,
        "meta",
        &[("name", "description"), ("content", "server")],
    );
    let hairdresser = Hairdresser::new();
    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();

    let ov = hairdresser.new_override();
    ov.meta(
        [("name", "description")],
        [("content", "client"), ("data-managed", "yes")],
    )
    .unwrap();
    assert_eq!(doc.children(HEAD).len(), 1);
    assert_eq!(
        doc.markup(HEAD),
        r#"<meta name="description" content="client" data-managed="yes">"#
    );

    ov.restore().unwrap();
    assert_eq!(
        doc.markup(HEAD),
        r#"<meta name="description" content="server">"#
    );
    session.stop().unwrap();
}

#[test]
fn recreated_element_keeps_the_original_snapshot() {
    let doc = MemoryDocument::new("");
    let server = doc.insert(
        HEAD,
        "meta",
        &[("name", "description"), ("content", "server")],
    );
    let hairdresser = Hairdresser::new();
    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();

    let ov = hairdresser.new_override();
    ov.meta([("name", "description")], [("content", "client")]).unwrap();

    // the host drops the element mid-session
    doc.remove_child(&HEAD, &server);
    ov.update().unwrap();
    assert_eq!(
        doc.markup(HEAD),
        r#"<meta name="description" content="client">"#
    );

    ov.restore().unwrap();
    assert_eq!(
        doc.markup(HEAD),
        r#"<meta name="description" content="server">"#
    );
    session.stop().unwrap();
}

#[test]
fn stale_cache_entries_are_replaced() {
    let doc = MemoryDocument::new("");
    let hairdresser = Hairdresser::new();
    let signal = Signal::new();
    hairdresser
        .new_override()
        .link_with(
            [("rel", "icon")],
            [("href", "/favicon.ico")],
            ControllerOptions::new().source(signal.clone()),
        )
        .unwrap();

    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();
    let first = doc.children(HEAD)[0];

    // Someone else detaches the element.
    doc.remove_child(&HEAD, &first);
    assert_eq!(doc.markup(HEAD), "");

    signal.emit();
    assert_eq!(doc.markup(HEAD), r#"<link rel="icon" href="/favicon.ico">"#);
    assert_ne!(doc.children(HEAD)[0], first);
    session.stop().unwrap();
}

#[test]
fn drifted_matching_attributes_invalidate_the_cache() {
    let doc = MemoryDocument::new("");
    let hairdresser = Hairdresser::new();
    let ov = hairdresser.new_override();
    ov.meta([("name", "theme-color")], [("content", "#fff")])
        .unwrap();

    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();
    let first = doc.children(HEAD)[0];
    doc.set_attribute(&first, "name", "something-else");

    ov.update().unwrap();
    let children = doc.children(HEAD);
    assert_eq!(children.len(), 2);
    assert_eq!(
        doc.get_attribute(&children[0], "name").as_deref(),
        Some("something-else")
    );
    assert_eq!(
        doc.get_attribute(&children[1], "name").as_deref(),
        Some("theme-color")
    );
    session.stop().unwrap();
}

#[test]
fn selector_and_element_targets() {
    let doc = MemoryDocument::new("");
    let app = doc.insert(BODY, "div", &[("id", "app")]);
    let hairdresser = Hairdresser::new();
    hairdresser
        .new_override()
        .meta([("name", "x")], [("content", "y")])
        .unwrap();

    let session = hairdresser
        .render(doc.clone(), RenderTarget::Selector("div[id='app']".into()))
        .unwrap();
    assert_eq!(doc.markup(app), r#"<meta name="x" content="y">"#);
    session.stop().unwrap();
    assert_eq!(doc.markup(app), "");

    let session = hairdresser
        .render(doc.clone(), RenderTarget::Element(BODY))
        .unwrap();
    assert!(doc.markup(BODY).ends_with(r#"<meta name="x" content="y">"#));
    session.stop().unwrap();
}

#[test]
fn missing_root_is_an_environment_error() {
    let hairdresser = Hairdresser::new();

    let err = hairdresser
        .render(MemoryDocument::without_head(), RenderTarget::Head)
        .unwrap_err();
    assert!(matches!(err, HeadError::Environment { .. }));

    let err = hairdresser
        .render(
            MemoryDocument::new(""),
            RenderTarget::Selector("section[id='nope']".into()),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Environment error: no element matches 'section[id='nope']'"
    );
}

#[test]
fn session_stop_restores_the_head() {
    let doc = MemoryDocument::new("Before");
    let hairdresser = Hairdresser::new();
    hairdresser
        .new_override()
        .title("During")
        .unwrap()
        .link([("rel", "canonical")], [("href", "/x")])
        .unwrap();

    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();
    assert_eq!(doc.title(), "During");
    assert_eq!(doc.children(HEAD).len(), 1);

    session.stop().unwrap();
    assert_eq!(doc.title(), "Before");
    assert_eq!(doc.markup(HEAD), "");
}

#[test]
fn dynamic_values_track_their_source() {
    let doc = MemoryDocument::new("");
    let hairdresser = Hairdresser::new();
    let signal = Signal::new();
    let unread = Rc::new(RefCell::new(0_u32));
    let reader = Rc::clone(&unread);

    hairdresser
        .new_override()
        .title_with(
            Render::func(move || match *reader.borrow() {
                0 => json!("Inbox"),
                n => json!(format!("Inbox ({n})")),
            }),
            ControllerOptions::new().source(signal.clone()),
        )
        .unwrap();

    let session = hairdresser.render(doc.clone(), RenderTarget::Head).unwrap();
    assert_eq!(doc.title(), "Inbox");

    *unread.borrow_mut() = 3;
    signal.emit();
    assert_eq!(doc.title(), "Inbox (3)");
    session.stop().unwrap();
}
