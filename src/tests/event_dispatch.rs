use super::*;

const NESTED: &str = r#"
    <div id='outer'>
      <div id='inner'>
        <a id='leaf' class='dropdown-item' href='#'>leaf</a>
      </div>
    </div>
    "#;

fn logging_listener(label: &'static str) -> Listener {
    Listener::new(move |page, _event| {
        page.console_mut().log(label);
        Ok(())
    })
}

#[test]
fn click_bubbles_from_target_to_document() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    page.on("#leaf", CLICK, logging_listener("leaf"))?;
    page.on("#inner", CLICK, logging_listener("inner"))?;
    page.on("#outer", CLICK, logging_listener("outer"))?;

    page.click("#leaf")?;
    assert_eq!(
        page.console().messages().collect::<Vec<_>>(),
        vec!["leaf", "inner", "outer"]
    );
    Ok(())
}

#[test]
fn listeners_on_one_node_run_in_registration_order() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    page.on("#leaf", CLICK, logging_listener("first"))?;
    page.on("#leaf", CLICK, logging_listener("second"))?;

    page.click("#leaf")?;
    assert_eq!(
        page.console().messages().collect::<Vec<_>>(),
        vec!["first", "second"]
    );
    Ok(())
}

#[test]
fn stop_propagation_halts_bubbling() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    page.on(
        "#leaf",
        CLICK,
        Listener::new(|page, event| {
            page.console_mut().log("leaf");
            event.stop_propagation();
            Ok(())
        }),
    )?;
    page.on("#outer", CLICK, logging_listener("outer"))?;

    let event = page.click("#leaf")?;
    assert!(event.propagation_stopped());
    assert_eq!(page.console().messages().collect::<Vec<_>>(), vec!["leaf"]);
    Ok(())
}

#[test]
fn prevent_default_is_visible_on_the_returned_event() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    page.on(
        "#leaf",
        CLICK,
        Listener::new(|_page, event| {
            event.prevent_default();
            Ok(())
        }),
    )?;

    let event = page.click("#leaf")?;
    assert!(event.default_prevented());
    assert!(!event.propagation_stopped());
    Ok(())
}

#[test]
fn readding_the_same_listener_is_a_no_op() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    let listener = logging_listener("once");

    page.on("#leaf", CLICK, listener.clone())?;
    page.on("#leaf", CLICK, listener.clone())?;
    assert_eq!(page.listener_count("#leaf", CLICK)?, 1);

    // The same handler on two different nodes is two listeners.
    page.on("#inner", CLICK, listener)?;
    assert_eq!(page.total_listener_count(), 2);

    page.click("#leaf")?;
    assert_eq!(
        page.console().messages().collect::<Vec<_>>(),
        vec!["once", "once"]
    );
    Ok(())
}

#[test]
fn removed_listeners_no_longer_fire() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    let listener = logging_listener("gone");
    let leaf = page.select_one("#leaf")?;

    page.add_node_listener(leaf, CLICK, listener.clone());
    assert!(page.remove_node_listener(leaf, CLICK, &listener));
    assert!(!page.remove_node_listener(leaf, CLICK, &listener));

    page.click("#leaf")?;
    assert!(page.console().is_empty());
    assert_eq!(page.total_listener_count(), 0);
    Ok(())
}

#[test]
fn handlers_may_trigger_nested_dispatch() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    page.on(
        "#leaf",
        CLICK,
        Listener::new(|page, _event| {
            page.console_mut().log("leaf");
            page.dispatch("#outer", "refresh")?;
            Ok(())
        }),
    )?;
    page.on("#outer", "refresh", logging_listener("refreshed"))?;

    page.click("#leaf")?;
    assert_eq!(
        page.console().messages().collect::<Vec<_>>(),
        vec!["leaf", "refreshed"]
    );
    Ok(())
}

#[test]
fn content_loaded_reaches_document_listeners() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    let document = page.document_node();
    page.add_node_listener(document, CONTENT_LOADED, logging_listener("ready"));

    let event = page.dom_content_loaded()?;
    assert_eq!(event.event_type(), CONTENT_LOADED);
    assert!(!event.bubbles());
    assert_eq!(page.console().messages().collect::<Vec<_>>(), vec!["ready"]);
    Ok(())
}

#[test]
fn events_carry_target_and_current_target() -> Result<()> {
    let mut page = Page::from_html(NESTED)?;
    let leaf = page.select_one("#leaf")?;
    let outer = page.select_one("#outer")?;

    page.on(
        "#outer",
        CLICK,
        Listener::new(move |page, event| {
            // The bubble phase runs with the outer node as current target
            // while the target still points at the clicked leaf.
            assert_eq!(event.current_target(), outer);
            assert_eq!(event.target(), leaf);
            let target_tag = page.tag_name(event.target()).unwrap_or("?").to_string();
            page.console_mut()
                .log(format!("saw {target_tag} via bubble"));
            Ok(())
        }),
    )?;

    let event = page.click("#leaf")?;
    assert_eq!(event.target(), leaf);
    assert_eq!(
        page.console().messages().collect::<Vec<_>>(),
        vec!["saw a via bubble"]
    );
    Ok(())
}
