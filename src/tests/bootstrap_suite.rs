use std::cell::Cell;
use std::rc::Rc;

use super::*;

struct CountingAction {
    clicks: Rc<Cell<usize>>,
}

impl ItemAction for CountingAction {
    fn on_click(&self, _page: &mut Page, _event: &mut Event) -> Result<()> {
        self.clicks.set(self.clicks.get() + 1);
        Ok(())
    }
}

struct FailingAction;

impl ItemAction for FailingAction {
    fn on_click(&self, _page: &mut Page, _event: &mut Event) -> Result<()> {
        Err(Error::Action("item action rejected the click".into()))
    }
}

fn menu(markup_items: &str) -> String {
    format!("<nav><ul class='dropdown-menu'>{markup_items}</ul></nav>")
}

#[test]
fn no_marked_elements_attaches_nothing_but_still_logs_once() -> Result<()> {
    let html = "<div id='content'><p>Nothing to wire up.</p></div>";

    let mut page = Page::from_html(html)?;
    page.dom_content_loaded()?;
    let report = Bootstrap::new().run(&mut page)?;

    assert_eq!(report.attached, 0);
    assert_eq!(page.total_listener_count(), 0);
    assert_eq!(page.console().len(), 1);
    assert_eq!(page.console().count_of("page scripts loaded"), 1);
    Ok(())
}

#[test]
fn attaches_exactly_one_listener_per_marked_element() -> Result<()> {
    let html = menu(
        "<li><a class='dropdown-item' id='first' href='#'>First</a></li>\
         <li><a class='dropdown-item' id='second' href='#'>Second</a></li>\
         <li><a class='dropdown-item' id='third' href='#'>Third</a></li>\
         <li><a class='nav-link' id='decoy' href='#'>Decoy</a></li>",
    );

    let mut page = Page::from_html(&html)?;
    page.dom_content_loaded()?;
    let report = Bootstrap::new().run(&mut page)?;

    assert_eq!(report.attached, 3);
    assert_eq!(page.listener_count(".dropdown-item", CLICK)?, 3);
    for id in ["#first", "#second", "#third"] {
        assert_eq!(page.listener_count(id, CLICK)?, 1);
    }
    assert_eq!(page.listener_count("#decoy", CLICK)?, 0);
    Ok(())
}

#[test]
fn click_invokes_the_callback_exactly_once_per_click() -> Result<()> {
    let html = menu(
        "<li><a class='dropdown-item' id='first' href='#'>First</a></li>\
         <li><a class='dropdown-item' id='second' href='#'>Second</a></li>",
    );

    let clicks = Rc::new(Cell::new(0));
    let bootstrap = Bootstrap::new().with_action(Rc::new(CountingAction {
        clicks: Rc::clone(&clicks),
    }));
    let mut page = bootstrap.boot(&html)?;

    page.click("#first")?;
    assert_eq!(clicks.get(), 1);
    page.click("#first")?;
    page.click("#second")?;
    assert_eq!(clicks.get(), 3);
    Ok(())
}

#[test]
fn default_noop_click_has_no_observable_effect() -> Result<()> {
    let html = menu("<li><a class='dropdown-item' id='only' href='#'>Only</a></li>");

    let mut page = Bootstrap::new().boot(&html)?;
    let elements_before = page.element_count();
    let text_before = page.text_content("#only")?;

    let event = page.click("#only")?;
    assert!(event.is_trusted());
    assert_eq!(page.element_count(), elements_before);
    assert_eq!(page.text_content("#only")?, text_before);
    assert_eq!(page.console().len(), 1);
    assert_eq!(page.total_listener_count(), 1);
    Ok(())
}

#[test]
fn ready_message_is_logged_exactly_once_and_never_before_ready() -> Result<()> {
    let html = menu("<li><a class='dropdown-item' href='#'>Item</a></li>");
    let bootstrap = Bootstrap::new();

    let mut page = Page::from_html(&html)?;
    let err = bootstrap.run(&mut page).unwrap_err();
    assert!(matches!(err, Error::Lifecycle(_)));
    assert!(page.console().is_empty());
    assert_eq!(page.total_listener_count(), 0);

    page.dom_content_loaded()?;
    bootstrap.run(&mut page)?;
    assert_eq!(page.console().count_of("page scripts loaded"), 1);

    let err = bootstrap.run(&mut page).unwrap_err();
    assert!(matches!(err, Error::Lifecycle(_)));
    assert_eq!(page.console().count_of("page scripts loaded"), 1);
    assert_eq!(page.total_listener_count(), 1);
    Ok(())
}

#[test]
fn content_loaded_fires_at_most_once() -> Result<()> {
    let mut page = Page::from_html("<p>hello</p>")?;
    page.dom_content_loaded()?;
    let err = page.dom_content_loaded().unwrap_err();
    assert!(matches!(err, Error::Lifecycle(_)));
    Ok(())
}

#[test]
fn elements_added_after_the_bootstrap_get_no_listener() -> Result<()> {
    let html = menu("<li><a class='dropdown-item' id='early' href='#'>Early</a></li>");

    let clicks = Rc::new(Cell::new(0));
    let bootstrap = Bootstrap::new().with_action(Rc::new(CountingAction {
        clicks: Rc::clone(&clicks),
    }));
    let mut page = bootstrap.boot(&html)?;

    let late = page.append_element(
        ".dropdown-menu",
        "a",
        &[("class", "dropdown-item"), ("id", "late"), ("href", "#")],
    )?;

    assert_eq!(page.query_selector_all(".dropdown-item")?.len(), 2);
    assert_eq!(page.listener_count(".dropdown-item", CLICK)?, 1);
    assert_eq!(page.node_listener_count(late, CLICK), 0);

    page.click("#late")?;
    assert_eq!(clicks.get(), 0);
    page.click("#early")?;
    assert_eq!(clicks.get(), 1);
    Ok(())
}

#[test]
fn custom_config_controls_marker_class_and_message() -> Result<()> {
    let html = "<ul>\
        <li><span class='menu-entry' id='a'>A</span></li>\
        <li><span class='menu-entry' id='b'>B</span></li>\
        <li><span class='dropdown-item' id='c'>C</span></li>\
        </ul>";

    let config = BootstrapConfig {
        marker_class: "menu-entry".into(),
        ready_message: "menu wired".into(),
    };
    let mut page = Bootstrap::with_config(config)?.boot(html)?;

    assert_eq!(page.listener_count(".menu-entry", CLICK)?, 2);
    assert_eq!(page.listener_count(".dropdown-item", CLICK)?, 0);
    assert_eq!(page.console().count_of("menu wired"), 1);
    assert_eq!(page.console().count_of("page scripts loaded"), 0);
    page.click("#a")?;
    Ok(())
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let config = BootstrapConfig {
        marker_class: ".dropdown-item".into(),
        ready_message: "x".into(),
    };
    let err = Bootstrap::with_config(config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn failing_action_surfaces_from_the_click() -> Result<()> {
    let html = menu("<li><a class='dropdown-item' id='only' href='#'>Only</a></li>");

    let bootstrap = Bootstrap::new().with_action(Rc::new(FailingAction));
    let mut page = bootstrap.boot(&html)?;

    let err = page.click("#only").unwrap_err();
    assert!(matches!(err, Error::Action(_)));
    Ok(())
}

#[test]
fn action_can_write_to_the_page_console() -> Result<()> {
    struct LoggingAction;

    impl ItemAction for LoggingAction {
        fn on_click(&self, page: &mut Page, event: &mut Event) -> Result<()> {
            let label = page
                .tag_name(event.target())
                .unwrap_or("unknown")
                .to_string();
            page.console_mut().log(format!("clicked <{label}>"));
            Ok(())
        }
    }

    let html = menu("<li><a class='dropdown-item' id='only' href='#'>Only</a></li>");
    let mut page = Bootstrap::new()
        .with_action(Rc::new(LoggingAction))
        .boot(&html)?;

    page.click("#only")?;
    assert_eq!(page.console().count_of("clicked <a>"), 1);
    Ok(())
}
