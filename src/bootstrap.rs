use std::fmt;
use std::rc::Rc;

use crate::config::BootstrapConfig;
use crate::events::{Event, Listener, CLICK};
use crate::page::Page;
use crate::{Error, Result};

/// Extension point for the per-item click behavior.
///
/// The bootstrap attaches one listener per marked element, and every click on
/// a marked element lands here. What an item click should ultimately do is
/// undecided upstream, so the shipped default is [`NoopAction`]; consumers
/// with real behavior implement this trait and pass it to
/// [`Bootstrap::with_action`].
pub trait ItemAction {
    fn on_click(&self, page: &mut Page, event: &mut Event) -> Result<()>;
}

/// The default item action. Deliberately does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAction;

impl ItemAction for NoopAction {
    fn on_click(&self, _page: &mut Page, _event: &mut Event) -> Result<()> {
        Ok(())
    }
}

/// What a bootstrap run attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Number of marked elements that received a click listener. Equals the
    /// number of elements matching the marker class at query time.
    pub attached: usize,
}

/// The page initialization routine: one console line, then a click listener
/// on every element carrying the marker class.
///
/// This is the explicit init function the application entry point invokes
/// once per page, after the page's content-loaded event has fired.
pub struct Bootstrap {
    config: BootstrapConfig,
    action: Rc<dyn ItemAction>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self {
            config: BootstrapConfig::default(),
            action: Rc::new(NoopAction),
        }
    }

    pub fn with_config(config: BootstrapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            action: Rc::new(NoopAction),
        })
    }

    pub fn with_action(mut self, action: Rc<dyn ItemAction>) -> Self {
        self.action = action;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Runs the bootstrap once against a ready page.
    ///
    /// Errors with [`Error::Lifecycle`] when the page has not fired
    /// content-loaded yet, or when the bootstrap already ran on it.
    pub fn run(&self, page: &mut Page) -> Result<BootstrapReport> {
        if !page.is_ready() {
            return Err(Error::Lifecycle(
                "bootstrap invoked before content-loaded".into(),
            ));
        }
        if page.bootstrap_ran() {
            return Err(Error::Lifecycle(
                "bootstrap already ran for this page".into(),
            ));
        }

        page.console_mut().log(self.config.ready_message.clone());

        let selector = format!(".{}", self.config.marker_class);
        let items = page.query_selector_all(&selector)?;
        for &node in &items {
            let action = Rc::clone(&self.action);
            page.add_node_listener(
                node,
                CLICK,
                Listener::new(move |page, event| action.on_click(page, event)),
            );
        }

        page.mark_bootstrap_ran();
        tracing::debug!(
            attached = items.len(),
            marker_class = %self.config.marker_class,
            "bootstrap finished"
        );
        Ok(BootstrapReport {
            attached: items.len(),
        })
    }

    /// Entry-point convenience: parse `html`, fire content-loaded, run the
    /// bootstrap, and hand back the live page.
    pub fn boot(&self, html: &str) -> Result<Page> {
        let mut page = Page::from_html(html)?;
        page.dom_content_loaded()?;
        self.run(&mut page)?;
        Ok(page)
    }
}
