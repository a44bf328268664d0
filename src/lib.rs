//! Deterministic page bootstrap harness: parse a document, fire its
//! content-loaded lifecycle event, run the bootstrap routine, then drive
//! clicks and observe the captured console from tests.

use thiserror::Error as ThisError;

mod bootstrap;
mod config;
mod console;
mod dom;
mod events;
mod html;
mod page;
mod selector;

pub use bootstrap::{Bootstrap, BootstrapReport, ItemAction, NoopAction};
pub use config::BootstrapConfig;
pub use console::Console;
pub use dom::NodeId;
pub use events::{Event, Listener, CLICK, CONTENT_LOADED};
pub use page::{DocumentState, Page};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("action error: {0}")]
    Action(String),
}
