//! Plain data: locators, options and progress snapshots.

pub mod locator;
pub mod options;
pub mod progress;

pub use locator::{Locator, SmbAuth, SmbLocator};
pub use options::{ClientOptions, FetchOptions, FetchPhase};
pub use progress::Progress;
