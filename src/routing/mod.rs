//! Request routing.
//!
//! ```text
//! AdminRequest (method, path)
//!     → table.rs       first route for the method whose pattern matches
//!     → pattern.rs     named parameters extracted into the request
//!     → dispatcher.rs  guards in order, then the handler
//! ```

pub mod dispatcher;
pub mod pattern;
pub mod table;

pub use dispatcher::{Dispatcher, DispatcherState, NOT_FOUND_PATH, redirect};
pub use pattern::{PatternError, RoutePattern, normalize_path};
pub use table::{Endpoint, HandlerFn, HandlerFuture, Route, RouteTable};
