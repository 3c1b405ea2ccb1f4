//! # fixbot - A Computer Troubleshooting Chatbot
//!
//! fixbot answers free-text "computer problem" questions by looking them up in
//! a fixed dataset of problem/solution pairs. Problems are normalized, indexed
//! with TF-IDF weights and compared to the query by cosine similarity; the
//! closest problem's solution is returned if it scores at least 0.40.
//!
//! Around that core sit a SQLite user store, cookie sessions and a small JSON
//! API (see [`server`]).
//!
//! ## Example
//!
//! ```
//! use fixbot::{Chatbot, DatasetRow, IdfWeighting};
//!
//! let rows = vec![
//!     DatasetRow {
//!         problem: "printer not printing".to_string(),
//!         solution: "Check printer cable and driver installation".to_string(),
//!     },
//!     DatasetRow {
//!         problem: "wifi keeps disconnecting".to_string(),
//!         solution: "Update the wireless adapter driver".to_string(),
//!     },
//! ];
//!
//! let bot = Chatbot::from_rows(rows, IdfWeighting::Standard);
//! assert_eq!(
//!     bot.respond("printer is not printing anything"),
//!     "Check printer cable and driver installation"
//! );
//! ```

pub mod chatbot;
pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod server;
pub mod session;
pub mod stopwords;
pub mod text;
pub mod users;
pub mod vector;

// Re-export the types most callers need
pub use chatbot::Chatbot;
pub use dataset::DatasetRow;
pub use error::{Error, Result};
pub use index::IdfWeighting;
