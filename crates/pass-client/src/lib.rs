//! PASS Data Client
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Typed access to the PASS research-compliance repository over JSON:API.
//!
//! # Overview
//!
//! - [`model`]: the PASS records and their relationship descriptors
//! - [`PassClient`]: create, read, update, delete and select over HTTP
//! - [`PassObjectIter`]: lazy iteration across result pages
//! - [`rsql`]: helpers for the repository's filter syntax
//!
//! Relationship targets the server embedded in `included` come back fully
//! hydrated. Any other target is a stub that carries only its id; fetch it
//! again (or name it in `include`) before reading its attributes.
//!
//! # Example
//!
//! ```no_run
//! use pass_client::model::{Entity, Grant, Submission};
//! use pass_client::{rsql, PassClient, PassClientSelector};
//!
//! # async fn run() -> pass_client::Result<()> {
//! let client = PassClient::from_env()?;
//!
//! let grant = client.get_object::<Grant>("42", &["pi"]).await?;
//!
//! let selector = PassClientSelector::<Submission>::new()
//!     .filter(rsql::has_member("grants", "42"))
//!     .limit(100);
//! let mut submissions = client.stream_objects(selector);
//! while let Some(submission) = submissions.next().await {
//!     println!("{:?}", submission?.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod rsql;
pub mod selector;
pub mod stream;

pub use client::{PassClient, JSON_API_MEDIA_TYPE};
pub use codec::JsonApiCodec;
pub use error::{PassClientError, Result};
pub use model::{Entity, EntityType, PassEntity};
pub use selector::{PassClientResult, PassClientSelector, DEFAULT_LIMIT};
pub use stream::PassObjectIter;
