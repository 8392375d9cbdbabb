//! XMLA client for mdxql
//!
//! Sends MDX statements to an XML for Analysis endpoint (SOAP over HTTP) and
//! hands the returned cellset to the mdxql decoder. `XmlaClient` implements
//! [`mdxql::Transport`], so it plugs straight into [`mdxql::Mdx`].
//!
//! # Example
//!
//! ```rust,no_run
//! use mdxql::{DimensionOptions, Mdx};
//! use xmla_client::XmlaClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = XmlaClientBuilder::new("http://localhost/olap/msmdpump.dll")
//!         .catalog("Adventure Works")
//!         .credentials("analyst", "secret")
//!         .build()?;
//!
//!     let mdx = Mdx::new("Adventure Works", client);
//!     let countries = mdx
//!         .get_dimension_data(vec!["[Geography].[Country]".to_string()], DimensionOptions::default())
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&countries)?);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;

pub use client::{XmlaClient, XmlaClientBuilder};
pub use protocol::{execute_envelope, parse_execute_response, ExecuteProperties, XmlaError};
