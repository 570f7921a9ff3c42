//! openapi-from-annotations - OpenAPI 3 documents from annotated Rust handlers.
//!
//! Handlers describe themselves with `@` lines in their doc comments:
//!
//! ```text
//! /// @Summary Create a user
//! /// @Param user body CreateUser true "New user"
//! /// @Header CommonHeaders Authorization
//! /// @Success 201 {object} User "Created"
//! /// @Router /users [post]
//! pub async fn create_user() {}
//! ```
//!
//! Types named in the annotations are looked up in the project's sources and
//! registered once as component schemas, even when they refer to each other.
//!
//! # Architecture
//!
//! 1. [`annotation`] - Tokenizes annotation lines into tags
//! 2. [`loader`] - Indexes a project's packages and parses them with `syn`
//! 3. [`registry`] - Assigns component names to types, one per type
//! 4. [`schema`] - Resolves Rust types into schemas
//! 5. [`operation`] - Applies tags to an operation
//! 6. [`generator`] - Builds the whole document
//! 7. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_annotations::generator::DocumentGenerator;
//! use openapi_from_annotations::serializer::serialize_yaml;
//! use std::path::PathBuf;
//!
//! let document = DocumentGenerator::new(PathBuf::from("./my-project"))
//!     .with_info(Some("My API".to_string()), None)
//!     .build()
//!     .unwrap();
//!
//! let yaml = serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod annotation;
pub mod cli;
pub mod error;
pub mod generator;
pub mod loader;
pub mod openapi;
pub mod operation;
pub mod registry;
pub mod schema;
pub mod serializer;
