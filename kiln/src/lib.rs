//! # kiln
//!
//! Deployment assembly and bootstrap for dependency injection containers.
//!
//! A [`ContainerBuilder`] accumulates the description of a deployment: bean
//! classes, scanned packages, enablement lists, extensions, properties and
//! programmatically defined beans or type overrides. Initializing it merges
//! the declared ("synthetic") elements with the discovered ones, validates
//! the result and freezes it into a [`DeploymentModel`] owned by a live
//! [`Container`].
//!
//! ## Core Concepts
//!
//! - **ClassRef**: Opaque descriptor of a type, compared by name and loader
//! - **ContainerBuilder**: Single-use accumulator of configuration calls
//! - **Environment**: Host capabilities such as package scanning
//! - **ContainerRegistry**: Identifiers held by live containers
//! - **Container**: The assembled deployment, released on shutdown
//!
//! ## Basic Usage
//!
//! ```rust
//! use kiln::{BeanType, ClassRef, Container};
//!
//! struct Repository;
//!
//! impl BeanType for Repository {}
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = Container::builder()
//!         .disable_discovery()?
//!         .add_bean_class(ClassRef::of::<Repository>())?
//!         .initialize()
//!         .await?;
//!
//!     assert!(container.select(&ClassRef::of::<Repository>()).is_some());
//!     container.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Discovery
//!
//! With discovery enabled (the default) the builder asks its [`Environment`]
//! to scan every requested package and every bean archive visible to the
//! class loader:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kiln::{ClassRef, Container, Origin, BeanSource, StaticEnvironment};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let environment = Arc::new(StaticEnvironment::new());
//! let loader = environment_loader();
//! environment
//!     .add_class(ClassRef::new("app::web::Handler", loader.clone()))
//!     .add_class(ClassRef::new("app::web::api::Routes", loader.clone()));
//!
//! let container = Container::builder()
//!     .set_environment(environment.clone())?
//!     .add_package(true, ClassRef::new("app::web::Main", loader.clone()))?
//!     .initialize()
//!     .await?;
//!
//! assert!(container.model().sources().iter().all(|v| matches!(
//!     v,
//!     BeanSource::Class { origin: Origin::Discovered, .. }
//! )));
//! # Ok(())
//! # }
//! # fn environment_loader() -> kiln::ClassLoader { kiln::ClassLoader::system() }
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables `#[derive(BeanType)]`

mod annotated;
mod assembly;
mod bean;
mod builder;
mod class;
mod container;
mod environment;
mod error;
mod list;
mod model;
mod properties;
mod registry;

pub use annotated::*;
pub use bean::*;
pub use builder::*;
pub use class::*;
pub use container::*;
pub use environment::Environment;
pub use environment::StaticEnvironment;
pub use error::*;
pub use list::*;
pub use model::*;
pub use properties::*;
pub use registry::*;

#[cfg(feature = "macros")]
pub use kiln_macros::*;
