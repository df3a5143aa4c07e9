//! # Hybrid Router
//!
//! URL codec for stateful views. A *hybrid URL* is a bookmarkable mount path
//! with an optional compact suffix naming a live server-side instance:
//!
//! - `/shop/cart/item/42`: fresh view built from its parameters
//! - `/shop/cart/item/42.7`: instance 7, revision 0
//! - `/shop/cart/item/42.7.3`: instance 7, revision 3
//! - `/shop/cart/item/42.main.7.3`: same instance, living in scope `main`
//!
//! ## Guarantees
//!
//! - `decode(encode(t)) == t` for every target the codec produces
//! - numeric scope names never read back as instance ids (`..123`)
//! - literal `.` inside parameters is escaped, so the suffix is always found
//! - the trailing-slash shape of the first request survives the redirect
//!
//! ## Example
//!
//! ```
//! use hybrid_router::{
//!     LogicalTarget, MemoryInstanceStore, MountCodec, MountPoint, MountTable, RenderDecision,
//!     RouteRequest,
//! };
//!
//! let table = MountTable::new()
//!     .with_mount(MountCodec::new(MountPoint::new("/counter", "counter").unwrap()));
//! let store = MemoryInstanceStore::new();
//!
//! // Bookmarkable hit: build an instance, then redirect to its hybrid URL
//! let request = RouteRequest::new("/counter/start/5");
//! let codec = table.resolve(&request.path).unwrap();
//! let target = codec.decode(&request, &store).unwrap();
//! assert!(target.is_fresh());
//!
//! let instance = store.create("counter", None, true);
//! let decision = codec
//!     .redirect_policy()
//!     .on_instance_created(codec, &request.path, &target, &instance, &store)
//!     .unwrap();
//! assert_eq!(decision, RenderDecision::Redirect("/counter/start/5.1".to_string()));
//!
//! // Following the redirect resumes the instance
//! let target = table.decode(&RouteRequest::new("/counter/start/5.1"), &store).unwrap();
//! assert!(matches!(target, LogicalTarget::Resumed { instance_id: 1, .. }));
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod error;
pub mod escape;
pub mod instance_info;
pub mod mount;
pub mod params;
pub mod redirect;
pub mod store;
pub mod table;
pub mod target;

pub use config::{Config, ExpiredInstancePolicy, MountConfig, RoutingConfig, ServerConfig};
pub use error::RouteError;
pub use escape::{escape_segment, unescape_segment};
pub use instance_info::{extract_instance_info, Delimiters, ExtractionResult, InstanceInfo, InstanceRef};
pub use mount::{MountCodec, MountPoint};
pub use params::{ParameterCodec, PathPairCodec, ViewParameters};
pub use redirect::{RedirectPolicy, RenderDecision};
pub use store::{InstanceKey, InstanceMetadata, InstanceStore, MemoryInstanceStore, RedirectState};
pub use table::MountTable;
pub use target::{LogicalTarget, RouteRequest, ViewClass};
