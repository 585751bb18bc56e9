mod atom;
mod computed;
mod equality;
mod error;
pub mod hook;
mod id_map;
mod lookable;
mod observable;
mod patch;
mod publisher;
mod store;
mod stream;
mod subscription;

pub use atom::*;
pub use computed::*;
pub use equality::*;
pub use error::*;
pub use id_map::*;
pub use lookable::*;
pub use observable::*;
pub use patch::*;
pub use publisher::*;
pub use store::*;
pub use stream::*;
pub use subscription::*;
