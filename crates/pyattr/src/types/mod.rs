pub mod class;
pub mod host_object;
pub mod member;
pub mod method;
pub mod property;
pub mod r#type;

pub use class::{AttrMap, ClassBuilder, ClassObject, Instance};
pub use host_object::{AccessorKind, HostAccessor, HostField, HostObject};
pub use member::{Member, MemberKind};
pub use method::{BoundMethod, StaticMethod};
pub use property::UserProperty;
pub use r#type::Type;
