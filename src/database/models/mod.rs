pub mod category;
pub mod collection;
pub mod item;
pub mod user;

pub use category::{Category, NewCategory};
pub use collection::{Collection, CollectionUpdate, NewCollection};
pub use item::{Item, ItemUpdate, NewItem};
pub use user::{ProfileUpdate, UserProfile, BIRTH_DATE_FORMAT};
