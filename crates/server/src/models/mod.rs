//! Domain models for the cart-to-order lifecycle.
//!
//! `*Record` types are what storage hands back: identifiers and scalar
//! columns only. The unsuffixed types are the API views, with every item
//! reference resolved against the catalog.

pub mod cart;
pub mod item;
pub mod order;
pub mod user;

pub use cart::{Cart, CartLine, CartLineRecord, CartRecord};
pub use item::{Item, NewItem};
pub use order::{Order, OrderLine, OrderLineRecord, OrderRecord};
pub use user::{LoginResponse, User};
