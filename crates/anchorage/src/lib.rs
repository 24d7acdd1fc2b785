#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use anchorage_lie as lie;

#[doc(inline)]
pub use anchorage_3d as k3d;

#[doc(inline)]
pub use anchorage_ar as ar;
