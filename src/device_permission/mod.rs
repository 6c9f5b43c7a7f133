pub mod impl_desktop;
pub mod impl_fake;
pub mod interface;
