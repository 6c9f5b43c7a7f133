pub mod impl_fake;
pub mod impl_watson;
pub mod interface;
