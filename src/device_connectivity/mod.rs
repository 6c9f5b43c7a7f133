pub mod impl_fake;
pub mod impl_tcp_probe;
pub mod interface;
