pub mod consts;
pub mod ica;
pub mod msg;
pub mod types;
