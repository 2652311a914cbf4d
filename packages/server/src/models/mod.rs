pub mod profile;
pub mod resource;
pub mod shared;
