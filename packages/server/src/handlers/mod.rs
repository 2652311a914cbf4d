pub mod media;
pub mod profile;
pub mod resource;
pub mod settings;
