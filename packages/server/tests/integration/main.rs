mod postgres;
mod profile;
mod resource;
