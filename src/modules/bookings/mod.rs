pub mod controller;
pub mod lifecycle;
pub mod router;
pub mod service;
pub mod store;
