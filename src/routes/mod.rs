mod service;

pub use service::service_routes;
