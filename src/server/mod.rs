pub mod sensor_routes;
pub mod server;
