pub mod common;

mod sensor_routes;
