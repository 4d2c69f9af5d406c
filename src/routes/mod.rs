//! HTTP route handlers, mounted under `/api/v1`.

pub mod admin;
pub mod customers;
pub mod guards;
pub mod health;

use rocket::Route;

/// Every always-on route. Admin routes are mounted separately.
pub fn api_routes() -> Vec<Route> {
    routes![
        health::health_check,
        customers::bulk_create_many,
        customers::create_many,
        customers::bulk_update_many,
        customers::update_many,
        customers::update_one,
        customers::create_one,
        customers::get_all,
        customers::get_one,
    ]
}
