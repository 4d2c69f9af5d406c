use rocket::launch;

#[launch]
fn rocket() -> _ {
    let rocket = customer_bulk_api::rocket();
    log::info!("starting customer bulk API");
    rocket
}
