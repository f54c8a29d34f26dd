use actix_web::web;

use crate::handlers::home::home;

mod json_error;
mod media;
mod system;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(system::config_routes)
            .configure(media::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
