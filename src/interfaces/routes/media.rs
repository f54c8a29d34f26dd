use actix_web::web;

use crate::handlers::media;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/media")
            .service(
                web::resource("")
                    .route(web::get().to(media::list_media))
            )
            .service(
                web::resource("/single")
                    .route(web::post().to(media::upload_single))
            )
            .service(
                web::resource("/multiple")
                    .route(web::post().to(media::upload_multiple))
            )
            .service(
                web::resource("/{media_id}")
                    .route(web::get().to(media::get_media_by_id))
                    .route(web::patch().to(media::update_media))
                    .route(web::delete().to(media::delete_media))
            )
    );
}
