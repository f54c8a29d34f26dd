use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Media service is running",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "media": "/api/v1/media",
            "upload_single": "/api/v1/media/single",
            "upload_multiple": "/api/v1/media/multiple",
            "health": "/api/v1/health"
        }
    }))
}
