use actix_web::web;

pub mod shifts;
pub mod weeks;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .configure(shifts::configure)
            .configure(weeks::configure),
    );
}
