use std::{net::TcpListener, sync::Arc};

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{dashboard_route, default_route, search_route},
    services::{RunRegistry, SearchRequestSender},
};

pub fn run(
    listener: TcpListener,
    registry: Arc<RunRegistry>,
    search_sender: SearchRequestSender,
) -> Result<Server, std::io::Error> {
    let registry = web::Data::from(registry);
    let search_sender = web::Data::new(search_sender);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/search")
                    .service(search_route::start_search)
                    .service(search_route::search_status)
                    .service(search_route::cancel_search),
            )
            .service(web::scope("/app").service(dashboard_route::dashboard))
            .app_data(registry.clone())
            .app_data(search_sender.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
