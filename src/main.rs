use actix_web::{web, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use moefile::{
    config::{AppConfig, APP_NAME, APP_VERSION},
    root_fs::RootFs,
    routes,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            env_logger::init_from_env(Env::default().default_filter_or("info"));
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    env_logger::init_from_env(Env::default().default_filter_or(config.default_log_filter()));

    let root = match RootFs::open(&config.root_path) {
        Ok(root) => root,
        Err(e) => {
            error!("Cannot serve root directory: {}", e);
            std::process::exit(1);
        }
    };

    info!("{} v{} ({:?})", APP_NAME, APP_VERSION, config.mode);
    info!("Server name: {}", config.server_name);
    info!("Serving root: {}", root.root().display());
    info!("Listening on: http://{}", config.listen_addr);
    info!("Allowed origins: {:?}", config.allowed_origins);

    let listen_addr = config.listen_addr;
    let config = web::Data::new(config);
    let root = web::Data::new(root);
    HttpServer::new(move || routes::create_app(config.clone(), root.clone()))
        .bind(listen_addr)?
        .run()
        .await
}
