use actix_web::web::{self, Data, FormConfig, JsonConfig, PathConfig, QueryConfig};
use actix_web::{App, HttpServer, ResponseError};
use mongodb::Client;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;

pub mod campaign;
pub mod config;
pub mod database;
pub mod engagement;
pub mod error;
pub mod landing;
pub mod mailer;
pub mod payment;
pub mod qr;
pub mod reset;
pub mod seed;
pub mod space;
pub mod typedid;
pub mod user;
pub mod utils;

use config::Config;
use database::{Database, MongoDatabase};
use error::Error;
use mailer::Mailer;
use payment::gateway::PaymentGateway;

pub async fn run(config: Config) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    info!("loaded config: {:?}", config);

    info!("connecting to db: {}", config.mongodb_uri);
    let db = Client::with_uri_str(&config.mongodb_uri)
        .await?
        .database(&config.database_name);
    let db = MongoDatabase::initialize(db).await?;

    if config.seed_demo_data {
        seed::seed(&db).await?;
    }

    let db: Data<Box<dyn Database>> = Data::new(Box::new(db) as Box<dyn Database>);
    let mailer: Data<Box<dyn Mailer>> = Data::new(mailer::from_config(config.mail.clone()));
    let gateway: Data<Option<PaymentGateway>> =
        Data::new(config.payment.clone().map(PaymentGateway::new));
    let bind_address = config.bind_address.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(JsonConfig::default().error_handler(|err, _req| {
                // format json errors with custom format
                Error::InvalidJson(err).into()
            }))
            .app_data(PathConfig::default().error_handler(|err, _req| {
                // format path errors with custom format
                Error::InvalidPath(err).into()
            }))
            .app_data(FormConfig::default().error_handler(|err, _req| {
                // format form errors with custom format
                Error::InvalidForm(err).into()
            }))
            .app_data(QueryConfig::default().error_handler(|err, _req| {
                // format query errors with custom format
                Error::InvalidQuery(err).into()
            }))
            .app_data(db.clone())
            .app_data(mailer.clone())
            .app_data(gateway.clone())
            .app_data(config.clone())
            .wrap(TracingLogger::default())
            .service(qr::endpoints::get_campaign_for_code)
            .service(qr::endpoints::take_action_for_code)
            .service(space::endpoints::create_space)
            .service(space::endpoints::get_spaces)
            .service(space::endpoints::get_space_by_id)
            .service(campaign::endpoints::create_campaign_in_space)
            .service(campaign::endpoints::get_campaigns_in_space)
            .service(campaign::endpoints::get_campaign_by_id)
            .service(campaign::endpoints::update_campaign_status)
            .service(campaign::endpoints::get_events_for_campaign)
            .service(campaign::endpoints::reconcile_campaign_counters)
            .service(user::endpoints::create_user)
            .service(user::endpoints::get_user_by_id)
            .service(reset::endpoints::request_password_reset)
            .service(reset::endpoints::confirm_password_reset)
            .service(payment::endpoints::create_payment_order)
            .service(payment::endpoints::verify_payment)
            .default_service(web::to(|| async { Error::PathNotFound.error_response() }))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
