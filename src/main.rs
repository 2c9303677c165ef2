use blookmyspace::config::Config;
use blookmyspace::error::Error;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    blookmyspace::run(config).await
}
