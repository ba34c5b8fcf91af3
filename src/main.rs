#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pricewise_lib::run().await
}
