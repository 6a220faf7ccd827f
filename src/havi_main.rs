use anyhow::Result;

use havi::app::run;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    run().await
}
