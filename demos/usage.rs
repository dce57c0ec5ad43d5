use chrono::{Duration, Local};
use rust_pay_ccb::ccb::{DownloadBillRequest, GenerateBillRequest};
use rust_pay_ccb::{CcbClient, Configuration};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Configuration::builder()
        .merchant_id("your_merchant_id")
        .user_id("your_merchant_id-001")
        .password("your_password")
        .gateway_url("http://127.0.0.1:12345/")
        .bill_url("http://127.0.0.1:8080/")
        .charset("GB18030")
        .build()?;
    let client = CcbClient::new(Arc::new(cfg));

    let yesterday = Local::now().date_naive() - Duration::days(1);

    // step by step
    let generated = client.generate_bill(GenerateBillRequest::new(yesterday))?;
    println!("generate res: {:?}", generated);
    if let (true, Some(result)) = (generated.is_success(), generated.result) {
        let pushed = client.download_bill(DownloadBillRequest::new(result.file_name.as_str())?)?;
        println!("download res: {:?}", pushed);
        let path = client.download_bill_file(&result.file_name, Path::new("bills"))?;
        println!("bill file: {}", path.display());
    }

    // or all at once
    let bill = client.fetch_bill(yesterday, Path::new("bills"))?;
    println!("{}", serde_json::to_string_pretty(&bill)?);
    println!("detail total: {}", bill.detail_trade_amount_total());

    Ok(())
}
