use crate::ccb::archive::extract_specific_file;
use crate::ccb::bill::{Bill, BillParser};
use crate::ccb::request::{DownloadBillRequest, GenerateBillRequest, Request};
use crate::ccb::response::{DownloadBillResponse, GenerateBillResponse, Response};
use crate::config::Configuration;
use crate::errors::{PayError, Result};
use crate::socket::SocketHttpClient;
use crate::utils::{retry_linear, url_encode};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DOWNLOAD_ATTEMPTS: usize = 3;
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// 建行外联平台客户端
pub struct CcbClient {
    cfg: Arc<Configuration>,
    http: SocketHttpClient,
    download_attempts: usize,
    download_retry_delay: Duration,
}

impl CcbClient {
    pub fn new(cfg: Arc<Configuration>) -> Self {
        let http = SocketHttpClient::from_config(&cfg);
        Self {
            cfg,
            http,
            download_attempts: DOWNLOAD_ATTEMPTS,
            download_retry_delay: DOWNLOAD_RETRY_DELAY,
        }
    }

    /// Overrides the bill-file download retry policy (3 attempts, 2s base by default).
    pub fn with_download_retry(mut self, attempts: usize, base_delay: Duration) -> Self {
        self.download_attempts = attempts;
        self.download_retry_delay = base_delay;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.cfg
    }

    /// 5W1005 生成对账单. A non-`000000` return code comes back as `Ok`.
    pub fn generate_bill(&self, request: GenerateBillRequest) -> Result<GenerateBillResponse> {
        let xml = self.send_to_gateway(&Request::new(request))?;
        Response::from_xml(&xml)
    }

    /// 6W0111 将对账单文件下载到外联客户端
    pub fn download_bill(&self, request: DownloadBillRequest) -> Result<DownloadBillResponse> {
        let xml = self.send_to_gateway(&Request::new(request))?;
        Response::from_xml(&xml)
    }

    /// 从外联客户端下载账单文件到本地, 失败重试
    pub fn download_bill_file(&self, file_name: &str, target_dir: &Path) -> Result<PathBuf> {
        let url = bill_file_url(&self.cfg, file_name);
        let local_name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| PayError::Validation(format!("invalid bill file name: {file_name}")))?;
        fs::create_dir_all(target_dir)?;
        let target = target_dir.join(local_name);

        debug!(url = %url, "downloading bill file");
        let path = retry_linear(self.download_attempts, self.download_retry_delay, |_| {
            self.http.download_to_file(&url, &target)
        })
        .inspect_err(|_| {
            if target.exists() {
                let _ = fs::remove_file(&target);
            }
        })?;
        debug!(path = %path.display(), "downloaded bill file");
        Ok(path)
    }

    /// Runs the whole chain for one day: generate, push to the file host,
    /// fetch, unzip when needed, parse. Business failures become
    /// [`PayError::Gateway`] here.
    pub fn fetch_bill(&self, date: NaiveDate, work_dir: &Path) -> Result<Bill> {
        let generated = self.generate_bill(GenerateBillRequest::new(date))?;
        ensure_success(&generated)?;
        let file_name = generated
            .result
            .map(|r| r.file_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PayError::Gateway {
                code: generated.return_code.clone(),
                message: "reply carries no FILE_NAME".into(),
            })?;
        info!(file = %file_name, "bill generated");

        let pushed = self.download_bill(DownloadBillRequest::new(file_name.as_str())?)?;
        ensure_success(&pushed)?;

        let local = self.download_bill_file(&file_name, work_dir)?;
        let text_file = if is_zip(&file_name) {
            extract_specific_file(&local, &bill_member_name(&file_name), work_dir)?
        } else {
            local
        };
        info!(path = %text_file.display(), "parsing bill file");
        BillParser::parse(&text_file)
    }

    fn send_to_gateway(&self, request: &Request) -> Result<String> {
        let xml = request.to_xml(&self.cfg);
        debug!(tx_code = request.tx_code(), "CCB_EBS_Request: {}", request.to_masked_xml(&self.cfg));

        let params = format!("requestXml={}", url_encode(&xml, self.cfg.charset));
        let headers = [
            ("Content-Type", "application/x-www-form-urlencoded".to_string()),
            ("Content-Length", params.len().to_string()),
            ("Connection", "close".to_string()),
        ];
        let response = self.http.post(&self.cfg.gateway_url, &headers, &params)?;
        debug!(tx_code = request.tx_code(), "CCB_EBS_Response: {}", response);
        Ok(response)
    }
}

fn ensure_success<T>(resp: &Response<T>) -> Result<()> {
    if resp.is_success() {
        Ok(())
    } else {
        Err(PayError::Gateway {
            code: resp.return_code.clone(),
            message: resp.return_msg.clone(),
        })
    }
}

fn bill_file_url(cfg: &Configuration, file_name: &str) -> String {
    format!(
        "{}/{}",
        cfg.bill_url.trim_end_matches('/'),
        url_encode(file_name, cfg.charset)
    )
}

fn is_zip(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// `SHOP.<merchant>.<date>.<date>.<stamp>.<tag>.zip` holds `SHOP.<merchant>.<date>.txt`.
fn bill_member_name(zip_name: &str) -> String {
    let parts: Vec<&str> = zip_name.split('.').take(3).collect();
    format!("{}.txt", parts.join("."))
}
