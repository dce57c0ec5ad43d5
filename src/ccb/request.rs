use crate::config::Configuration;
use crate::errors::{PayError, Result};
use crate::utils::gen_request_sn;
use chrono::NaiveDate;
use quick_xml::escape::escape;
use std::fmt;

pub const LANGUAGE_CN: &str = "CN";

/// Ordered `TX_INFO` children. Absent values are never stored, so they never
/// show up as empty elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxInfo {
    fields: Vec<(&'static str, String)>,
}

impl TxInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key`, or overwrites it in place if already present.
    pub fn put(self, key: &'static str, value: impl fmt::Display) -> Self {
        self.put_opt(key, Some(value))
    }

    /// Like [`TxInfo::put`], but `None` leaves the list untouched.
    pub fn put_opt(mut self, key: &'static str, value: Option<impl fmt::Display>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            match self.fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => self.fields.push((key, value)),
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 流水类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillKind {
    /// 未结流水
    Unsettled = 0,
    /// 已结流水
    #[default]
    Settled = 1,
}

impl TryFrom<u8> for BillKind {
    type Error = PayError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BillKind::Unsettled),
            1 => Ok(BillKind::Settled),
            other => Err(PayError::Validation(format!(
                "kind must be either 0 (unsettled) or 1 (settled), got {other}"
            ))),
        }
    }
}

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillFileType {
    #[default]
    Txt = 1,
    Excel = 2,
    TxtAndExcel = 3,
}

impl TryFrom<u8> for BillFileType {
    type Error = PayError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(BillFileType::Txt),
            2 => Ok(BillFileType::Excel),
            3 => Ok(BillFileType::TxtAndExcel),
            other => Err(PayError::Validation(format!(
                "file type must be between 1 and 3, got {other}"
            ))),
        }
    }
}

/// 5W1005 生成对账单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateBillRequest {
    pub date: NaiveDate,
    pub kind: BillKind,
    pub file_type: BillFileType,
}

impl GenerateBillRequest {
    pub const TX_CODE: &'static str = "5W1005";

    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            kind: BillKind::default(),
            file_type: BillFileType::default(),
        }
    }

    /// Builds a request from the raw gateway codes, rejecting out-of-range values.
    pub fn try_new(date: NaiveDate, kind: u8, file_type: u8) -> Result<Self> {
        Ok(Self {
            date,
            kind: BillKind::try_from(kind)?,
            file_type: BillFileType::try_from(file_type)?,
        })
    }

    pub fn with_kind(mut self, kind: BillKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_file_type(mut self, file_type: BillFileType) -> Self {
        self.file_type = file_type;
        self
    }

    fn tx_info(&self) -> TxInfo {
        TxInfo::new()
            .put("DATE", self.date.format("%Y%m%d"))
            .put("KIND", self.kind as u8)
            .put("FILETYPE", self.file_type as u8)
    }
}

/// 6W0111 将对账单下载到外联客户端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadBillRequest {
    pub file_name: String,
}

impl DownloadBillRequest {
    pub const TX_CODE: &'static str = "6W0111";
    pub const FILE_PATH: &'static str = "merchant/shls";
    pub const LOCAL_REMOTE: u8 = 0;

    pub fn new(file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(PayError::Validation("file name must not be empty".into()));
        }
        Ok(Self { file_name })
    }

    fn tx_info(&self) -> TxInfo {
        TxInfo::new()
            .put("SOURCE", self.file_name.as_str())
            .put("FILEPATH", Self::FILE_PATH)
            .put("LOCAL_REMOTE", Self::LOCAL_REMOTE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxRequest {
    GenerateBill(GenerateBillRequest),
    DownloadBill(DownloadBillRequest),
}

impl TxRequest {
    pub fn tx_code(&self) -> &'static str {
        match self {
            TxRequest::GenerateBill(_) => GenerateBillRequest::TX_CODE,
            TxRequest::DownloadBill(_) => DownloadBillRequest::TX_CODE,
        }
    }

    pub fn tx_info(&self) -> TxInfo {
        match self {
            TxRequest::GenerateBill(r) => r.tx_info(),
            TxRequest::DownloadBill(r) => r.tx_info(),
        }
    }
}

impl From<GenerateBillRequest> for TxRequest {
    fn from(r: GenerateBillRequest) -> Self {
        TxRequest::GenerateBill(r)
    }
}

impl From<DownloadBillRequest> for TxRequest {
    fn from(r: DownloadBillRequest) -> Self {
        TxRequest::DownloadBill(r)
    }
}

/// Outbound envelope: a transaction plus the per-call serial number.
#[derive(Debug, Clone)]
pub struct Request {
    pub request_sn: String,
    pub language: String,
    pub tx: TxRequest,
}

impl Request {
    pub fn new(tx: impl Into<TxRequest>) -> Self {
        Self {
            request_sn: gen_request_sn(),
            language: LANGUAGE_CN.to_string(),
            tx: tx.into(),
        }
    }

    pub fn with_request_sn(mut self, request_sn: impl Into<String>) -> Self {
        self.request_sn = request_sn.into();
        self
    }

    pub fn tx_code(&self) -> &'static str {
        self.tx.tx_code()
    }

    /// Wire form, password in clear.
    pub fn to_xml(&self, cfg: &Configuration) -> String {
        self.render(cfg, &cfg.password)
    }

    /// Same document with the password masked, for logging.
    pub fn to_masked_xml(&self, cfg: &Configuration) -> String {
        self.render(cfg, "****")
    }

    fn render(&self, cfg: &Configuration, password: &str) -> String {
        let mut out = format!(
            "<?xml version=\"1.0\" encoding=\"{}\" standalone=\"yes\" ?>\n<TX>\n",
            cfg.charset_name()
        );
        element(&mut out, "  ", "REQUEST_SN", &self.request_sn);
        element(&mut out, "  ", "CUST_ID", &cfg.merchant_id);
        element(&mut out, "  ", "USER_ID", &cfg.user_id);
        element(&mut out, "  ", "PASSWORD", password);
        element(&mut out, "  ", "TX_CODE", self.tx_code());
        element(&mut out, "  ", "LANGUAGE", &self.language);
        out.push_str("  <TX_INFO>\n");
        for (key, value) in self.tx.tx_info().iter() {
            element(&mut out, "    ", key, value);
        }
        out.push_str("  </TX_INFO>\n</TX>");
        out
    }
}

fn element(out: &mut String, indent: &str, name: &str, value: &str) {
    out.push_str(indent);
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}
