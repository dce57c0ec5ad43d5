use crate::errors::{PayError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const SUCCESS_CODE: &str = "000000";

/// Reply envelope. `result` holds the `TX_INFO` payload, whose shape depends
/// on the transaction that was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response<T> {
    #[serde(rename = "REQUEST_SN", default)]
    pub request_sn: String,
    #[serde(rename = "CUST_ID", default)]
    pub cust_id: String,
    #[serde(rename = "TX_CODE", default)]
    pub tx_code: String,
    #[serde(rename = "RETURN_CODE", default)]
    pub return_code: String,
    #[serde(rename = "RETURN_MSG", default)]
    pub return_msg: String,
    #[serde(rename = "LANGUAGE", default)]
    pub language: String,
    #[serde(rename = "TX_INFO", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> Response<T> {
    /// 业务是否成功
    pub fn is_success(&self) -> bool {
        self.return_code == SUCCESS_CODE
    }
}

impl<T: DeserializeOwned> Response<T> {
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|e| PayError::Xml(e.to_string()))
    }
}

impl<T: Serialize> Response<T> {
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string_with_root("TX", self).map_err(|e| PayError::Xml(e.to_string()))
    }
}

/// 5W1005 TX_INFO
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateBillResult {
    #[serde(rename = "FILE_NAME", default)]
    pub file_name: String,
    #[serde(rename = "NOTICE", default)]
    pub notice: String,
}

/// 6W0111 carries nothing in TX_INFO beyond the envelope fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadBillResult {}

pub type GenerateBillResponse = Response<GenerateBillResult>;
pub type DownloadBillResponse = Response<DownloadBillResult>;
