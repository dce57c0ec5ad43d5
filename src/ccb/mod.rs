pub mod archive;
pub mod bill;
pub mod client;
pub mod request;
pub mod response;

pub use bill::{Bill, BillDetail, BillParser, BillSummary};
pub use client::CcbClient;
pub use request::{BillFileType, BillKind, DownloadBillRequest, GenerateBillRequest, Request};
pub use response::{DownloadBillResponse, GenerateBillResponse, Response};
