//! 对账单文件解析
//!
//! Layout of the settlement report text file (tab separated):
//!
//! 1. summary line, each field written as `label[value]`
//! 2. header row, ignored
//! 3. one detail record per non-blank line, at least 15 fields

use crate::errors::{PayError, Result};
use chrono::NaiveDateTime;
use encoding_rs::Encoding;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SUMMARY_FIELDS: usize = 6;
const DETAIL_FIELDS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub summary: BillSummary,
    pub details: Vec<BillDetail>,
}

impl Bill {
    /// Sum of `trade_amount` over all details, for reconciling against the summary.
    pub fn detail_trade_amount_total(&self) -> Decimal {
        self.details.iter().map(|d| d.trade_amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillSummary {
    /// 出单日期
    pub bill_date: String,
    /// 交易日期
    pub trade_date: String,
    /// 交易笔数
    pub trade_count: u32,
    /// 交易金额
    pub trade_amount: Decimal,
    /// 手续费
    pub fee: Decimal,
    /// 结算金额
    pub settle_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillDetail {
    /// 交易时间
    pub trade_time: NaiveDateTime,
    /// 记账日期
    pub account_date: String,
    /// 银行流水号
    pub bank_serial: String,
    /// 商户流水号
    pub merchant_serial: String,
    /// 订单号
    pub order_no: String,
    /// 订单状态
    pub status: String,
    /// 付款方账号
    pub payer_account: String,
    /// 付款方户名
    pub payer_name: String,
    /// 订单金额
    pub order_amount: Decimal,
    /// 交易金额
    pub trade_amount: Decimal,
    /// 手续费
    pub fee: Decimal,
    /// 结算金额
    pub settle_amount: Decimal,
    /// 柜台代码
    pub counter_code: String,
    /// 发卡行/通道
    pub channel: String,
    /// 支付卡种
    pub card_type: String,
}

pub struct BillParser;

impl BillParser {
    /// Parses a UTF-8 report file.
    pub fn parse(path: impl AsRef<Path>) -> Result<Bill> {
        let text = fs::read_to_string(path)?;
        Self::parse_str(&text)
    }

    /// Parses a report file stored in `charset`.
    pub fn parse_with_charset(path: impl AsRef<Path>, charset: &'static Encoding) -> Result<Bill> {
        let bytes = fs::read(path)?;
        let (text, _, _) = charset.decode(&bytes);
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Bill> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 2 {
            return Err(PayError::format("bill file must have at least 2 lines"));
        }

        let summary = parse_summary(lines[0])?;
        let details = lines[2..]
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_detail(line))
            .collect::<Result<Vec<_>>>()?;

        Ok(Bill { summary, details })
    }
}

fn parse_summary(line: &str) -> Result<BillSummary> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SUMMARY_FIELDS {
        return Err(PayError::format(format!("invalid summary line: {line}")));
    }

    let bill_date = extract_value(fields[0])?.to_string();
    let trade_date = extract_value(fields[1])?.to_string();
    let count = extract_value(fields[2])?;
    Ok(BillSummary {
        bill_date,
        trade_date,
        trade_count: count
            .parse()
            .map_err(|_| PayError::format(format!("invalid trade count: {count}")))?,
        trade_amount: parse_amount(extract_value(fields[3])?)?,
        fee: parse_amount(extract_value(fields[4])?)?,
        settle_amount: parse_amount(extract_value(fields[5])?)?,
    })
}

fn parse_detail(line: &str) -> Result<BillDetail> {
    let f: Vec<&str> = line.split('\t').collect();
    if f.len() < DETAIL_FIELDS {
        return Err(PayError::format(format!("invalid detail line: {line}")));
    }

    Ok(BillDetail {
        trade_time: NaiveDateTime::parse_from_str(f[0], DATE_TIME_FORMAT)
            .map_err(|_| PayError::format(format!("invalid trade time: {}", f[0])))?,
        account_date: f[1].to_string(),
        bank_serial: f[2].to_string(),
        merchant_serial: f[3].to_string(),
        order_no: f[4].to_string(),
        status: f[5].to_string(),
        payer_account: f[6].to_string(),
        payer_name: f[7].to_string(),
        order_amount: parse_amount(f[8])?,
        trade_amount: parse_amount(f[9])?,
        fee: parse_amount(f[10])?,
        settle_amount: parse_amount(f[11])?,
        counter_code: f[12].to_string(),
        channel: f[13].to_string(),
        card_type: f[14].to_string(),
    })
}

/// `交易金额[100.00]` -> `100.00`
fn extract_value(field: &str) -> Result<&str> {
    match (field.find('['), field.find(']')) {
        (Some(start), Some(end)) if end > start + 1 => Ok(&field[start + 1..end]),
        _ => Err(PayError::format(format!("invalid field format: {field}"))),
    }
}

fn parse_amount(text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim()).map_err(|_| PayError::format(format!("invalid amount: {text}")))
}
