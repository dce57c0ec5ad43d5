use crate::errors::{PayError, Result};
use encoding_rs::{Encoding, GB18030_INIT};
use std::fmt;
use std::time::Duration;

/// Charset the gateway expects on the wire.
pub static DEFAULT_CHARSET: &Encoding = &GB18030_INIT;
/// Connect and read timeout applied to every socket operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Configuration {
    pub merchant_id: String,
    pub user_id: String,
    pub password: String,
    /// 外联平台交易地址
    pub gateway_url: String,
    /// 外联客户端文件下载地址
    pub bill_url: String,
    pub charset: &'static Encoding,
    pub timeout: Duration,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Charset name as written into the XML declaration.
    pub fn charset_name(&self) -> String {
        self.charset.name().to_ascii_uppercase()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("merchant_id", &self.merchant_id)
            .field("user_id", &self.user_id)
            .field("password", &"****")
            .field("gateway_url", &self.gateway_url)
            .field("bill_url", &self.bill_url)
            .field("charset", &self.charset.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Default)]
pub struct ConfigurationBuilder {
    merchant_id: Option<String>,
    user_id: Option<String>,
    password: Option<String>,
    gateway_url: Option<String>,
    bill_url: Option<String>,
    charset: Option<String>,
    timeout: Option<Duration>,
}

impl ConfigurationBuilder {
    pub fn merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn gateway_url(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn bill_url(mut self, bill_url: impl Into<String>) -> Self {
        self.bill_url = Some(bill_url.into());
        self
    }

    /// Any WHATWG encoding label, e.g. `GB18030` or `utf-8`.
    pub fn charset(mut self, label: impl Into<String>) -> Self {
        self.charset = Some(label.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Configuration> {
        let merchant_id = self
            .merchant_id
            .ok_or_else(|| PayError::Config("merchant_id is required".into()))?;
        let user_id = self
            .user_id
            .ok_or_else(|| PayError::Config("user_id is required".into()))?;
        let password = self
            .password
            .ok_or_else(|| PayError::Config("password is required".into()))?;
        let gateway_url = self
            .gateway_url
            .ok_or_else(|| PayError::Config("gateway_url is required".into()))?;
        let bill_url = self
            .bill_url
            .ok_or_else(|| PayError::Config("bill_url is required".into()))?;

        let charset = match self.charset {
            Some(label) => Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| PayError::Config(format!("unsupported charset: {label}")))?,
            None => DEFAULT_CHARSET,
        };
        // UTF-16 and `replacement` encode as UTF-8, which would contradict the XML declaration.
        if charset.output_encoding() != charset {
            return Err(PayError::Config(format!(
                "charset {} cannot be used for encoding",
                charset.name()
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(PayError::Config("timeout must be greater than zero".into()));
        }

        Ok(Configuration {
            merchant_id,
            user_id,
            password,
            gateway_url,
            bill_url,
            charset,
            timeout,
        })
    }
}
