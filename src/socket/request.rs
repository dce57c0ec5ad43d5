use std::fmt;

/// A request as it is written to the socket, before charset encoding.
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub host: &'a str,
    pub headers: &'a [(&'a str, String)],
    pub body: &'a str,
}

impl fmt::Display for HttpRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} HTTP/1.1", self.method, self.path)?;
        writeln!(f, "Host: {}", self.host)?;
        for (key, value) in self.headers {
            writeln!(f, "{}: {}", key, value)?;
        }
        writeln!(f)?;
        f.write_str(self.body)
    }
}
