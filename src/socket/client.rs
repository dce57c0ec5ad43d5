use crate::config::Configuration;
use crate::errors::{PayError, Result};
use crate::socket::request::HttpRequest;
use crate::socket::scanner::{read_status_code, skip_headers};
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

const DOWNLOAD_CHUNK: usize = 8192;

/// Minimal HTTP/1.1 client over a raw `TcpStream`: one connection per call,
/// closed when the call returns.
pub struct SocketHttpClient {
    charset: &'static Encoding,
    timeout: Duration,
}

impl SocketHttpClient {
    pub fn new(charset: &'static Encoding, timeout: Duration) -> Self {
        Self { charset, timeout }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(cfg.charset, cfg.timeout)
    }

    pub fn post(&self, url: &str, headers: &[(&str, String)], body: &str) -> Result<String> {
        self.send("POST", url, headers, body)
    }

    /// Sends one request and returns the reply body as text.
    ///
    /// Fails with [`PayError::HttpStatus`] before reading any header when the
    /// status code is not 200.
    pub fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, String)],
        body: &str,
    ) -> Result<String> {
        let url = Url::parse(url)?;
        let stream = self.connect(&url)?;
        self.write_request(&stream, method, &url, headers, body)?;

        let mut reader = BufReader::new(stream);
        let status = read_status_code(&mut reader, self.charset)?;
        if status != 200 {
            return Err(PayError::HttpStatus(status));
        }
        self.read_body_text(&mut reader)
    }

    /// GETs `url` and streams the body verbatim into `target`.
    pub fn download_to_file(&self, url: &str, target: &Path) -> Result<PathBuf> {
        let url = Url::parse(url)?;
        let stream = self.connect(&url)?;
        let headers = [
            ("User-Agent", "Mozilla/5.0".to_string()),
            ("Connection", "close".to_string()),
        ];
        self.write_request(&stream, "GET", &url, &headers, "")?;

        let mut reader = BufReader::new(stream);
        let status = read_status_code(&mut reader, self.charset)?;
        if status != 200 {
            return Err(PayError::HttpStatus(status));
        }
        skip_headers(&mut reader)?;

        let mut file = File::create(target)?;
        let mut chunk = [0u8; DOWNLOAD_CHUNK];
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            file.write_all(&chunk[..n])?;
        }
        file.flush()?;
        Ok(target.to_path_buf())
    }

    fn connect(&self, url: &Url) -> Result<TcpStream> {
        let host = url.host_str().ok_or(url::ParseError::EmptyHost)?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| PayError::Config(format!("no port for url: {url}")))?;

        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .map(PayError::Io)
            .unwrap_or_else(|| PayError::NotFound(format!("no address for host: {host}"))))
    }

    fn write_request(
        &self,
        mut stream: &TcpStream,
        method: &str,
        url: &Url,
        headers: &[(&str, String)],
        body: &str,
    ) -> Result<()> {
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let request = HttpRequest {
            method,
            path: &path,
            host: url.host_str().unwrap_or_default(),
            headers,
            body,
        };
        debug!(method, url = %url, "socket request");

        let text = request.to_string();
        let (bytes, _, _) = self.charset.encode(&text);
        stream.write_all(&bytes)?;
        stream.flush()?;
        Ok(())
    }

    /// Skips header lines up to the first empty one and joins the remaining
    /// lines, each newline-terminated, with trailing whitespace trimmed.
    fn read_body_text<R: BufRead>(&self, reader: &mut R) -> Result<String> {
        let mut buf = Vec::new();
        let mut blank_found = false;
        while let Some(line) = self.read_line(reader, &mut buf)? {
            if line.is_empty() {
                blank_found = true;
                break;
            }
        }

        let mut body = String::new();
        if blank_found {
            while let Some(line) = self.read_line(reader, &mut buf)? {
                body.push_str(&line);
                body.push('\n');
            }
        }
        Ok(body.trim_end().to_string())
    }

    fn read_line<R: BufRead>(&self, reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
        buf.clear();
        if reader.read_until(b'\n', buf)? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let (line, _) = self.charset.decode_without_bom_handling(buf);
        Ok(Some(line.into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::{Shutdown, TcpListener};
    use std::thread;

    /// Serves `reply` to a single connection and hands back the request head.
    fn serve_once(reply: Vec<u8>, delay: Option<Duration>) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut first = String::new();
            reader.read_line(&mut first).unwrap();
            if let Some(d) = delay {
                thread::sleep(d);
            }
            let mut out = stream;
            let _ = out.write_all(&reply);
            let _ = out.flush();
            let _ = out.shutdown(Shutdown::Write);
            // drain the rest of the request so close() does not reset the peer
            let mut rest = Vec::new();
            let _ = reader.read_to_end(&mut rest);
            first
        });
        (format!("http://{addr}"), handle)
    }

    fn reply(status: &str, body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    fn client() -> SocketHttpClient {
        SocketHttpClient::new(encoding_rs::UTF_8, Duration::from_secs(5))
    }

    #[test]
    fn test_post_returns_body() {
        let (base, handle) = serve_once(reply("200 OK", "POST request received\n\n"), None);
        let headers = [("Content-Type", "application/json".to_string())];
        let body = client()
            .post(&format!("{base}/post"), &headers, r#"{"message": "hi"}"#)
            .unwrap();
        assert_eq!(body, "POST request received");
        assert_eq!(handle.join().unwrap().trim_end(), "POST /post HTTP/1.1");
    }

    #[test]
    fn test_post_multiline_body() {
        let (base, _h) = serve_once(reply("200 OK", "<TX>\r\n  <A>1</A>\r\n</TX>\r\n"), None);
        let body = client().post(&format!("{base}/gw"), &[], "x").unwrap();
        assert_eq!(body, "<TX>\n  <A>1</A>\n</TX>");
    }

    #[test]
    fn test_post_query_is_forwarded() {
        let (base, handle) = serve_once(reply("200 OK", "ok"), None);
        client().post(&format!("{base}/app/x?CCB_IBSVersion=V6"), &[], "").unwrap();
        assert_eq!(handle.join().unwrap().trim_end(), "POST /app/x?CCB_IBSVersion=V6 HTTP/1.1");
    }

    #[test]
    fn test_post_non_200_fails() {
        let (base, _h) = serve_once(reply("500 Internal Server Error", "oops"), None);
        let err = client().post(&format!("{base}/post"), &[], "").unwrap_err();
        assert!(matches!(err, PayError::HttpStatus(500)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_post_without_blank_line_yields_empty_body() {
        let (base, _h) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n".to_vec(), None);
        let body = client().post(&format!("{base}/post"), &[], "").unwrap();
        assert_eq!(body, "");
    }

    #[test]
    fn test_post_decodes_gb18030() {
        let (encoded, _, _) = encoding_rs::GB18030.encode("<RETURN_MSG>成功</RETURN_MSG>");
        let mut raw = b"HTTP/1.1 200 OK\r\n\r\n".to_vec();
        raw.extend_from_slice(&encoded);
        let (base, _h) = serve_once(raw, None);
        let gb = SocketHttpClient::new(encoding_rs::GB18030, Duration::from_secs(5));
        let body = gb.post(&format!("{base}/gw"), &[], "").unwrap();
        assert_eq!(body, "<RETURN_MSG>成功</RETURN_MSG>");
    }

    #[test]
    fn test_download_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("test.txt");
        let (base, handle) = serve_once(reply("200 OK", "Hello, World!"), None);
        let path = client()
            .download_to_file(&format!("{base}/download"), &target)
            .unwrap();
        assert_eq!(path, target);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello, World!");
        assert_eq!(handle.join().unwrap().trim_end(), "GET /download HTTP/1.1");
    }

    #[test]
    fn test_download_404_fails_without_creating_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("test.txt");
        let (base, _h) = serve_once(reply("404 Not Found", ""), None);
        let err = client()
            .download_to_file(&format!("{base}/not-found"), &target)
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(!target.exists());
    }

    #[test]
    fn test_download_skips_garbage_before_status() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("test.txt");
        let mut raw = b"Invalid data before\r\n".to_vec();
        raw.extend(reply("200 OK", "Hello, World!"));
        let (base, _h) = serve_once(raw, None);
        client()
            .download_to_file(&format!("{base}/invalid"), &target)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_download_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("large.txt");
        let content = "a".repeat(1024 * 1024);
        let (base, _h) = serve_once(reply("200 OK", &content), None);
        client()
            .download_to_file(&format!("{base}/large-file"), &target)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), content);
    }

    #[test]
    fn test_download_binary_body_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bin.zip");
        let payload: Vec<u8> = (0..=255u8).chain([b'\r', b'\n', b'\r', b'\n']).collect();
        let mut raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\r\n".to_vec();
        raw.extend_from_slice(&payload);
        let (base, _h) = serve_once(raw, None);
        client()
            .download_to_file(&format!("{base}/bin.zip"), &target)
            .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), payload);
    }

    #[test]
    fn test_download_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("empty.txt");
        let (base, _h) = serve_once(reply("200 OK", ""), None);
        client()
            .download_to_file(&format!("{base}/empty"), &target)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "");
    }

    #[test]
    fn test_download_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("slow.txt");
        let (base, _h) = serve_once(reply("200 OK", "late"), Some(Duration::from_secs(2)));
        let slow = SocketHttpClient::new(encoding_rs::UTF_8, Duration::from_millis(300));
        let err = slow
            .download_to_file(&format!("{base}/timeout"), &target)
            .unwrap_err();
        assert!(matches!(err, PayError::Io(_)));
    }

    #[test]
    fn test_connection_refused_propagates() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client().post(&format!("http://{addr}/"), &[], "").unwrap_err();
        assert!(matches!(err, PayError::Io(_)));
    }
}
