use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

/// Serves one scripted reply per connection, in order, and records each
/// request it received (head plus body).
pub struct MockServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl MockServer {
    pub fn start(replies: Vec<Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for reply in replies {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut BufReader::new(stream.try_clone().unwrap())));
                stream.write_all(&reply).unwrap();
                let _ = stream.shutdown(Shutdown::Write);
            }
            seen
        });
        Self { addr, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Waits for every scripted reply to be served.
    pub fn requests(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn read_request<R: Read>(reader: &mut BufReader<R>) -> String {
    let mut head = String::new();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line.trim_end().is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap();
        }
        head.push_str(&line);
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();
    format!("{head}\n{}", String::from_utf8_lossy(&body))
}

pub fn http_ok(body: &[u8]) -> Vec<u8> {
    let mut reply = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n".to_vec();
    reply.extend_from_slice(body);
    reply
}

pub fn http_status(code: u16, reason: &str) -> Vec<u8> {
    format!("HTTP/1.1 {code} {reason}\r\nContent-Length: 0\r\n\r\n").into_bytes()
}

/// Gateway replies travel in GB18030.
pub fn gateway_reply(xml: &str) -> Vec<u8> {
    let (bytes, _, _) = encoding_rs::GB18030.encode(xml);
    http_ok(&bytes)
}
