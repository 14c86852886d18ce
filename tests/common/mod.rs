#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use lesion_terminal::api::ApiClient;
use lesion_terminal::config::Config;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Answers one connection per canned response, in order, and records each raw request.
pub struct CannedServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl CannedServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let addr = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept connection");
                requests.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    if status < 400 { "OK" } else { "Error" },
                    body.len()
                );
                stream.write_all(reply.as_bytes()).expect("write response");
                stream.flush().expect("flush response");
            }
            requests
        });
        Self { addr, handle }
    }

    pub fn api(&self) -> ApiClient {
        let config = Config {
            api_url: format!("http://{}/api", self.addr),
            ..Config::default()
        };
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .expect("test client");
        ApiClient::with_client(client, config)
    }

    pub fn requests(self) -> Vec<String> {
        self.handle.join().expect("server thread")
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match content_length {
            Some(len) if buf.len() >= end + 4 + len => break,
            Some(_) => {}
            None if head.contains("transfer-encoding: chunked") => {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn success(extra: &str) -> (u16, String) {
    if extra.is_empty() {
        (200, r#"{"result": "success", "reason": ""}"#.to_string())
    } else {
        (200, format!(r#"{{"result": "success", {extra}}}"#))
    }
}

pub fn fail(reason: &str) -> (u16, String) {
    (200, format!(r#"{{"result": "fail", "reason": "{reason}"}}"#))
}

/// A small PNG that is neither square nor 320px.
pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}
