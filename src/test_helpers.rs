//! Test helpers for exercising HTTP clients against a local socket
//!
//! `StubServer` accepts exactly one connection, records the raw request head
//! and answers with a canned response (or never answers, for timeouts).

#![cfg(test)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;

/// One-shot HTTP server bound to an ephemeral localhost port
pub struct StubServer {
    base_url: String,
    handle: JoinHandle<String>,
}

impl StubServer {
    /// Serve one response with the given status line and JSON body
    pub fn respond(status: &str, body: &str) -> Self {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        Self::spawn(move |mut stream| {
            let request = read_request_head(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        })
    }

    /// Accept one connection, read the request and hold it open without answering
    pub fn stall(hold: Duration) -> Self {
        Self::spawn(move |mut stream| {
            let request = read_request_head(&mut stream);
            std::thread::sleep(hold);
            request
        })
    }

    fn spawn<F>(serve: F) -> Self
    where
        F: FnOnce(TcpStream) -> String + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream)
        });

        Self { base_url, handle }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Wait for the connection to finish and return the request head, lowercased
    pub fn request(self) -> String {
        self.handle.join().unwrap().to_lowercase()
    }
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];

    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }

    String::from_utf8_lossy(&head).into_owned()
}
