#![allow(dead_code)]

// Stand-ins for the AREDN node web server and the rrdtool program

use arednmon::config::Settings;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const RRDTOOL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
if [ "$1" = "lastupdate" ]; then
    printf ' S N SNR RX_MCS TX_MCS RX_RATE TX_RATE\n\n1578694621: -48 -95 47 15 15 130 130\n'
fi
"#;

// Same, but every chart takes a second to draw
const SLOW_RRDTOOL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
if [ "$1" = "graph" ]; then
    sleep 1
fi
"#;

/// A shell script logging its arguments, one call per line.
pub fn fake_rrdtool(dir: &Path) -> PathBuf {
    install(dir, RRDTOOL)
}

pub fn slow_rrdtool(dir: &Path) -> PathBuf {
    install(dir, SLOW_RRDTOOL)
}

fn install(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("rrdtool");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn rrdtool_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

pub fn settings(dir: &Path, rrdtool: &Path) -> Settings {
    let settings = Settings::new(
        dir.join("public_html"),
        dir.join("database"),
        rrdtool.to_string_lossy().into_owned(),
    );
    fs::create_dir_all(settings.dynamic_dir("arednsig")).unwrap();
    fs::create_dir_all(settings.dynamic_dir("power")).unwrap();
    fs::create_dir_all(&settings.database_dir).unwrap();
    settings
}

/// Serves one canned response per connection, in order, and
/// returns the URL to fetch.
pub async fn serve(responses: Vec<(u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/cgi-bin/page", listener.local_addr().unwrap());
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
    });
    url
}
