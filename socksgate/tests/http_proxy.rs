/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use socksgate::auth::CredentialStore;
use socksgate::escape::ProxyRegistry;
use socksgate::serve::HttpProxyServer;

static CONFIG_SEQ: AtomicUsize = AtomicUsize::new(0);

struct Gateway {
    addr: SocketAddr,
    _quit: watch::Sender<bool>,
}

async fn start_gateway(proxy_port: Option<u16>) -> Gateway {
    let nodes = match proxy_port {
        Some(port) => format!("nodes:\n    - socks5://pu:pp@127.0.0.1:{port}"),
        None => "nodes: []".to_string(),
    };
    let content = format!(
        "server:\n  listen: 127.0.0.1:0\n  task_log: false\n\
         proxy:\n  connect_timeout: 2s\n  negotiation_timeout: 2s\n  {nodes}\n\
         user:\n  - a:b\n"
    );
    let path = std::env::temp_dir().join(format!(
        "socksgate-test-{}-{}.yaml",
        std::process::id(),
        CONFIG_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, content).unwrap();
    let config = socksgate::config::load_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let server = Arc::new(HttpProxyServer::new(
        config.server,
        CredentialStore::new(&config.user),
        ProxyRegistry::new(&config.proxy),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (quit_sender, quit_receiver) = watch::channel(false);
    tokio::spawn(server.run(listener, quit_receiver));
    Gateway {
        addr,
        _quit: quit_sender,
    }
}

/// Run the socks5 handshake on the proxy side, and return the requested target.
async fn accept_socks5(stream: &mut TcpStream, connect_reply: u8) -> Vec<u8> {
    let mut greeting = [0u8; 3];
    stream.read_exact(&mut greeting).await.unwrap();
    assert_eq!(greeting, [0x05, 0x01, 0x02]);
    stream.write_all(&[0x05, 0x02]).await.unwrap();

    let mut auth = [0u8; 7];
    stream.read_exact(&mut auth).await.unwrap();
    assert_eq!(&auth, b"\x01\x02pu\x02pp");
    stream.write_all(&[0x01, 0x00]).await.unwrap();

    let mut head = [0u8; 5];
    stream.read_exact(&mut head).await.unwrap();
    assert_eq!(&head[..4], &[0x05, 0x01, 0x00, 0x03]);
    let mut target = vec![0u8; head[4] as usize + 2];
    stream.read_exact(&mut target).await.unwrap();

    if connect_reply == 0x00 {
        stream
            .write_all(&[0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x04, 0x38])
            .await
            .unwrap();
    } else {
        // failure replies stop after the status byte
        stream.write_all(&[0x05, connect_reply]).await.unwrap();
    }
    target
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut b = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        let n = stream.read(&mut b).await.unwrap();
        assert_eq!(n, 1, "closed before the end of head");
        buf.push(b[0]);
    }
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn connect_relay() {
    let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_port = proxy.local_addr().unwrap().port();
    let gateway = start_gateway(Some(proxy_port)).await;

    let proxy_task = tokio::spawn(async move {
        let (mut stream, _) = proxy.accept().await.unwrap();
        let target = accept_socks5(&mut stream, 0x00).await;
        assert_eq!(target, b"example.com\x01\xbb");
        // echo
        let mut buf = [0u8; 64];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            stream.write_all(&buf[..n]).await.unwrap();
        }
    });

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(
            b"CONNECT example.com:443 HTTP/1.1\r\n\
              Host: example.com:443\r\n\
              Proxy-Authorization: Basic YTpi\r\n\r\nearly",
        )
        .await
        .unwrap();
    let head = read_head(&mut client).await;
    assert_eq!(head, "HTTP/1.1 200 Connection established\r\n\r\n");

    let mut buf = [0u8; 5];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"early");

    client.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");

    client.shutdown().await.unwrap();
    let mut left = Vec::new();
    client.read_to_end(&mut left).await.unwrap();
    assert!(left.is_empty());
    proxy_task.await.unwrap();
}

#[tokio::test]
async fn wrong_password_never_reaches_proxy() {
    let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_port = proxy.local_addr().unwrap().port();
    let gateway = start_gateway(Some(proxy_port)).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    // a:wrong
    client
        .write_all(
            b"CONNECT example.com:443 HTTP/1.1\r\n\
              Proxy-Authorization: Basic YTp3cm9uZw==\r\n\r\n",
        )
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    let rsp = String::from_utf8(rsp).unwrap();
    assert!(rsp.starts_with("HTTP/1.1 407 Proxy Authentication Required\r\n"));
    assert!(rsp.contains("Proxy-Authenticate: Basic realm=\"socksgate\"\r\n"));

    let r = tokio::time::timeout(Duration::from_millis(200), proxy.accept()).await;
    assert!(r.is_err());
}

#[tokio::test]
async fn missing_credentials() {
    let gateway = start_gateway(None).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(b"GET http://example.com/ HTTP/1.0\r\n\r\n")
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    assert!(rsp.starts_with(b"HTTP/1.0 407 "));
}

#[tokio::test]
async fn forward_get() {
    let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_port = proxy.local_addr().unwrap().port();
    let gateway = start_gateway(Some(proxy_port)).await;

    let proxy_task = tokio::spawn(async move {
        let (mut stream, _) = proxy.accept().await.unwrap();
        let target = accept_socks5(&mut stream, 0x00).await;
        assert_eq!(target, b"example.com\x00\x50");

        let head = read_head(&mut stream).await;
        assert!(head.starts_with("POST /submit?k=v HTTP/1.1\r\n"));
        assert!(head.contains("Connection: Close\r\n"));
        assert!(!head.to_lowercase().contains("proxy-authorization"));
        let mut body = [0u8; 5];
        stream.read_exact(&mut body).await.unwrap();
        assert_eq!(&body, b"hello");

        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
            .await
            .unwrap();
    });

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(
            b"POST http://example.com/submit?k=v HTTP/1.1\r\n\
              Host: example.com\r\n\
              Proxy-Authorization: Basic YTpi\r\n\
              Proxy-Connection: Keep-Alive\r\n\
              Content-Length: 5\r\n\r\nhello",
        )
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    assert_eq!(rsp, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
    proxy_task.await.unwrap();
}

#[tokio::test]
async fn proxy_connect_failed() {
    let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_port = proxy.local_addr().unwrap().port();
    let gateway = start_gateway(Some(proxy_port)).await;

    let proxy_task = tokio::spawn(async move {
        let (mut stream, _) = proxy.accept().await.unwrap();
        accept_socks5(&mut stream, 0x05).await;
        let mut left = Vec::new();
        let _ = stream.read_to_end(&mut left).await;
    });

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(
            b"CONNECT example.com:443 HTTP/1.1\r\n\
              Proxy-Authorization: Basic YTpi\r\n\r\n",
        )
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    let rsp = String::from_utf8(rsp).unwrap();
    assert!(rsp.starts_with("HTTP/1.1 502 Bad Gateway\r\n"));
    let reason = "upstream not negotiated: connect failed: Connection refused (code 5)\n";
    assert!(rsp.ends_with(reason));
    proxy_task.await.unwrap();
}

#[tokio::test]
async fn no_proxy_configured() {
    let gateway = start_gateway(None).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(
            b"CONNECT example.com:443 HTTP/1.1\r\n\
              Proxy-Authorization: Basic YTpi\r\n\r\n",
        )
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    assert!(rsp.starts_with(b"HTTP/1.1 500 Internal Server Error\r\n"));
}

#[tokio::test]
async fn unsupported_scheme() {
    let gateway = start_gateway(None).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    client
        .write_all(
            b"GET ftp://example.com/file HTTP/1.1\r\n\
              Proxy-Authorization: Basic YTpi\r\n\r\n",
        )
        .await
        .unwrap();
    let mut rsp = Vec::new();
    client.read_to_end(&mut rsp).await.unwrap();
    assert!(rsp.starts_with(b"HTTP/1.1 501 Not Implemented\r\n"));
}

#[tokio::test]
async fn concurrent_tunnels_independent() {
    let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_port = proxy.local_addr().unwrap().port();
    let gateway = start_gateway(Some(proxy_port)).await;

    let proxy_task = tokio::spawn(async move {
        let mut echo_tasks = Vec::new();
        for _ in 0..2 {
            let (mut stream, _) = proxy.accept().await.unwrap();
            echo_tasks.push(tokio::spawn(async move {
                accept_socks5(&mut stream, 0x00).await;
                let (mut r, mut w) = stream.split();
                tokio::io::copy(&mut r, &mut w).await.unwrap();
            }));
        }
        for task in echo_tasks {
            task.await.unwrap();
        }
    });

    let mut clients = Vec::new();
    for host in ["one.example", "two.example"] {
        let mut client = TcpStream::connect(gateway.addr).await.unwrap();
        let req = format!(
            "CONNECT {host}:443 HTTP/1.1\r\nProxy-Authorization: Basic YTpi\r\n\r\n"
        );
        client.write_all(req.as_bytes()).await.unwrap();
        let head = read_head(&mut client).await;
        assert!(head.starts_with("HTTP/1.1 200 "));
        clients.push((host, client));
    }

    // interleave the traffic of both tunnels
    for round in 0..3 {
        for (host, client) in clients.iter_mut() {
            let msg = format!("{host}-{round};");
            client.write_all(msg.as_bytes()).await.unwrap();
        }
        for (host, client) in clients.iter_mut() {
            let expected = format!("{host}-{round};");
            let mut buf = vec![0u8; expected.len()];
            client.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, expected.as_bytes());
        }
    }

    for (_, mut client) in clients {
        client.shutdown().await.unwrap();
        let mut left = Vec::new();
        client.read_to_end(&mut left).await.unwrap();
        assert!(left.is_empty());
    }
    proxy_task.await.unwrap();
}
