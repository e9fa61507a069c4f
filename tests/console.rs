use std::fs;
use std::net::SocketAddr;

use sandbox_explorer::config::StartupConfig;
use sandbox_explorer::{RootContext, Server};
use tempfile::{TempDir, tempdir};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

struct Console {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Console {
    async fn connect(addr: SocketAddr) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut console = Console {
            reader: BufReader::new(read_half),
            writer,
        };
        let greeting = console.line().await;
        (console, greeting)
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    async fn send(&mut self, command: &str) -> String {
        self.writer
            .write_all(format!("{command}\r\n").as_bytes())
            .await
            .unwrap();
        self.line().await
    }
}

async fn start_server(max_clients: usize) -> (TempDir, SocketAddr) {
    let dir = tempdir().unwrap();
    let config = StartupConfig {
        bind_address: "127.0.0.1".into(),
        control_port: 0,
        max_command_length: 1024,
        max_clients,
        max_upload_size_mb: 1,
    };
    let root = RootContext::new(dir.path()).unwrap();
    let server = Server::new(config, root).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    (dir, addr)
}

#[tokio::test]
async fn browse_upload_and_download() {
    let (dir, addr) = start_server(4).await;
    let (mut console, greeting) = Console::connect(addr).await;
    assert!(greeting.starts_with("220"));

    let body = b"--B123\r\n\
                 Content-Disposition: form-data; name=\"path\"\r\n\r\n\
                 inbox\r\n\
                 --B123\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\n\
                 hello\r\n\
                 --B123--\r\n";
    let ready = console
        .send(&format!(
            "UPLD {} multipart/form-data; boundary=B123",
            body.len()
        ))
        .await;
    assert_eq!(ready, format!("150 Ready for {} bytes", body.len()));
    console.writer.write_all(body).await.unwrap();
    assert_eq!(console.line().await, "200 Stored 1 file(s) in inbox");
    assert_eq!(fs::read(dir.path().join("inbox/a.txt")).unwrap(), b"hello");

    assert_eq!(console.send("LIST inbox").await, "150 Listing inbox (1 entries)");
    assert!(console.line().await.starts_with("a.txt|5|"));
    assert_eq!(console.line().await, "226 Listing complete");

    assert_eq!(console.send("RETR inbox/a.txt").await, "150 5 bytes");
    let mut payload = [0u8; 5];
    console.reader.read_exact(&mut payload).await.unwrap();
    assert_eq!(&payload, b"hello");
    assert_eq!(console.line().await, "226 Transfer complete");

    assert!(console.send("RETR ../../etc/passwd").await.starts_with("403"));
    assert_eq!(console.send("QUIT").await, "221 Goodbye");
}

#[tokio::test]
async fn relocate_and_delete_over_the_console() {
    let (dir, addr) = start_server(4).await;
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/a.txt"), b"a").unwrap();
    fs::write(dir.path().join("docs/b.txt"), b"b").unwrap();

    let (mut console, _) = Console::connect(addr).await;
    assert!(console.send("CWD docs").await.starts_with("200"));

    assert!(console.send("FROM a.txt").await.starts_with("200"));
    assert!(console.send("RNTO b.txt").await.starts_with("409"));
    assert!(dir.path().join("docs/a.txt").exists());

    assert!(console.send("FROM a.txt").await.starts_with("200"));
    assert_eq!(console.send("MVTO b.txt").await, "200 Moved docs/a.txt to docs/b (1).txt");

    assert!(console.send("DELE .").await.starts_with("400"));
    assert_eq!(console.send("DELE b.txt").await, "200 Deleted docs/b.txt");
    assert!(!dir.path().join("docs/b.txt").exists());
}

#[tokio::test]
async fn root_can_be_replaced_at_runtime() {
    let (dir, addr) = start_server(4).await;
    let other = dir.path().join("other");
    fs::create_dir(&other).unwrap();
    fs::write(other.join("inside.txt"), b"x").unwrap();

    let (mut console, _) = Console::connect(addr).await;
    let set = console.send(&format!("ROOT {}", other.display())).await;
    assert!(set.starts_with("200 Root set to"));

    assert_eq!(
        console.send("ROOT").await,
        format!("200 {}", other.display())
    );
    assert_eq!(console.send("LIST").await, "150 Listing . (1 entries)");
}

#[tokio::test]
async fn connection_limit_is_enforced() {
    let (_dir, addr) = start_server(1).await;
    let (mut first, greeting) = Console::connect(addr).await;
    assert!(greeting.starts_with("220"));

    let (_second, refused) = Console::connect(addr).await;
    assert!(refused.starts_with("421"));

    assert!(first.send("PWD").await.starts_with("200"));
}

#[tokio::test]
async fn overlong_line_is_refused_and_slot_freed_on_disconnect() {
    let (_dir, addr) = start_server(1).await;
    let (mut first, _) = Console::connect(addr).await;

    let long = format!("LIST {}", "x".repeat(2048));
    assert!(first.send(&long).await.starts_with("500"));
    assert!(first.send("PWD").await.starts_with("200"));
    drop(first);

    // The session ends once the peer is gone and its slot is released.
    let mut greeting = String::new();
    for _ in 0..50 {
        let (_next, line) = Console::connect(addr).await;
        greeting = line;
        if greeting.starts_with("220") {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(greeting.starts_with("220"));
}
