// Shared helpers for integration tests: a tiny local HTTP server and script builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone)]
pub struct Route {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub status: u16,
    pub send_length: bool,
    /// Send this many bytes, pause, then send the rest.
    pub stall_after: Option<(usize, Duration)>,
}

impl Route {
    pub fn bytes(body: Vec<u8>) -> Self {
        Self {
            body,
            content_type: "application/octet-stream",
            status: 200,
            send_length: true,
            stall_after: None,
        }
    }

    pub fn png(body: Vec<u8>) -> Self {
        Self {
            content_type: "image/png",
            ..Self::bytes(body)
        }
    }

    pub fn without_length(mut self) -> Self {
        self.send_length = false;
        self
    }

    pub fn stalled(mut self, after: usize, pause: Duration) -> Self {
        self.stall_after = Some((after, pause));
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

pub struct TestServer {
    port: u16,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let port = listener.local_addr().expect("read local addr failed").port();
        let routes: Arc<HashMap<String, Route>> =
            Arc::new(routes.into_iter().map(|(path, route)| (path.to_string(), route)).collect());
        let hits = Arc::new(Mutex::new(HashMap::new()));

        let server_hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&server_hits);
                thread::spawn(move || serve(stream, &routes, &hits));
            }
        });

        Self { port, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().expect("hits lock").get(path).copied().unwrap_or(0)
    }
}

fn serve(mut stream: TcpStream, routes: &HashMap<String, Route>, hits: &Mutex<HashMap<String, usize>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    *hits.lock().expect("hits lock").entry(path.clone()).or_insert(0) += 1;

    let Some(route) = routes.get(&path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };

    let mut headers = format!(
        "HTTP/1.1 {} OK\r\nContent-Type: {}\r\nConnection: close\r\n",
        route.status, route.content_type
    );
    if route.send_length {
        headers.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    headers.push_str("\r\n");
    if stream.write_all(headers.as_bytes()).is_err() {
        return;
    }

    match route.stall_after {
        Some((after, pause)) => {
            let split = after.min(route.body.len());
            let _ = stream.write_all(&route.body[..split]);
            let _ = stream.flush();
            thread::sleep(pause);
            let _ = stream.write_all(&route.body[split..]);
        }
        None => {
            let _ = stream.write_all(&route.body);
        }
    }
    let _ = stream.flush();
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgba = vec![200u8; (width * height * 4) as usize];
    clipdesk::image_handler::encode_rgba_as_png(width, height, rgba)
        .expect("encode png")
        .bytes
}

/// Writes an executable extractor stand-in that mimics `7z x <archive> -o<dir>`:
/// it logs its arguments and creates `<dir>/<marker>`.
#[cfg(unix)]
pub fn write_fake_extractor(dir: &Path, marker: &str) -> PathBuf {
    let script = format!(
        "#!/bin/sh\n\
         echo \"$@\" >> \"$(dirname \"$0\")/calls.log\"\n\
         out=\"\"\n\
         for a in \"$@\"; do case \"$a\" in -o*) out=\"${{a#-o}}\";; esac; done\n\
         mkdir -p \"$(dirname \"$out/{marker}\")\" && touch \"$out/{marker}\"\n",
        marker = marker
    );
    write_script(dir, "fake7z", &script)
}

/// Extractor stand-in that always fails with the given stderr message.
#[cfg(unix)]
pub fn write_failing_extractor(dir: &Path, message: &str) -> PathBuf {
    let script = format!("#!/bin/sh\necho \"{}\" >&2\nexit 2\n", message);
    write_script(dir, "broken7z", &script)
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let tools = dir.join("tools");
    std::fs::create_dir_all(&tools).expect("create tools dir");
    let path = tools.join(name);
    std::fs::write(&path, body).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}
