use std::fs;
use std::io::Read;
use std::net::TcpListener;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn client(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_client"))
        .args(args)
        .output()
        .unwrap()
}

fn server(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_server"))
        .args(args)
        .output()
        .unwrap()
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn_server(root: &std::path::Path, port: u16) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_server"))
        .args(["-p", &port.to_string(), root.to_str().unwrap()])
        .env("SPARROW_BIND", "127.0.0.1")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while std::net::TcpStream::connect(("127.0.0.1", port)).is_err() {
        assert!(Instant::now() < deadline, "server did not start");
        thread::sleep(Duration::from_millis(20));
    }
    child
}

#[test]
fn test_client_usage_errors_exit_1() {
    assert_eq!(client(&[]).status.code(), Some(1));
    assert_eq!(client(&["localhost/index.html"]).status.code(), Some(1));
    assert_eq!(client(&["http://localhost/", "-p"]).status.code(), Some(1));
    assert_eq!(client(&["-o"]).status.code(), Some(1));
    assert_eq!(client(&["-p", "abc", "http://localhost/"]).status.code(), Some(1));
    assert_eq!(
        client(&["-o", "a", "-o", "b", "http://localhost/"]).status.code(),
        Some(1)
    );
    assert_eq!(
        client(&["-d", "a", "-d", "b", "http://localhost/"]).status.code(),
        Some(1)
    );
}

#[test]
fn test_client_conflicting_outputs_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path().join("a");
    let o = d.join("b.html");

    let out = client(&["-d", d.to_str().unwrap(), "-o", o.to_str().unwrap(), "http://localhost/"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!d.exists());
}

#[test]
fn test_help_exits_0() {
    assert_eq!(client(&["--help"]).status.code(), Some(0));
    assert_eq!(server(&["--help"]).status.code(), Some(0));
}

#[test]
fn test_server_usage_errors_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    assert_eq!(server(&[]).status.code(), Some(1));
    assert_eq!(server(&["-p", "http", root]).status.code(), Some(1));
    assert_eq!(server(&["-p", "8080", "-p", "8081", root]).status.code(), Some(1));
    assert_eq!(server(&["-x", root]).status.code(), Some(1));

    let missing = dir.path().join("missing");
    assert_eq!(server(&[missing.to_str().unwrap()]).status.code(), Some(1));
}

#[cfg(unix)]
#[test]
fn test_end_to_end_and_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("www");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("index.html"), b"<h1>end to end</h1>").unwrap();

    let port = free_port();
    let mut child = spawn_server(&root, port);

    // Still running after half a second
    thread::sleep(Duration::from_millis(500));
    assert!(child.try_wait().unwrap().is_none());

    let url = format!("http://localhost:{}/", port);
    let out_file = dir.path().join("out").join("page.html");
    let out = client(&["-o", out_file.to_str().unwrap(), &url]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(fs::read(&out_file).unwrap(), b"<h1>end to end</h1>");

    let out = client(&["-p", &port.to_string(), "http://127.0.0.1:1/"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"<h1>end to end</h1>");

    let url = format!("http://127.0.0.1:{}/nothing-here", port);
    let out = client(&[&url]);
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("404 Not Found"));

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let started = Instant::now();
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        assert!(started.elapsed() < Duration::from_millis(500), "server ignored SIGTERM");
        thread::sleep(Duration::from_millis(10));
    };
    assert_eq!(exit.code(), Some(0));

    let mut log = String::new();
    child.stderr.take().unwrap().read_to_string(&mut log).unwrap();
    assert!(log.contains("request served"));
    let stopped = log
        .lines()
        .find(|line| line.contains("server stopped"))
        .expect("no shutdown summary logged");
    for counter in ["accepted", "active", "served"] {
        assert!(stopped.contains(counter), "missing {} in {:?}", counter, stopped);
    }
}

#[test]
fn test_client_transport_error_exit_4() {
    let port = free_port();
    let url = format!("http://127.0.0.1:{}/", port);
    assert_eq!(client(&[&url]).status.code(), Some(4));
}
