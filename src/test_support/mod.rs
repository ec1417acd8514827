//! Test fixtures for srcbundle unit tests.
//!
//! Helpers for building bundle trees, archives and throwaway git
//! repositories on disk.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::util::config::Config;
use crate::util::context::GlobalContext;

/// Write `(relative path, contents)` pairs under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }
}

/// Write a zip archive holding `files`.
pub fn write_zip(archive: &Path, files: &[(&str, &str)]) {
    let file = File::create(archive).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    for (path, contents) in files {
        zip.start_file(*path, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a gzip-compressed tarball holding `files`.
pub fn write_tar_gz(archive: &Path, files: &[(&str, &str)]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let file = File::create(archive).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// A context rooted at `root` with default configuration.
pub fn test_context(root: &Path) -> GlobalContext {
    GlobalContext::from_config(root.to_path_buf(), &Config::default())
}

/// Whether a `git` executable is on PATH.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=srcbundle",
            "-c",
            "user.email=srcbundle@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=master",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
        .status;
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// Create a git repository at `dir` with one commit per `(tag, files)` step.
///
/// Returns a `file://` URL for the repository.
pub fn git_repo(dir: &Path, steps: &[(&str, &[(&str, &str)])]) -> String {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);

    for (tag, files) in steps {
        write_tree(dir, files);
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "-m", tag]);
        git(dir, &["tag", tag]);
    }

    let url = url::Url::from_directory_path(dir).unwrap();
    url.as_str().trim_end_matches('/').to_string()
}

/// Every file path under `root`, relative and sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Serve `body` with `status` to a single HTTP request on localhost.
///
/// Returns the URL of `file_name` on that server.
pub fn serve_once(body: Vec<u8>, status: u16, file_name: &str) -> String {
    serve(body, status, Duration::ZERO, file_name)
}

/// Like [`serve_once`] with a 200 status, stalling for `pause` halfway
/// through the body.
pub fn serve_stalled(body: Vec<u8>, pause: Duration, file_name: &str) -> String {
    serve(body, 200, pause, file_name)
}

fn serve(body: Vec<u8>, status: u16, pause: Duration, file_name: &str) -> String {
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
            if line == "\r\n" || line == "\n" {
                break;
            }
            line.clear();
        }

        let mut stream = reader.into_inner();
        let head = format!(
            "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        let (first, rest) = body.split_at(body.len() / 2);
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(first);
        let _ = stream.flush();
        std::thread::sleep(pause);
        let _ = stream.write_all(rest);
        let _ = stream.flush();
    });

    format!("http://127.0.0.1:{}/{}", port, file_name)
}
