//! Test fixtures - proto sources and a stand-in compiler

use std::path::{Path, PathBuf};

pub fn message_proto() -> &'static str {
    r#"syntax = "proto3";

package demo;

message Point {
  int32 x = 1;
  int32 y = 2;
}
"#
}

/// Imports `x.proto` from a sibling directory
pub fn importing_proto() -> &'static str {
    r#"syntax = "proto3";

package demo;

import "x.proto";

message Line {
  Point from = 1;
  Point to = 2;
}
"#
}

pub fn service_proto() -> &'static str {
    r#"syntax = "proto3";

package demo;

service Greeter {
  rpc SayHello (HelloRequest) returns (HelloReply);
}

message HelloRequest { string name = 1; }
message HelloReply { string message = 1; }
"#
}

/// Content the fake compiler rejects
pub fn broken_proto() -> &'static str {
    "syntax = \"proto3\";\nmessage {\n"
}

/// Marker the fake compiler looks for to fail a file
pub const BROKEN_MARKER: &str = "message {";

/// Write an executable shell script that behaves like `protoc` for tests:
///
/// - appends its full argument line to `<dir>/invocations.log`
/// - prints `generated <input>` on stdout
/// - writes `<input stem>.cs` next to the input, unless the input contains
///   [`BROKEN_MARKER`], in which case it prints an error on stderr
///   (and still exits 0, so only stderr signals the failure)
#[cfg(unix)]
pub fn fake_protoc(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("invocations.log");
    let script = format!(
        r#"#!/bin/sh
echo "$@" >> "{log}"
input="$1"
if grep -q '{marker}' "$input"; then
  echo "$input:2:9: Expected message name." >&2
  exit 0
fi
echo "generated $input"
touch "${{input%.proto}}.cs"
"#,
        log = log.display(),
        marker = BROKEN_MARKER,
    );

    let path = dir.join("protoc");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Lines recorded by [`fake_protoc`], one per invocation
pub fn recorded_invocations(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("invocations.log"))
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
