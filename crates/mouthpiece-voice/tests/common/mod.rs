#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable shell script into `dir` and returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A stand-in for ffmpeg: answers `-version`, otherwise copies `-i <src>` to the last argument.
pub fn fake_ffmpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "ffmpeg",
        r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 6.0-fake"; exit 0; fi
if [ "$1" != "-y" ] || [ "$2" != "-i" ]; then echo "unexpected arguments: $*" >&2; exit 2; fi
cp "$3" "$4""#,
    )
}

pub const CUES_JSON: &str = r#"{"metadata":{"soundFile":"x.wav","duration":0.6},"mouthCues":[{"start":0.0,"end":0.2,"value":"X"},{"start":0.2,"end":0.45,"value":"B"},{"start":0.45,"end":0.6,"value":"X"}]}"#;

/// A stand-in for rhubarb that writes `json` to the `-o` path.
pub fn fake_rhubarb(dir: &Path, json: &str) -> PathBuf {
    let payload = dir.join("rhubarb-output.json");
    std::fs::write(&payload, json).unwrap();
    write_script(
        dir,
        "rhubarb",
        &format!(
            r#"if [ "$1" != "-f" ] || [ "$2" != "json" ] || [ "$3" != "-o" ]; then echo "unexpected arguments: $*" >&2; exit 2; fi
if [ ! -f "$5" ]; then echo "missing input $5" >&2; exit 1; fi
cp "{}" "$4""#,
            payload.display()
        ),
    )
}
