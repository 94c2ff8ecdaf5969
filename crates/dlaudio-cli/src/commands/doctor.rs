use anyhow::Result;
use std::path::Path;
use std::process::{Command, ExitCode};

use dlaudio_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = Config::load(config_path)?;

    println!("dlaudio dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:        ");
    match config.yt_dlp_path() {
        Ok(path) => match Command::new(&path).arg("--version").output() {
            Ok(out) => {
                let v = String::from_utf8_lossy(&out.stdout);
                println!("OK ({}, {})", v.trim(), path.display());
            }
            Err(_) => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(e) => {
            println!("NOT FOUND");
            println!("           {}", e);
            all_ok = false;
        }
    }

    // Check FFmpeg
    print!("ffmpeg:        ");
    match config.ffmpeg_path() {
        Ok(path) => match Command::new(&path).arg("-version").output() {
            Ok(out) => {
                let first_line = String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string();
                // "ffmpeg version N ..." -> N
                let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({}, {})", version_part, path.display());
            }
            Err(_) => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(e) => {
            println!("NOT FOUND");
            println!("           {}", e);
            all_ok = false;
        }
    }

    // Linked in, reported for completeness
    println!("mp4ameta:      OK (built in)");

    println!();
    if all_ok {
        println!("All dependencies OK!");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
        Ok(ExitCode::FAILURE)
    }
}
